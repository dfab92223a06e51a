//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。

mod assignments;
mod enrollments;
mod users;

use crate::config::AppConfig;
use crate::errors::{EduTaskError, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

impl SeaOrmStorage {
    /// 创建新的 SeaORM 存储实例
    pub async fn new_async() -> Result<Self> {
        let config = AppConfig::get();
        let db_url = Self::build_database_url(&config.database.url)?;

        // 根据数据库类型选择连接方式
        let db = if db_url.starts_with("sqlite://") {
            Self::connect_sqlite(&db_url, config).await?
        } else {
            Self::connect_generic(&db_url, config).await?
        };

        // 运行迁移
        Migrator::up(&db, None)
            .await
            .map_err(|e| EduTaskError::database_operation(format!("数据库迁移失败: {e}")))?;

        info!("SeaORM 存储初始化完成，数据库: {}", db_url);

        Ok(Self { db })
    }

    /// 测试用的内存数据库，只保留一个连接以共享同一个库
    #[cfg(test)]
    pub async fn in_memory() -> Result<Self> {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);

        let db = Database::connect(opt)
            .await
            .map_err(|e| EduTaskError::database_connection(format!("无法连接到数据库: {e}")))?;

        Migrator::up(&db, None)
            .await
            .map_err(|e| EduTaskError::database_operation(format!("数据库迁移失败: {e}")))?;

        Ok(Self { db })
    }

    /// SQLite 专用连接（WAL + pragma 优化）
    async fn connect_sqlite(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| EduTaskError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .pragma("cache_size", "-64000")
            .pragma("temp_store", "memory")
            .pragma("mmap_size", "536870912")
            .pragma("wal_autocheckpoint", "1000")
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.database.pool_size)
            .min_connections(1)
            .test_before_acquire(true)
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(300))
            .connect_with(opt)
            .await
            .map_err(|e| EduTaskError::database_connection(format!("SQLite 连接失败: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(config.database.pool_size)
            .min_connections(5)
            .connect_timeout(Duration::from_secs(config.database.timeout))
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false)
            .sqlx_logging_level(tracing::log::LevelFilter::Debug);

        Database::connect(opt)
            .await
            .map_err(|e| EduTaskError::database_connection(format!("无法连接到数据库: {e}")))
    }

    /// 从 URL 自动推断数据库类型并构建连接 URL
    fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite://") {
            Ok(url.to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") || url == ":memory:" {
            Ok(format!("sqlite://{}?mode=rwc", url))
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(EduTaskError::database_config(format!(
                "无法从 URL 推断数据库类型: {url}. 支持: sqlite://, postgres://, mysql://, 或 .db/.sqlite 文件路径"
            )))
        }
    }
}

/// 数据库错误是否为唯一约束冲突
pub(crate) fn is_unique_violation(err: &sea_orm::DbErr) -> bool {
    matches!(
        err.sql_err(),
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
    )
}

// Storage trait 实现
use crate::models::{
    assignments::{
        entities::{Assignment, AssignmentStatus, EnrollmentRecord},
        requests::{AssignmentChanges, AssignmentListQuery, NewAssignment, StudentAssignmentFilter},
        responses::{AssignmentDetail, AssignmentListResponse, EnrollmentListItem},
        rules::{AssignmentState, StudentAssignmentView},
    },
    dashboard::responses::RecentStudent,
    users::{
        entities::User,
        requests::{CreateUserRequest, StudentListQuery},
        responses::StudentListResponse,
    },
};
use crate::storage::Storage;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
impl Storage for SeaOrmStorage {
    // 用户模块
    async fn create_user(&self, user: CreateUserRequest) -> Result<User> {
        self.create_user_impl(user).await
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        self.get_user_by_id_impl(id).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.get_user_by_email_impl(email).await
    }

    async fn update_last_login(&self, id: i64) -> Result<bool> {
        self.update_last_login_impl(id).await
    }

    async fn count_users(&self) -> Result<u64> {
        self.count_users_impl().await
    }

    async fn list_students_with_pagination(
        &self,
        query: StudentListQuery,
    ) -> Result<StudentListResponse> {
        self.list_students_with_pagination_impl(query).await
    }

    async fn count_students(&self) -> Result<u64> {
        self.count_students_impl().await
    }

    async fn list_recent_students(&self, limit: u64) -> Result<Vec<RecentStudent>> {
        self.list_recent_students_impl(limit).await
    }

    // 作业模块
    async fn create_assignment(
        &self,
        created_by: i64,
        assignment: NewAssignment,
    ) -> Result<Assignment> {
        self.create_assignment_impl(created_by, assignment).await
    }

    async fn get_assignment_by_id(&self, id: i64) -> Result<Option<Assignment>> {
        self.get_assignment_by_id_impl(id).await
    }

    async fn get_assignment_detail(&self, id: i64) -> Result<Option<AssignmentDetail>> {
        self.get_assignment_detail_impl(id).await
    }

    async fn get_assignment_state(&self, id: i64) -> Result<Option<AssignmentState>> {
        self.get_assignment_state_impl(id).await
    }

    async fn list_assignments_with_pagination(
        &self,
        query: AssignmentListQuery,
    ) -> Result<AssignmentListResponse> {
        self.list_assignments_with_pagination_impl(query).await
    }

    async fn update_assignment(
        &self,
        id: i64,
        changes: AssignmentChanges,
    ) -> Result<Option<Assignment>> {
        self.update_assignment_impl(id, changes).await
    }

    async fn delete_assignment(&self, id: i64) -> Result<bool> {
        self.delete_assignment_impl(id).await
    }

    async fn count_assignments(&self, status: Option<AssignmentStatus>) -> Result<u64> {
        self.count_assignments_impl(status).await
    }

    // 选课模块
    async fn list_assignments_for_student(
        &self,
        student_id: i64,
        filter: StudentAssignmentFilter,
    ) -> Result<Vec<StudentAssignmentView>> {
        self.list_assignments_for_student_impl(student_id, filter)
            .await
    }

    async fn get_assignment_for_student(
        &self,
        assignment_id: i64,
        student_id: i64,
    ) -> Result<Option<StudentAssignmentView>> {
        self.get_assignment_for_student_impl(assignment_id, student_id)
            .await
    }

    async fn insert_enrollment(
        &self,
        assignment_id: i64,
        record: &EnrollmentRecord,
    ) -> Result<EnrollmentRecord> {
        self.insert_enrollment_impl(assignment_id, record).await
    }

    async fn mark_enrollment_submitted(
        &self,
        assignment_id: i64,
        student_id: i64,
        submitted_at: DateTime<Utc>,
    ) -> Result<bool> {
        self.mark_enrollment_submitted_impl(assignment_id, student_id, submitted_at)
            .await
    }

    async fn list_enrollments(&self) -> Result<Vec<EnrollmentListItem>> {
        self.list_enrollments_impl().await
    }

    async fn count_enrollments(&self) -> Result<u64> {
        self.count_enrollments_impl().await
    }
}

/// 测试数据构造
#[cfg(test)]
pub(crate) mod fixtures {
    use super::SeaOrmStorage;
    use crate::models::assignments::{entities::Assignment, requests::NewAssignment};
    use crate::models::users::{
        entities::{User, UserRole},
        requests::CreateUserRequest,
    };
    use crate::storage::Storage;
    use chrono::{DateTime, TimeZone, Utc};

    pub fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    pub async fn user(storage: &SeaOrmStorage, name: &str, role: UserRole) -> User {
        storage
            .create_user(CreateUserRequest {
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
                phone: None,
                password: "hash".to_string(),
                role,
            })
            .await
            .unwrap()
    }

    pub async fn assignment(
        storage: &SeaOrmStorage,
        created_by: i64,
        title: &str,
        subject: &str,
        due_date: DateTime<Utc>,
    ) -> Assignment {
        storage
            .create_assignment(
                created_by,
                NewAssignment {
                    title: title.to_string(),
                    description: "Complete the exercises".to_string(),
                    subject: subject.to_string(),
                    due_date,
                },
            )
            .await
            .unwrap()
    }
}
