use super::{SeaOrmStorage, is_unique_violation};
use crate::entity::enrollments::{Column as EnrollmentColumn, Entity as Enrollments};
use crate::entity::users::{ActiveModel, Column, Entity as Users};
use crate::errors::{EduTaskError, Result};
use crate::models::{
    PaginationInfo,
    dashboard::responses::RecentStudent,
    users::{
        entities::{User, UserRole, UserStatus},
        requests::{CreateUserRequest, StudentListQuery},
        responses::{StudentListItem, StudentListResponse},
    },
};
use crate::utils::contains_pattern;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, sea_query::Expr,
};
use std::collections::HashMap;

impl SeaOrmStorage {
    /// 创建用户
    pub async fn create_user_impl(&self, req: CreateUserRequest) -> Result<User> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            name: Set(req.name),
            email: Set(req.email.trim().to_lowercase()),
            phone: Set(req.phone),
            password_hash: Set(req.password),
            role: Set(req.role.to_string()),
            status: Set(UserStatus::Active.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model.insert(&self.db).await.map_err(|e| {
            if is_unique_violation(&e) {
                EduTaskError::conflict("User already exists")
            } else {
                EduTaskError::database_operation(format!("创建用户失败: {e}"))
            }
        })?;

        Ok(result.into_user())
    }

    /// 通过 ID 获取用户
    pub async fn get_user_by_id_impl(&self, id: i64) -> Result<Option<User>> {
        let result = Users::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| EduTaskError::database_operation(format!("查询用户失败: {e}")))?;

        Ok(result.map(|m| m.into_user()))
    }

    /// 通过邮箱获取用户
    pub async fn get_user_by_email_impl(&self, email: &str) -> Result<Option<User>> {
        let result = Users::find()
            .filter(Column::Email.eq(email.trim().to_lowercase()))
            .one(&self.db)
            .await
            .map_err(|e| EduTaskError::database_operation(format!("查询用户失败: {e}")))?;

        Ok(result.map(|m| m.into_user()))
    }

    /// 更新用户最后登录时间
    pub async fn update_last_login_impl(&self, id: i64) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();

        let result = Users::update_many()
            .col_expr(Column::LastLogin, Expr::value(now))
            .filter(Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(|e| EduTaskError::database_operation(format!("更新最后登录时间失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 统计用户数量
    pub async fn count_users_impl(&self) -> Result<u64> {
        Users::find()
            .count(&self.db)
            .await
            .map_err(|e| EduTaskError::database_operation(format!("统计用户数量失败: {e}")))
    }

    /// 统计学生数量
    pub async fn count_students_impl(&self) -> Result<u64> {
        Users::find()
            .filter(Column::Role.eq(UserRole::STUDENT))
            .count(&self.db)
            .await
            .map_err(|e| EduTaskError::database_operation(format!("统计学生数量失败: {e}")))
    }

    /// 分页列出学生，附带每人的选课数
    pub async fn list_students_with_pagination_impl(
        &self,
        query: StudentListQuery,
    ) -> Result<StudentListResponse> {
        let (page, size) = query.pagination.normalized();

        let mut select = Users::find().filter(Column::Role.eq(UserRole::STUDENT));

        // 按姓名或邮箱搜索，邮箱入库时已转为小写
        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let search = search.trim();
            select = select.filter(
                Condition::any()
                    .add(Column::Name.like(contains_pattern(search)))
                    .add(Column::Email.like(contains_pattern(&search.to_lowercase()))),
            );
        }

        let paginator = select
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .paginate(&self.db, size);

        let total = paginator
            .num_items()
            .await
            .map_err(|e| EduTaskError::database_operation(format!("查询学生总数失败: {e}")))?;

        let students = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| EduTaskError::database_operation(format!("查询学生列表失败: {e}")))?;

        let ids: Vec<i64> = students.iter().map(|m| m.id).collect();
        let counts = self.count_enrollments_by_student(&ids).await?;

        let items = students
            .into_iter()
            .map(|m| {
                let enrollment_count = counts.get(&m.id).copied().unwrap_or(0);
                let user = m.into_user();
                StudentListItem {
                    id: user.id,
                    name: user.name,
                    email: user.email,
                    phone: user.phone,
                    status: user.status,
                    created_at: user.created_at,
                    enrollment_count,
                }
            })
            .collect();

        Ok(StudentListResponse {
            items,
            pagination: PaginationInfo::new(page, size, total),
        })
    }

    /// 最近注册的学生
    pub async fn list_recent_students_impl(&self, limit: u64) -> Result<Vec<RecentStudent>> {
        let students = Users::find()
            .filter(Column::Role.eq(UserRole::STUDENT))
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(|e| EduTaskError::database_operation(format!("查询最近学生失败: {e}")))?;

        Ok(students
            .into_iter()
            .map(|m| {
                let user = m.into_user();
                RecentStudent {
                    id: user.id,
                    name: user.name,
                    email: user.email,
                    created_at: user.created_at,
                }
            })
            .collect())
    }

    /// 按学生统计选课数
    async fn count_enrollments_by_student(&self, student_ids: &[i64]) -> Result<HashMap<i64, i64>> {
        if student_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(i64, i64)> = Enrollments::find()
            .select_only()
            .column(EnrollmentColumn::StudentId)
            .column_as(EnrollmentColumn::Id.count(), "count")
            .filter(EnrollmentColumn::StudentId.is_in(student_ids.to_vec()))
            .group_by(EnrollmentColumn::StudentId)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| EduTaskError::database_operation(format!("统计选课数失败: {e}")))?;

        Ok(rows.into_iter().collect())
    }

    /// 按 ID 批量获取用户
    pub(super) async fn get_users_by_ids(&self, ids: Vec<i64>) -> Result<HashMap<i64, User>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let users = Users::find()
            .filter(Column::Id.is_in(ids))
            .all(&self.db)
            .await
            .map_err(|e| EduTaskError::database_operation(format!("查询用户失败: {e}")))?;

        Ok(users
            .into_iter()
            .map(|m| (m.id, m.into_user()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{assignment, at, user};
    use super::*;
    use crate::models::PaginationQuery;
    use crate::storage::Storage;

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let storage = SeaOrmStorage::in_memory().await.unwrap();
        user(&storage, "Alice", UserRole::Student).await;

        let err = storage
            .create_user(CreateUserRequest {
                name: "Other Alice".to_string(),
                email: "ALICE@example.com".to_string(),
                phone: None,
                password: "hash".to_string(),
                role: UserRole::Student,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, EduTaskError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_email_lookup_is_case_insensitive() {
        let storage = SeaOrmStorage::in_memory().await.unwrap();
        let alice = user(&storage, "Alice", UserRole::Student).await;

        let found = storage
            .get_user_by_email("  Alice@Example.COM ")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, alice.id);
        assert_eq!(found.role, UserRole::Student);
        assert!(storage.get_user_by_email("bob@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_students_with_search_and_counts() {
        let storage = SeaOrmStorage::in_memory().await.unwrap();
        let admin = user(&storage, "Admin", UserRole::Admin).await;
        let alice = user(&storage, "Alice", UserRole::Student).await;
        user(&storage, "Bob", UserRole::Student).await;

        let a = assignment(&storage, admin.id, "Essay", "History", at(2099, 1, 1)).await;
        storage
            .insert_enrollment(
                a.id,
                &crate::models::assignments::entities::EnrollmentRecord::new(
                    alice.id,
                    at(2025, 1, 1),
                ),
            )
            .await
            .unwrap();

        let all = storage
            .list_students_with_pagination(StudentListQuery::default())
            .await
            .unwrap();
        assert_eq!(all.pagination.total, 2);
        assert!(all.items.iter().all(|s| s.id != admin.id));

        let found = storage
            .list_students_with_pagination(StudentListQuery {
                pagination: PaginationQuery::default(),
                search: Some("ALI".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(found.items.len(), 1);
        assert_eq!(found.items[0].id, alice.id);
        assert_eq!(found.items[0].enrollment_count, 1);

        assert_eq!(storage.count_students().await.unwrap(), 2);
        assert_eq!(storage.count_users().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_recent_students_are_limited() {
        let storage = SeaOrmStorage::in_memory().await.unwrap();
        for name in ["S1", "S2", "S3"] {
            user(&storage, name, UserRole::Student).await;
        }

        let recent = storage.list_recent_students(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].name, "S3");
    }

    #[tokio::test]
    async fn test_update_last_login() {
        let storage = SeaOrmStorage::in_memory().await.unwrap();
        let alice = user(&storage, "Alice", UserRole::Student).await;

        assert!(storage.update_last_login(alice.id).await.unwrap());
        let reloaded = storage.get_user_by_id(alice.id).await.unwrap().unwrap();
        assert!(reloaded.last_login.is_some());
        assert!(!storage.update_last_login(9999).await.unwrap());
    }
}
