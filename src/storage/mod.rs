use std::sync::Arc;

use chrono::{DateTime, Utc};

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

use crate::errors::Result;

pub mod sea_orm_storage;

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 用户管理方法
    // 创建用户，邮箱已存在时返回 Conflict
    async fn create_user(&self, user: CreateUserRequest) -> Result<User>;
    // 通过ID获取用户信息
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;
    // 通过邮箱获取用户信息（不区分大小写）
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    // 更新用户最后登录时间
    async fn update_last_login(&self, id: i64) -> Result<bool>;
    // 统计全部用户数量
    async fn count_users(&self) -> Result<u64>;
    // 分页列出学生，附带选课数
    async fn list_students_with_pagination(
        &self,
        query: StudentListQuery,
    ) -> Result<StudentListResponse>;
    // 统计学生数量
    async fn count_students(&self) -> Result<u64>;
    // 最近注册的学生
    async fn list_recent_students(&self, limit: u64) -> Result<Vec<RecentStudent>>;

    /// 作业管理方法
    // 创建作业
    async fn create_assignment(&self, created_by: i64, assignment: NewAssignment)
    -> Result<Assignment>;
    // 通过ID获取作业
    async fn get_assignment_by_id(&self, id: i64) -> Result<Option<Assignment>>;
    // 作业详情，含创建者与全部选课记录
    async fn get_assignment_detail(&self, id: i64) -> Result<Option<AssignmentDetail>>;
    // 作业及其选课状态，供选课/提交规则使用
    async fn get_assignment_state(&self, id: i64) -> Result<Option<AssignmentState>>;
    // 分页列出作业
    async fn list_assignments_with_pagination(
        &self,
        query: AssignmentListQuery,
    ) -> Result<AssignmentListResponse>;
    // 更新作业
    async fn update_assignment(
        &self,
        id: i64,
        changes: AssignmentChanges,
    ) -> Result<Option<Assignment>>;
    // 删除作业及其选课记录
    async fn delete_assignment(&self, id: i64) -> Result<bool>;
    // 统计作业数量，可按状态过滤
    async fn count_assignments(&self, status: Option<AssignmentStatus>) -> Result<u64>;

    /// 选课方法
    // 学生视角的作业列表
    async fn list_assignments_for_student(
        &self,
        student_id: i64,
        filter: StudentAssignmentFilter,
    ) -> Result<Vec<StudentAssignmentView>>;
    // 学生视角的单个作业
    async fn get_assignment_for_student(
        &self,
        assignment_id: i64,
        student_id: i64,
    ) -> Result<Option<StudentAssignmentView>>;
    // 插入选课记录，重复时返回 AlreadyEnrolled
    async fn insert_enrollment(
        &self,
        assignment_id: i64,
        record: &EnrollmentRecord,
    ) -> Result<EnrollmentRecord>;
    // 仅当记录仍为 not_submitted 时标记为已提交，返回是否有记录被更新
    async fn mark_enrollment_submitted(
        &self,
        assignment_id: i64,
        student_id: i64,
        submitted_at: DateTime<Utc>,
    ) -> Result<bool>;
    // 跨作业列出全部选课记录
    async fn list_enrollments(&self) -> Result<Vec<EnrollmentListItem>>;
    // 统计选课记录数量
    async fn count_enrollments(&self) -> Result<u64>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
