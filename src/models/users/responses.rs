use super::entities::UserStatus;
use crate::models::common::PaginationInfo;
use serde::Serialize;
use ts_rs::TS;

// 学生列表项
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "user.ts")]
pub struct StudentListItem {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub status: UserStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub enrollment_count: i64,
}

// 学生列表响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "user.ts")]
pub struct StudentListResponse {
    pub items: Vec<StudentListItem>,
    pub pagination: PaginationInfo,
}
