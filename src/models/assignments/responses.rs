use chrono::{DateTime, Utc};
use serde::Serialize;
use ts_rs::TS;

use super::entities::{Assignment, EnrollmentRecord, SubmissionStatus};
use crate::models::common::PaginationInfo;

/// 作业创建者信息
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "assignment.ts")]
pub struct AssignmentCreator {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// 管理端作业列表项
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "assignment.ts")]
pub struct AssignmentListItem {
    #[serde(flatten)]
    #[ts(flatten)]
    pub assignment: Assignment,
    pub creator: Option<AssignmentCreator>,
    pub enrollment_count: i64,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "assignment.ts")]
pub struct AssignmentListResponse {
    pub items: Vec<AssignmentListItem>,
    pub pagination: PaginationInfo,
}

/// 管理端作业详情（含全部选课记录）
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "assignment.ts")]
pub struct AssignmentDetail {
    #[serde(flatten)]
    #[ts(flatten)]
    pub assignment: Assignment,
    pub creator: Option<AssignmentCreator>,
    pub enrollments: Vec<EnrollmentRecord>,
}

/// 学生可选作业列表项
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "assignment.ts")]
pub struct AvailableAssignmentItem {
    #[serde(flatten)]
    #[ts(flatten)]
    pub assignment: Assignment,
    pub is_expired: bool,
}

/// 学生已选作业列表项：作业字段与本人的选课字段合并
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "assignment.ts")]
pub struct MyAssignmentItem {
    #[serde(flatten)]
    #[ts(flatten)]
    pub assignment: Assignment,
    pub enrolled_at: DateTime<Utc>,
    pub submission_status: SubmissionStatus,
    pub submitted_at: Option<DateTime<Utc>>,
}

/// 学生视角的作业详情
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "assignment.ts")]
pub struct StudentAssignmentDetail {
    #[serde(flatten)]
    #[ts(flatten)]
    pub assignment: Assignment,
    pub is_enrolled: bool,
    pub enrollment: Option<EnrollmentRecord>,
}

/// 管理端选课记录（跨作业展开）
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "assignment.ts")]
pub struct EnrollmentListItem {
    pub assignment_id: i64,
    pub assignment_title: String,
    pub subject: String,
    pub due_date: DateTime<Utc>,
    pub student_id: i64,
    pub student_name: String,
    pub student_email: String,
    pub enrolled_at: DateTime<Utc>,
    pub submission_status: SubmissionStatus,
    pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "assignment.ts")]
pub struct EnrollmentListResponse {
    pub items: Vec<EnrollmentListItem>,
}

/// 选课因截止时间被拒绝时返回的附加信息
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "assignment.ts")]
pub struct PastDueInfo {
    pub is_past_due: bool,
}
