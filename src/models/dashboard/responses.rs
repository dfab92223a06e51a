use serde::Serialize;
use ts_rs::TS;

/// 最近注册的学生
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "dashboard.ts")]
pub struct RecentStudent {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// 管理端统计
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "dashboard.ts")]
pub struct AdminDashboardStats {
    pub total_students: i64,
    pub total_assignments: i64,
    pub pending_assignments: i64,
    pub completed_assignments: i64,
    pub total_enrollments: i64,
    pub recent_students: Vec<RecentStudent>,
}

/// 学生端统计
#[derive(Debug, Clone, Default, PartialEq, Serialize, TS)]
#[ts(export, export_to = "dashboard.ts")]
pub struct StudentDashboardStats {
    pub total_enrolled: i64,
    pub available_assignments: i64,
    pub not_submitted: i64,
    pub submitted: i64,
}
