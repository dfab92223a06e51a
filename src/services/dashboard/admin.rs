use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::error;

use super::DashboardService;
use crate::errors::Result;
use crate::models::ApiResponse;
use crate::models::assignments::entities::AssignmentStatus;
use crate::models::dashboard::responses::AdminDashboardStats;
use crate::models::users::entities::{Caller, UserRole};
use crate::services::{current_caller, error_response};
use crate::storage::Storage;

/// 最近注册学生的展示数量
pub const RECENT_STUDENTS_LIMIT: u64 = 5;

pub async fn admin_stats(storage: &dyn Storage, caller: &Caller) -> Result<AdminDashboardStats> {
    caller.require(UserRole::Admin)?;

    let total_students = storage.count_students().await?;
    let total_assignments = storage.count_assignments(None).await?;
    let pending_assignments = storage
        .count_assignments(Some(AssignmentStatus::Pending))
        .await?;
    let completed_assignments = storage
        .count_assignments(Some(AssignmentStatus::Completed))
        .await?;
    let total_enrollments = storage.count_enrollments().await?;

    Ok(AdminDashboardStats {
        total_students: total_students as i64,
        total_assignments: total_assignments as i64,
        pending_assignments: pending_assignments as i64,
        completed_assignments: completed_assignments as i64,
        total_enrollments: total_enrollments as i64,
        recent_students: storage.list_recent_students(RECENT_STUDENTS_LIMIT).await?,
    })
}

pub async fn handle_admin_stats(
    service: &DashboardService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let caller = current_caller(request)?;

    match admin_stats(storage.as_ref(), &caller).await {
        Ok(stats) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            stats,
            "Dashboard statistics retrieved successfully",
        ))),
        Err(e) => {
            if e.is_store_failure() {
                error!("Failed to compute admin dashboard: {}", e);
            }
            Ok(error_response(&e))
        }
    }
}
