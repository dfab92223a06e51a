use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::error;

use super::DashboardService;
use crate::errors::Result;
use crate::models::ApiResponse;
use crate::models::assignments::{requests::StudentAssignmentFilter, rules::compute_student_stats};
use crate::models::dashboard::responses::StudentDashboardStats;
use crate::models::users::entities::{Caller, UserRole};
use crate::services::{current_caller, error_response};
use crate::storage::Storage;

pub async fn student_stats(
    storage: &dyn Storage,
    caller: &Caller,
) -> Result<StudentDashboardStats> {
    caller.require(UserRole::Student)?;
    let views = storage
        .list_assignments_for_student(caller.user_id, StudentAssignmentFilter::default())
        .await?;
    Ok(compute_student_stats(&views))
}

pub async fn handle_student_stats(
    service: &DashboardService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let caller = current_caller(request)?;

    match student_stats(storage.as_ref(), &caller).await {
        Ok(stats) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            stats,
            "Dashboard statistics retrieved successfully",
        ))),
        Err(e) => {
            if e.is_store_failure() {
                error!(
                    "Failed to compute dashboard for student {}: {}",
                    caller.user_id, e
                );
            }
            Ok(error_response(&e))
        }
    }
}
