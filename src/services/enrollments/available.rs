use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::{DateTime, Utc};
use tracing::error;

use super::{EnrollmentService, require_student};
use crate::errors::Result;
use crate::models::ApiResponse;
use crate::models::assignments::{
    requests::{AvailableAssignmentsParams, StudentAssignmentFilter},
    responses::AvailableAssignmentItem,
    rules::compute_available_assignments,
};
use crate::models::users::entities::Caller;
use crate::services::{current_caller, error_response, service_now};
use crate::storage::Storage;

/// 调用方尚未选的作业，默认不含已过期的作业
pub async fn list_available(
    storage: &dyn Storage,
    caller: &Caller,
    params: AvailableAssignmentsParams,
    now: DateTime<Utc>,
) -> Result<Vec<AvailableAssignmentItem>> {
    require_student(caller)?;
    let filter = StudentAssignmentFilter {
        subject: params.subject,
        status: params.status,
    };
    let views = storage
        .list_assignments_for_student(caller.user_id, filter)
        .await?;
    Ok(compute_available_assignments(
        views,
        now,
        params.include_expired,
    ))
}

pub async fn handle_list_available(
    service: &EnrollmentService,
    request: &HttpRequest,
    query: AvailableAssignmentsParams,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let caller = current_caller(request)?;

    match list_available(storage.as_ref(), &caller, query, service_now()).await {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            items,
            "Available assignments retrieved successfully",
        ))),
        Err(e) => {
            if e.is_store_failure() {
                error!(
                    "Failed to list available assignments for student {}: {}",
                    caller.user_id, e
                );
            }
            Ok(error_response(&e))
        }
    }
}
