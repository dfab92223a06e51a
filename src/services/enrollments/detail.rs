use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::error;

use super::{EnrollmentService, require_student};
use crate::errors::Result;
use crate::models::ApiResponse;
use crate::models::assignments::responses::StudentAssignmentDetail;
use crate::models::users::entities::Caller;
use crate::services::assignments::assignment_not_found;
use crate::services::{current_caller, error_response};
use crate::storage::Storage;

/// 学生视角的作业详情，附带 `is_enrolled` 和本人的选课记录
pub async fn get_assignment(
    storage: &dyn Storage,
    caller: &Caller,
    assignment_id: i64,
) -> Result<StudentAssignmentDetail> {
    require_student(caller)?;
    let view = storage
        .get_assignment_for_student(assignment_id, caller.user_id)
        .await?
        .ok_or_else(assignment_not_found)?;
    Ok(view.into_detail())
}

pub async fn handle_get_assignment(
    service: &EnrollmentService,
    request: &HttpRequest,
    assignment_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let caller = current_caller(request)?;

    match get_assignment(storage.as_ref(), &caller, assignment_id).await {
        Ok(detail) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            detail,
            "Assignment retrieved successfully",
        ))),
        Err(e) => {
            if e.is_store_failure() {
                error!("Failed to load assignment {}: {}", assignment_id, e);
            }
            Ok(error_response(&e))
        }
    }
}
