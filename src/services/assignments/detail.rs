use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::error;

use super::{AssignmentService, assignment_not_found, require_admin};
use crate::errors::Result;
use crate::models::ApiResponse;
use crate::models::assignments::responses::AssignmentDetail;
use crate::models::users::entities::Caller;
use crate::services::{current_caller, error_response};
use crate::storage::Storage;

/// 作业详情，含创建者和全部选课记录
pub async fn get_assignment(
    storage: &dyn Storage,
    caller: &Caller,
    assignment_id: i64,
) -> Result<AssignmentDetail> {
    require_admin(caller)?;
    storage
        .get_assignment_detail(assignment_id)
        .await?
        .ok_or_else(assignment_not_found)
}

pub async fn handle_get_assignment(
    service: &AssignmentService,
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
