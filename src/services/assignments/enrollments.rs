use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::error;

use super::{AssignmentService, require_admin};
use crate::errors::Result;
use crate::models::ApiResponse;
use crate::models::assignments::responses::EnrollmentListResponse;
use crate::models::users::entities::Caller;
use crate::services::{current_caller, error_response};
use crate::storage::Storage;

/// 跨作业展开的选课记录，最新作业在前
pub async fn list_enrollments(
    storage: &dyn Storage,
    caller: &Caller,
) -> Result<EnrollmentListResponse> {
    require_admin(caller)?;
    let items = storage.list_enrollments().await?;
    Ok(EnrollmentListResponse { items })
}

pub async fn handle_list_enrollments(
    service: &AssignmentService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let caller = current_caller(request)?;

    match list_enrollments(storage.as_ref(), &caller).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "Enrollments retrieved successfully",
        ))),
        Err(e) => {
            if e.is_store_failure() {
                error!("Failed to list enrollments: {}", e);
            }
            Ok(error_response(&e))
        }
    }
}
