use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::error;

use super::{AssignmentService, require_admin};
use crate::errors::Result;
use crate::models::ApiResponse;
use crate::models::assignments::{
    requests::{AssignmentListParams, AssignmentListQuery},
    responses::AssignmentListResponse,
};
use crate::models::users::entities::Caller;
use crate::services::{current_caller, error_response};
use crate::storage::Storage;

/// 分页列出作业，最新创建的在前
pub async fn list_assignments(
    storage: &dyn Storage,
    caller: &Caller,
    query: AssignmentListQuery,
) -> Result<AssignmentListResponse> {
    require_admin(caller)?;
    storage.list_assignments_with_pagination(query).await
}

pub async fn handle_list_assignments(
    service: &AssignmentService,
    request: &HttpRequest,
    query: AssignmentListParams,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let caller = current_caller(request)?;

    match list_assignments(storage.as_ref(), &caller, query.into()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "Assignment list retrieved successfully",
        ))),
        Err(e) => {
            if e.is_store_failure() {
                error!("Failed to list assignments: {}", e);
            }
            Ok(error_response(&e))
        }
    }
}
