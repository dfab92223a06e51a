use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use super::{AssignmentService, require_admin};
use crate::errors::Result;
use crate::models::ApiResponse;
use crate::models::assignments::{
    entities::Assignment,
    requests::{CreateAssignmentRequest, NewAssignment},
};
use crate::models::users::entities::Caller;
use crate::services::{current_caller, error_response, validation_response};
use crate::storage::Storage;

/// 创建作业，创建者为调用方，初始状态 pending
pub async fn create_assignment(
    storage: &dyn Storage,
    caller: &Caller,
    input: NewAssignment,
) -> Result<Assignment> {
    require_admin(caller)?;
    let assignment = storage.create_assignment(caller.user_id, input).await?;
    info!(
        "Assignment {} created by admin {}",
        assignment.id, caller.user_id
    );
    Ok(assignment)
}

pub async fn handle_create_assignment(
    service: &AssignmentService,
    request: &HttpRequest,
    body: CreateAssignmentRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let caller = current_caller(request)?;

    let input = match body.validate() {
        Ok(input) => input,
        Err(errors) => return Ok(validation_response(errors)),
    };

    match create_assignment(storage.as_ref(), &caller, input).await {
        Ok(assignment) => Ok(HttpResponse::Created().json(ApiResponse::success(
            assignment,
            "Assignment created successfully",
        ))),
        Err(e) => {
            if e.is_store_failure() {
                error!("Failed to create assignment: {}", e);
            }
            Ok(error_response(&e))
        }
    }
}
