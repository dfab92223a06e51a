use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use super::{AssignmentService, assignment_not_found, require_admin};
use crate::errors::Result;
use crate::models::ApiResponse;
use crate::models::assignments::{
    entities::Assignment,
    requests::{AssignmentChanges, UpdateAssignmentRequest},
};
use crate::models::users::entities::Caller;
use crate::services::{current_caller, error_response, validation_response};
use crate::storage::Storage;

/// 部分更新作业，截止时间不可修改
pub async fn update_assignment(
    storage: &dyn Storage,
    caller: &Caller,
    assignment_id: i64,
    changes: AssignmentChanges,
) -> Result<Assignment> {
    require_admin(caller)?;
    let assignment = storage
        .update_assignment(assignment_id, changes)
        .await?
        .ok_or_else(assignment_not_found)?;
    info!(
        "Assignment {} updated by admin {}",
        assignment.id, caller.user_id
    );
    Ok(assignment)
}

pub async fn handle_update_assignment(
    service: &AssignmentService,
    request: &HttpRequest,
    assignment_id: i64,
    body: UpdateAssignmentRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let caller = current_caller(request)?;

    let changes = match body.validate() {
        Ok(changes) => changes,
        Err(errors) => return Ok(validation_response(errors)),
    };

    match update_assignment(storage.as_ref(), &caller, assignment_id, changes).await {
        Ok(assignment) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            assignment,
            "Assignment updated successfully",
        ))),
        Err(e) => {
            if e.is_store_failure() {
                error!("Failed to update assignment {}: {}", assignment_id, e);
            }
            Ok(error_response(&e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::assignments::entities::AssignmentStatus;
    use crate::models::users::entities::UserRole;
    use crate::storage::sea_orm_storage::{SeaOrmStorage, fixtures};

    #[tokio::test]
    async fn test_update_changes_only_given_fields() {
        let storage = SeaOrmStorage::in_memory().await.unwrap();
        let admin = fixtures::user(&storage, "Admin", UserRole::Admin).await;
        let assignment =
            fixtures::assignment(&storage, admin.id, "Essay", "English", fixtures::at(2099, 1, 1))
                .await;

        let changes = AssignmentChanges {
            status: Some(AssignmentStatus::Completed),
            ..Default::default()
        };
        let updated = update_assignment(&storage, &admin.caller(), assignment.id, changes)
            .await
            .unwrap();

        assert_eq!(updated.status, AssignmentStatus::Completed);
        assert_eq!(updated.title, "Essay");
        assert_eq!(updated.due_date, assignment.due_date);
    }

    #[tokio::test]
    async fn test_update_missing_assignment_is_not_found() {
        let storage = SeaOrmStorage::in_memory().await.unwrap();
        let admin = fixtures::user(&storage, "Admin", UserRole::Admin).await;
        let err = update_assignment(&storage, &admin.caller(), 99, AssignmentChanges::default())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E007");
    }
}
