use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use super::{AssignmentService, assignment_not_found, require_admin};
use crate::errors::Result;
use crate::models::ApiResponse;
use crate::models::users::entities::Caller;
use crate::services::{current_caller, error_response};
use crate::storage::Storage;

/// 删除作业及其全部选课记录
pub async fn delete_assignment(
    storage: &dyn Storage,
    caller: &Caller,
    assignment_id: i64,
) -> Result<()> {
    require_admin(caller)?;
    if !storage.delete_assignment(assignment_id).await? {
        return Err(assignment_not_found());
    }
    info!(
        "Assignment {} deleted by admin {}",
        assignment_id, caller.user_id
    );
    Ok(())
}

pub async fn handle_delete_assignment(
    service: &AssignmentService,
    request: &HttpRequest,
    assignment_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let caller = current_caller(request)?;

    match delete_assignment(storage.as_ref(), &caller, assignment_id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::success_empty(
            "Assignment deleted successfully",
        ))),
        Err(e) => {
            if e.is_store_failure() {
                error!("Failed to delete assignment {}: {}", assignment_id, e);
            }
            Ok(error_response(&e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;
    use crate::storage::sea_orm_storage::{SeaOrmStorage, fixtures};

    #[tokio::test]
    async fn test_delete_removes_assignment_and_enrollments() {
        let storage = SeaOrmStorage::in_memory().await.unwrap();
        let admin = fixtures::user(&storage, "Admin", UserRole::Admin).await;
        let student = fixtures::user(&storage, "Alice", UserRole::Student).await;
        let assignment =
            fixtures::assignment(&storage, admin.id, "Essay", "English", fixtures::at(2099, 1, 1))
                .await;
        let mut state = storage
            .get_assignment_state(assignment.id)
            .await
            .unwrap()
            .unwrap();
        let record = state.enroll(student.id, fixtures::at(2025, 1, 1)).unwrap();
        storage.insert_enrollment(assignment.id, &record).await.unwrap();

        delete_assignment(&storage, &admin.caller(), assignment.id)
            .await
            .unwrap();

        assert!(storage.get_assignment_by_id(assignment.id).await.unwrap().is_none());
        assert_eq!(storage.count_enrollments().await.unwrap(), 0);

        let err = delete_assignment(&storage, &admin.caller(), assignment.id)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E007");
    }
}
