use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::error;

use super::{EnrollmentService, require_student};
use crate::errors::Result;
use crate::models::ApiResponse;
use crate::models::assignments::{
    requests::{MyAssignmentsParams, StudentAssignmentFilter},
    responses::MyAssignmentItem,
    rules::compute_my_assignments,
};
use crate::models::users::entities::Caller;
use crate::services::{current_caller, error_response};
use crate::storage::Storage;

/// 调用方已选的作业，可按提交状态过滤
pub async fn list_my(
    storage: &dyn Storage,
    caller: &Caller,
    params: MyAssignmentsParams,
) -> Result<Vec<MyAssignmentItem>> {
    require_student(caller)?;
    let views = storage
        .list_assignments_for_student(caller.user_id, StudentAssignmentFilter::default())
        .await?;
    Ok(compute_my_assignments(views, params.submission_status))
}

pub async fn handle_list_my(
    service: &EnrollmentService,
    request: &HttpRequest,
    query: MyAssignmentsParams,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let caller = current_caller(request)?;

    match list_my(storage.as_ref(), &caller, query).await {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            items,
            "Enrolled assignments retrieved successfully",
        ))),
        Err(e) => {
            if e.is_store_failure() {
                error!(
                    "Failed to list enrolled assignments for student {}: {}",
                    caller.user_id, e
                );
            }
            Ok(error_response(&e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::assignments::entities::SubmissionStatus;
    use crate::models::users::entities::UserRole;
    use crate::storage::sea_orm_storage::{SeaOrmStorage, fixtures};

    #[tokio::test]
    async fn test_my_assignments_filter_by_submission_status() {
        let storage = SeaOrmStorage::in_memory().await.unwrap();
        let admin = fixtures::user(&storage, "Admin", UserRole::Admin).await;
        let alice = fixtures::user(&storage, "Alice", UserRole::Student).await;
        let now = fixtures::at(2025, 6, 1);

        let essay =
            fixtures::assignment(&storage, admin.id, "Essay", "English", fixtures::at(2099, 1, 1))
                .await;
        let proofs =
            fixtures::assignment(&storage, admin.id, "Proofs", "Math", fixtures::at(2099, 3, 1))
                .await;
        fixtures::assignment(&storage, admin.id, "Map", "Geography", fixtures::at(2099, 4, 1))
            .await;

        for id in [essay.id, proofs.id] {
            let mut state = storage.get_assignment_state(id).await.unwrap().unwrap();
            let record = state.enroll(alice.id, now).unwrap();
            storage.insert_enrollment(id, &record).await.unwrap();
        }
        assert!(
            storage
                .mark_enrollment_submitted(proofs.id, alice.id, now)
                .await
                .unwrap()
        );

        let all = list_my(&storage, &alice.caller(), MyAssignmentsParams::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let submitted = list_my(
            &storage,
            &alice.caller(),
            MyAssignmentsParams {
                submission_status: Some(SubmissionStatus::Submitted),
            },
        )
        .await
        .unwrap();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].assignment.id, proofs.id);
        assert_eq!(submitted[0].submitted_at, Some(now));
    }
}
