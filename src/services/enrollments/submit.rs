use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use super::{EnrollmentService, require_student};
use crate::errors::{EduTaskError, Result};
use crate::models::ApiResponse;
use crate::models::assignments::{entities::EnrollmentRecord, rules::MSG_ALREADY_SUBMITTED};
use crate::models::users::entities::Caller;
use crate::services::assignments::assignment_not_found;
use crate::services::{current_caller, error_response, service_now};
use crate::storage::Storage;

/// 调用方提交作业
///
/// 未选课返回 `NotEnrolled`，已提交返回 `AlreadySubmitted`。截止时间之后仍可提交。
/// 存储层只在记录仍为 not_submitted 时更新，并发的重复提交会更新 0 行。
pub async fn submit(
    storage: &dyn Storage,
    caller: &Caller,
    assignment_id: i64,
    now: DateTime<Utc>,
) -> Result<EnrollmentRecord> {
    require_student(caller)?;

    let mut state = storage
        .get_assignment_state(assignment_id)
        .await?
        .ok_or_else(assignment_not_found)?;

    let record = state.submit(caller.user_id, now).inspect_err(|e| {
        debug!(
            "Submit rejected for student {} on assignment {}: {}",
            caller.user_id, assignment_id, e
        );
    })?;

    let updated = storage
        .mark_enrollment_submitted(assignment_id, caller.user_id, now)
        .await
        .inspect_err(|e| {
            error!(
                "Failed to store submission of student {} on assignment {}: {}",
                caller.user_id, assignment_id, e
            );
        })?;
    if !updated {
        debug!(
            "Submit lost a race for student {} on assignment {}",
            caller.user_id, assignment_id
        );
        return Err(EduTaskError::already_submitted(MSG_ALREADY_SUBMITTED));
    }

    info!(
        "Student {} submitted assignment {}",
        caller.user_id, assignment_id
    );
    Ok(record)
}

pub async fn handle_submit(
    service: &EnrollmentService,
    request: &HttpRequest,
    assignment_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let caller = current_caller(request)?;

    match submit(storage.as_ref(), &caller, assignment_id, service_now()).await {
        Ok(record) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            record,
            "Assignment submitted successfully",
        ))),
        Err(e) => Ok(error_response(&e)),
    }
}
