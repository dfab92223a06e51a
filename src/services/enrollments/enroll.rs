use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use super::{EnrollmentService, require_student};
use crate::errors::{EduTaskError, Result};
use crate::models::assignments::{entities::EnrollmentRecord, responses::PastDueInfo};
use crate::models::users::entities::Caller;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::assignments::assignment_not_found;
use crate::services::{current_caller, error_response, service_now};
use crate::storage::Storage;

/// 调用方选择作业
///
/// 规则按顺序检查：已选过返回 `AlreadyEnrolled`，`now >= due_date` 返回 `PastDue`。
/// 并发的重复选课由存储层的唯一索引拦截，同样返回 `AlreadyEnrolled`。
pub async fn enroll(
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

    let record = state.enroll(caller.user_id, now).inspect_err(|e| {
        debug!(
            "Enroll rejected for student {} on assignment {}: {}",
            caller.user_id, assignment_id, e
        );
    })?;

    let record = storage
        .insert_enrollment(assignment_id, &record)
        .await
        .inspect_err(|e| {
            if e.is_store_failure() {
                error!(
                    "Failed to store enrollment of student {} on assignment {}: {}",
                    caller.user_id, assignment_id, e
                );
            } else {
                debug!(
                    "Enroll rejected for student {} on assignment {}: {}",
                    caller.user_id, assignment_id, e
                );
            }
        })?;

    info!(
        "Student {} enrolled in assignment {}",
        caller.user_id, assignment_id
    );
    Ok(record)
}

pub async fn handle_enroll(
    service: &EnrollmentService,
    request: &HttpRequest,
    assignment_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let caller = current_caller(request)?;

    match enroll(storage.as_ref(), &caller, assignment_id, service_now()).await {
        Ok(record) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            record,
            "Successfully enrolled in assignment",
        ))),
        Err(EduTaskError::PastDue(message)) => Ok(HttpResponse::BadRequest().json(
            ApiResponse::error(ErrorCode::PastDue, PastDueInfo { is_past_due: true }, message),
        )),
        Err(e) => Ok(error_response(&e)),
    }
}
