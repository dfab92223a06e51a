pub mod assignments;
pub mod auth;
pub mod dashboard;
pub mod enrollments;
pub mod students;

pub use assignments::AssignmentService;
pub use auth::AuthService;
pub use dashboard::DashboardService;
pub use enrollments::EnrollmentService;
pub use students::StudentService;

use actix_web::{
    HttpRequest, HttpResponse, Result as ActixResult, error::InternalError, http::StatusCode, web,
};
use chrono::{DateTime, SubsecRound, Utc};
use std::sync::Arc;
use tracing::error;

use crate::errors::EduTaskError;
use crate::middlewares::RequireJWT;
use crate::models::users::entities::Caller;
use crate::models::{ApiResponse, ErrorCode, FieldErrors};
use crate::storage::Storage;

/// 从 app data 中取存储实例
pub(crate) fn storage_from_request(request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
    match request.app_data::<web::Data<Arc<dyn Storage>>>() {
        Some(storage) => Ok(storage.get_ref().clone()),
        None => {
            error!("Storage not found in app data");
            let response = HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                "Internal server error",
            ));
            Err(InternalError::from_response("storage not configured", response).into())
        }
    }
}

/// 取当前已认证的调用方，未经过 RequireJWT 时返回 401
pub(crate) fn current_caller(request: &HttpRequest) -> ActixResult<Caller> {
    RequireJWT::extract_caller(request).ok_or_else(|| {
        let response = HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "Unauthorized access, please login",
        ));
        InternalError::from_response("missing caller", response).into()
    })
}

/// 业务使用的当前时间，精度与存储一致（秒）
pub(crate) fn service_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

/// 错误到 HTTP 状态与业务码的映射
///
/// 服务层中的 `NotFound` 只会来自作业查询。
pub(crate) fn status_and_code(err: &EduTaskError) -> (StatusCode, ErrorCode) {
    match err {
        EduTaskError::Validation(_) => (StatusCode::BAD_REQUEST, ErrorCode::ValidationFailed),
        EduTaskError::DateParse(_) | EduTaskError::Serialization(_) => {
            (StatusCode::BAD_REQUEST, ErrorCode::BadRequest)
        }
        EduTaskError::Authentication(_) => (StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized),
        EduTaskError::Authorization(_) => (StatusCode::FORBIDDEN, ErrorCode::Forbidden),
        EduTaskError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::AssignmentNotFound),
        EduTaskError::Conflict(_) => (StatusCode::CONFLICT, ErrorCode::Conflict),
        EduTaskError::AlreadyEnrolled(_) => (StatusCode::CONFLICT, ErrorCode::AlreadyEnrolled),
        EduTaskError::AlreadySubmitted(_) => (StatusCode::CONFLICT, ErrorCode::AlreadySubmitted),
        EduTaskError::PastDue(_) => (StatusCode::BAD_REQUEST, ErrorCode::PastDue),
        EduTaskError::NotEnrolled(_) => (StatusCode::BAD_REQUEST, ErrorCode::NotEnrolled),
        EduTaskError::CacheConnection(_)
        | EduTaskError::DatabaseConfig(_)
        | EduTaskError::DatabaseConnection(_)
        | EduTaskError::DatabaseOperation(_)
        | EduTaskError::FileOperation(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::InternalServerError,
        ),
    }
}

/// 把业务错误转换为统一响应，存储层细节不返回给客户端
pub(crate) fn error_response(err: &EduTaskError) -> HttpResponse {
    let (status, code) = status_and_code(err);
    let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
        "Internal server error"
    } else {
        err.message()
    };
    HttpResponse::build(status).json(ApiResponse::error_empty(code, message))
}

/// 字段校验失败的响应，data 中列出每个字段的错误
pub(crate) fn validation_response(errors: FieldErrors) -> HttpResponse {
    let message = format!("Validation failed: {}", errors.summary());
    HttpResponse::BadRequest().json(ApiResponse::error(
        ErrorCode::ValidationFailed,
        errors,
        message,
    ))
}
