//! 数据模型定义
//!
//! 业务实体、请求与响应结构，以及选课规则。

pub mod assignments;
pub mod auth;
pub mod common;
pub mod dashboard;
pub mod users;

pub use common::{ApiResponse, FieldErrors, PaginatedResponse, PaginationInfo, PaginationQuery};

/// 响应中的业务错误码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // 通用错误
    BadRequest = 1000,
    Unauthorized = 1001,
    Forbidden = 1003,
    NotFound = 1004,
    ValidationFailed = 1005,
    Conflict = 1009,
    RateLimitExceeded = 1029,
    InternalServerError = 5000,

    // 认证与用户
    AuthFailed = 2000,
    RegisterFailed = 2001,
    UserEmailAlreadyExists = 2003,

    // 作业
    AssignmentNotFound = 3000,

    // 选课与提交
    AlreadyEnrolled = 3100,
    PastDue = 3101,
    NotEnrolled = 3102,
    AlreadySubmitted = 3103,
}
