//! 路径参数提取器
//!
//! 在进入业务逻辑之前校验路径中的 ID，非法时直接返回 400。

use actix_web::{FromRequest, HttpRequest, HttpResponse, dev::Payload, error::InternalError};
use std::future::{Ready, ready};

use crate::models::{ApiResponse, ErrorCode};

/// 路径 `{id}` 中的作业 ID，必须是正整数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafeAssignmentId(pub i64);

pub const INVALID_ASSIGNMENT_ID: &str = "Invalid assignment ID";

fn parse_positive_id(raw: Option<&str>) -> Option<i64> {
    raw?.parse::<i64>().ok().filter(|id| *id > 0)
}

impl FromRequest for SafeAssignmentId {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = match parse_positive_id(req.match_info().get("id")) {
            Some(id) => Ok(SafeAssignmentId(id)),
            None => {
                let response = HttpResponse::BadRequest().json(ApiResponse::error_empty(
                    ErrorCode::BadRequest,
                    INVALID_ASSIGNMENT_ID,
                ));
                Err(InternalError::from_response(INVALID_ASSIGNMENT_ID, response).into())
            }
        };
        ready(result)
    }
}
