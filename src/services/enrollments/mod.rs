//! 学生端作业服务：浏览、选课与提交
//!
//! 选课/提交的规则判断在 [`crate::models::assignments::rules`] 中完成，
//! 这里只负责加载状态、写回存储并记录日志。

pub mod available;
pub mod detail;
pub mod enroll;
pub mod my;
pub mod submit;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::errors::Result;
use crate::models::assignments::requests::{AvailableAssignmentsParams, MyAssignmentsParams};
use crate::models::users::entities::{Caller, UserRole};
use crate::storage::Storage;

pub struct EnrollmentService {
    storage: Option<Arc<dyn Storage>>,
}

impl EnrollmentService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::storage_from_request(request),
        }
    }

    pub async fn list_available(
        &self,
        request: &HttpRequest,
        query: AvailableAssignmentsParams,
    ) -> ActixResult<HttpResponse> {
        available::handle_list_available(self, request, query).await
    }

    pub async fn list_my(
        &self,
        request: &HttpRequest,
        query: MyAssignmentsParams,
    ) -> ActixResult<HttpResponse> {
        my::handle_list_my(self, request, query).await
    }

    pub async fn get_assignment(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
    ) -> ActixResult<HttpResponse> {
        detail::handle_get_assignment(self, request, assignment_id).await
    }

    pub async fn enroll(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
    ) -> ActixResult<HttpResponse> {
        enroll::handle_enroll(self, request, assignment_id).await
    }

    pub async fn submit(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
    ) -> ActixResult<HttpResponse> {
        submit::handle_submit(self, request, assignment_id).await
    }
}

pub(crate) fn require_student(caller: &Caller) -> Result<()> {
    caller.require(UserRole::Student)
}
