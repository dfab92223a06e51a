//! 管理端作业服务
//!
//! 每个操作分两层：`handle_*` 负责从请求中取出存储与调用方并构造响应，
//! 核心函数只依赖 `&dyn Storage` 与显式传入的 [`Caller`]。

pub mod create;
pub mod delete;
pub mod detail;
pub mod enrollments;
pub mod list;
pub mod update;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::errors::{EduTaskError, Result};
use crate::models::assignments::requests::{
    AssignmentListParams, CreateAssignmentRequest, UpdateAssignmentRequest,
};
use crate::models::users::entities::{Caller, UserRole};
use crate::storage::Storage;

pub const MSG_ASSIGNMENT_NOT_FOUND: &str = "Assignment not found";

pub struct AssignmentService {
    storage: Option<Arc<dyn Storage>>,
}

impl AssignmentService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::storage_from_request(request),
        }
    }

    pub async fn list_assignments(
        &self,
        request: &HttpRequest,
        query: AssignmentListParams,
    ) -> ActixResult<HttpResponse> {
        list::handle_list_assignments(self, request, query).await
    }

    pub async fn create_assignment(
        &self,
        request: &HttpRequest,
        body: CreateAssignmentRequest,
    ) -> ActixResult<HttpResponse> {
        create::handle_create_assignment(self, request, body).await
    }

    pub async fn get_assignment(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
    ) -> ActixResult<HttpResponse> {
        detail::handle_get_assignment(self, request, assignment_id).await
    }

    pub async fn update_assignment(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
        body: UpdateAssignmentRequest,
    ) -> ActixResult<HttpResponse> {
        update::handle_update_assignment(self, request, assignment_id, body).await
    }

    pub async fn delete_assignment(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
    ) -> ActixResult<HttpResponse> {
        delete::handle_delete_assignment(self, request, assignment_id).await
    }

    pub async fn list_enrollments(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        enrollments::handle_list_enrollments(self, request).await
    }
}

pub(crate) fn require_admin(caller: &Caller) -> Result<()> {
    caller.require(UserRole::Admin)
}

pub(crate) fn assignment_not_found() -> EduTaskError {
    EduTaskError::not_found(MSG_ASSIGNMENT_NOT_FOUND)
}
