pub mod admin;
pub mod student;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::storage::Storage;

pub struct DashboardService {
    storage: Option<Arc<dyn Storage>>,
}

impl DashboardService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::storage_from_request(request),
        }
    }

    // 管理端统计
    pub async fn admin_stats(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        admin::handle_admin_stats(self, request).await
    }

    // 学生端统计
    pub async fn student_stats(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        student::handle_student_stats(self, request).await
    }
}
