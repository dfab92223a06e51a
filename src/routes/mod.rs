pub mod admin;

pub mod auth;

pub mod student;

pub use admin::configure_admin_routes;
pub use auth::configure_auth_routes;
pub use student::configure_student_routes;

use actix_web::{HttpResponse, web};

use crate::models::{ApiResponse, ErrorCode};

// 未匹配的路由
pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::error_empty(
        ErrorCode::NotFound,
        "Resource not found",
    ))
}

/// 注册全部路由
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(configure_auth_routes)
        .configure(configure_admin_routes)
        .configure(configure_student_routes);
}
