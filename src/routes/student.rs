use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares::{RequireJWT, RequireRole};
use crate::models::assignments::requests::{AvailableAssignmentsParams, MyAssignmentsParams};
use crate::models::users::entities::UserRole;
use crate::services::{DashboardService, EnrollmentService};
use crate::utils::SafeAssignmentId;

static ENROLLMENT_SERVICE: Lazy<EnrollmentService> = Lazy::new(EnrollmentService::new_lazy);
static DASHBOARD_SERVICE: Lazy<DashboardService> = Lazy::new(DashboardService::new_lazy);

// 可选作业
pub async fn list_available(
    req: HttpRequest,
    query: web::Query<AvailableAssignmentsParams>,
) -> ActixResult<HttpResponse> {
    ENROLLMENT_SERVICE
        .list_available(&req, query.into_inner())
        .await
}

// 已选作业
pub async fn list_my(
    req: HttpRequest,
    query: web::Query<MyAssignmentsParams>,
) -> ActixResult<HttpResponse> {
    ENROLLMENT_SERVICE.list_my(&req, query.into_inner()).await
}

// 作业详情
pub async fn get_assignment(req: HttpRequest, path: SafeAssignmentId) -> ActixResult<HttpResponse> {
    ENROLLMENT_SERVICE.get_assignment(&req, path.0).await
}

// 选课
pub async fn enroll(req: HttpRequest, path: SafeAssignmentId) -> ActixResult<HttpResponse> {
    ENROLLMENT_SERVICE.enroll(&req, path.0).await
}

// 提交
pub async fn submit(req: HttpRequest, path: SafeAssignmentId) -> ActixResult<HttpResponse> {
    ENROLLMENT_SERVICE.submit(&req, path.0).await
}

// 学生端统计
pub async fn dashboard_stats(req: HttpRequest) -> ActixResult<HttpResponse> {
    DASHBOARD_SERVICE.student_stats(&req).await
}

// 配置路由
pub fn configure_student_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/student")
            .wrap(RequireRole::new(&UserRole::Student))
            .wrap(RequireJWT)
            // 固定路径需在 /{id} 之前注册
            .route("/assignments/available", web::get().to(list_available))
            .route("/assignments/my", web::get().to(list_my))
            .route("/assignments/{id}", web::get().to(get_assignment))
            .route("/assignments/{id}/enroll", web::post().to(enroll))
            .route("/assignments/{id}/submit", web::post().to(submit))
            .route("/dashboard/stats", web::get().to(dashboard_stats)),
    );
}
