/*!
 * 基于角色的访问控制中间件
 *
 * 此中间件必须在 RequireJWT 中间件之后使用，用于验证用户是否具有特定角色权限。
 *
 * ## 使用方法
 *
 * ```rust,ignore
 * use actix_web::{web, App, HttpServer};
 * use crate::middlewares::require_jwt::RequireJWT;
 * use crate::middlewares::require_role::RequireRole;
 * use crate::models::users::entities::UserRole;
 *
 * HttpServer::new(|| {
 *     App::new()
 *         .service(
 *             web::scope("/api")
 *                 .service(
 *                     web::scope("/admin")
 *                         .wrap(RequireRole::new(&UserRole::Admin))  // 再验证角色
 *                         .wrap(RequireJWT)  // 先验证JWT（后注册的先执行）
 *                         .route("/students", web::get().to(list_students_handler))
 *                 )
 *         )
 * })
 * ```
 *
 * 角色不符返回 403，未认证返回 401。
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use tracing::info;

use crate::{
    models::{
        ErrorCode,
        users::entities::{User, UserRole},
    },
};

use super::create_error_response;

#[derive(Clone)]
pub struct RequireRole {
    required_role: UserRole,
}

impl RequireRole {
    /// 创建需要特定角色的中间件
    pub fn new(role: &UserRole) -> Self {
        Self {
            required_role: *role,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireRole
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireRoleMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireRoleMiddleware {
            service: Rc::new(service),
            required_role: self.required_role,
        }))
    }
}

pub struct RequireRoleMiddleware<S> {
    service: Rc<S>,
    required_role: UserRole,
}

impl<S, B> Service<ServiceRequest> for RequireRoleMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let required_role = self.required_role;

        Box::pin(async move {
            // 从请求扩展中获取当前用户
            let caller = req.extensions().get::<User>().map(User::caller);

            match caller {
                Some(caller) => {
                    if caller.role == required_role {
                        let res = srv.call(req).await?.map_into_left_body();
                        Ok(res)
                    } else {
                        info!(
                            "Access denied for user {} (role: {:?}). Required role: {:?}",
                            caller.user_id, caller.role, required_role
                        );
                        Ok(req.into_response(
                            create_error_response(
                                StatusCode::FORBIDDEN,
                                ErrorCode::Forbidden,
                                "Access denied",
                            )
                            .map_into_right_body(),
                        ))
                    }
                }
                None => {
                    info!("Role check failed: no authenticated user in request extensions");
                    Ok(req.into_response(
                        create_error_response(
                            StatusCode::UNAUTHORIZED,
                            ErrorCode::Unauthorized,
                            "Authentication required",
                        )
                        .map_into_right_body(),
                    ))
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, HttpResponse, test, web};
    use chrono::Utc;

    use crate::models::users::entities::UserStatus;

    fn user_with_role(role: UserRole) -> User {
        let now = Utc::now();
        User {
            id: 7,
            name: "Tester".to_string(),
            email: "tester@example.com".to_string(),
            phone: None,
            password_hash: String::new(),
            role,
            status: UserStatus::Active,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    async fn ok() -> HttpResponse {
        HttpResponse::Ok().finish()
    }

    async fn call_scope_as(required: UserRole, role: Option<UserRole>) -> StatusCode {
        let app = test::init_service(
            App::new().service(
                web::scope("/scoped")
                    .wrap(RequireRole::new(&required))
                    .route("", web::get().to(ok)),
            ),
        )
        .await;

        let req = test::TestRequest::get().uri("/scoped").to_request();
        if let Some(role) = role {
            req.extensions_mut().insert(user_with_role(role));
        }
        test::call_service(&app, req).await.status()
    }

    async fn call_as(role: Option<UserRole>) -> StatusCode {
        call_scope_as(UserRole::Admin, role).await
    }

    #[actix_web::test]
    async fn test_matching_role_passes() {
        assert_eq!(call_as(Some(UserRole::Admin)).await, StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_wrong_role_is_forbidden() {
        assert_eq!(call_as(Some(UserRole::Student)).await, StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_missing_user_is_unauthorized() {
        assert_eq!(call_as(None).await, StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_student_scope_rejects_admin() {
        assert_eq!(
            call_scope_as(UserRole::Student, Some(UserRole::Student)).await,
            StatusCode::OK
        );
        assert_eq!(
            call_scope_as(UserRole::Student, Some(UserRole::Admin)).await,
            StatusCode::FORBIDDEN
        );
    }
}
