/*!
 * JWT 认证中间件
 *
 * 验证 `Authorization: Bearer <token>` 中的 access token，加载对应的活跃用户，
 * 并把用户放入请求扩展，供后续的角色中间件和处理程序使用。
 *
 * ## 使用方法
 *
 * ```rust,ignore
 * use actix_web::{web, App};
 * use crate::middlewares::RequireJWT;
 *
 * App::new().service(
 *     web::scope("/api/v1/student")
 *         .wrap(RequireJWT)
 *         .route("/dashboard", web::get().to(dashboard_handler)),
 * );
 *
 * async fn dashboard_handler(req: HttpRequest) -> ActixResult<HttpResponse> {
 *     let caller = RequireJWT::extract_caller(&req);
 *     // ...
 * }
 * ```
 *
 * ## 认证流程
 *
 * 1. 校验签名、过期时间与 token 类型
 * 2. 先查缓存 `user:{token}`，未命中再查存储
 * 3. 非活跃用户一律拒绝
 * 4. 失败返回 401
 */

use crate::cache::{CacheResult, ObjectCache};
use crate::config::AppConfig;
use crate::models::users::entities::{Caller, User, UserRole, UserStatus};
use crate::models::ErrorCode;
use crate::storage::Storage;
use crate::utils::jwt::JwtUtils;
use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
    web,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::{rc::Rc, sync::Arc};
use tracing::{debug, error, info};

use super::create_error_response;

const BEARER_PREFIX: &str = "Bearer ";
const AUTHORIZATION_HEADER: &str = "Authorization";

#[derive(Clone)]
pub struct RequireJWT;

fn user_cache_key(token: &str) -> String {
    format!("user:{token}")
}

// 提取并验证 JWT access token
async fn extract_and_validate_jwt(req: &ServiceRequest) -> Result<User, String> {
    let token = req
        .headers()
        .get(AUTHORIZATION_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| "Missing or invalid Authorization header".to_string())?;

    let claims = JwtUtils::verify_access_token(token).map_err(|err| {
        info!("JWT token validation failed: {}", err);
        "Invalid JWT token".to_string()
    })?;

    let user_id = claims
        .user_id()
        .ok_or_else(|| "Invalid user ID in JWT".to_string())?;

    let cache = req
        .app_data::<web::Data<Arc<dyn ObjectCache>>>()
        .map(|data| data.get_ref().clone());

    if let Some(cache) = &cache {
        match cache.get::<User>(&user_cache_key(token)).await {
            CacheResult::Found(user) if user.id == user_id => return Ok(user),
            CacheResult::Found(_) | CacheResult::ExistsButNoValue => {
                cache.remove(&user_cache_key(token)).await;
            }
            CacheResult::NotFound => {
                debug!("User {} not found in cache", user_id);
            }
        }
    }

    let storage = req
        .app_data::<web::Data<Arc<dyn Storage>>>()
        .map(|data| data.get_ref().clone())
        .ok_or_else(|| {
            error!("Storage not found in app data");
            "Authentication backend unavailable".to_string()
        })?;

    let user = storage
        .get_user_by_id(user_id)
        .await
        .map_err(|e| {
            error!("Failed to retrieve user {} from storage: {}", user_id, e);
            "Failed to retrieve user from storage".to_string()
        })?
        .ok_or_else(|| "User not found".to_string())?;

    if user.status != UserStatus::Active {
        return Err("User is not active".to_string());
    }

    if let Some(cache) = &cache {
        cache
            .insert(
                user_cache_key(token),
                &user,
                AppConfig::get().cache.default_ttl,
            )
            .await;
    }

    Ok(user)
}

impl<S, B> Transform<S, ServiceRequest> for RequireJWT
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireJWTMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireJWTMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireJWTMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireJWTMiddleware<S>
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
        Box::pin(async move {
            // 预检请求直接放行
            if req.method() == actix_web::http::Method::OPTIONS {
                let response = HttpResponse::NoContent().finish();
                return Ok(req.into_response(response.map_into_right_body()));
            }

            match extract_and_validate_jwt(&req).await {
                Ok(user) => {
                    debug!("JWT authentication successful for ID: {}", user.id);
                    req.extensions_mut().insert(user);
                    let res = srv.call(req).await?.map_into_left_body();
                    Ok(res)
                }
                Err(err) => {
                    info!(
                        "JWT authentication failed for request to {}: {}",
                        req.path(),
                        err
                    );
                    Ok(req.into_response(
                        create_error_response(
                            StatusCode::UNAUTHORIZED,
                            ErrorCode::Unauthorized,
                            &format!("Unauthorized: {err}"),
                        )
                        .map_into_right_body(),
                    ))
                }
            }
        })
    }
}

impl RequireJWT {
    /// 从请求扩展中提取当前用户
    pub fn extract_user(req: &actix_web::HttpRequest) -> Option<User> {
        req.extensions().get::<User>().cloned()
    }

    pub fn extract_user_id(req: &actix_web::HttpRequest) -> Option<i64> {
        req.extensions().get::<User>().map(|user| user.id)
    }

    pub fn extract_user_role(req: &actix_web::HttpRequest) -> Option<UserRole> {
        req.extensions().get::<User>().map(|user| user.role)
    }

    /// 提取已认证的调用方
    pub fn extract_caller(req: &actix_web::HttpRequest) -> Option<Caller> {
        req.extensions().get::<User>().map(User::caller)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::sea_orm_storage::SeaOrmStorage;
    use crate::storage::sea_orm_storage::fixtures;
    use actix_web::{App, test};

    async fn whoami(req: actix_web::HttpRequest) -> HttpResponse {
        match RequireJWT::extract_caller(&req) {
            Some(caller) => HttpResponse::Ok().body(format!("{}:{}", caller.user_id, caller.role)),
            None => HttpResponse::InternalServerError().finish(),
        }
    }

    async fn storage_with_student() -> (Arc<dyn Storage>, User) {
        let storage = SeaOrmStorage::in_memory().await.unwrap();
        let user = fixtures::user(&storage, "Alice", UserRole::Student).await;
        (Arc::new(storage), user)
    }

    #[actix_web::test]
    async fn test_missing_token_is_unauthorized() {
        let (storage, _) = storage_with_student().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(storage))
                .service(web::scope("/p").wrap(RequireJWT).route("", web::get().to(whoami))),
        )
        .await;

        let req = test::TestRequest::get().uri("/p").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_preflight_passes_without_token() {
        let (storage, _) = storage_with_student().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(storage))
                .service(web::scope("/p").wrap(RequireJWT).route("", web::route().to(whoami))),
        )
        .await;

        let req = test::TestRequest::default()
            .method(actix_web::http::Method::OPTIONS)
            .uri("/p")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    }

    #[actix_web::test]
    async fn test_valid_token_sets_caller() {
        let (storage, user) = storage_with_student().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(storage))
                .service(web::scope("/p").wrap(RequireJWT).route("", web::get().to(whoami))),
        )
        .await;

        let token = JwtUtils::generate_access_token(user.id, UserRole::STUDENT).unwrap();
        let req = test::TestRequest::get()
            .uri("/p")
            .insert_header((AUTHORIZATION_HEADER, format!("Bearer {token}")))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        assert_eq!(body, format!("{}:student", user.id));
    }

    #[actix_web::test]
    async fn test_refresh_token_is_rejected_as_access_token() {
        let (storage, user) = storage_with_student().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(storage))
                .service(web::scope("/p").wrap(RequireJWT).route("", web::get().to(whoami))),
        )
        .await;

        let token = JwtUtils::generate_refresh_token(user.id, UserRole::STUDENT, None).unwrap();
        let req = test::TestRequest::get()
            .uri("/p")
            .insert_header((AUTHORIZATION_HEADER, format!("Bearer {token}")))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
