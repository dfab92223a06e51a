use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{debug, error};

use crate::middlewares::RequireJWT;
use crate::models::auth::{RefreshTokenResponse, UserInfoResponse};
use crate::models::users::entities::UserStatus;
use crate::models::{ApiResponse, ErrorCode};
use crate::utils::jwt::JwtUtils;

use super::AuthService;

fn login_expired() -> HttpResponse {
    // 清除无效的 refresh token cookie
    HttpResponse::Unauthorized()
        .cookie(JwtUtils::create_empty_refresh_token_cookie())
        .json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "Login expired or invalid, please login again",
        ))
}

pub async fn handle_refresh_token(
    service: &AuthService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let config = service.get_config();

    let Some(refresh_token) = JwtUtils::extract_refresh_token_from_cookie(request) else {
        return Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "Unauthorized access, please login",
        )));
    };

    let claims = match JwtUtils::verify_refresh_token(&refresh_token) {
        Ok(claims) => claims,
        Err(e) => {
            debug!("Refresh token rejected: {}", e);
            return Ok(login_expired());
        }
    };
    let Some(user_id) = claims.user_id() else {
        return Ok(login_expired());
    };

    // 用户可能已被删除或停用
    let storage = service.get_storage(request)?;
    let user = match storage.get_user_by_id(user_id).await {
        Ok(Some(user)) if user.status == UserStatus::Active => user,
        Ok(_) => return Ok(login_expired()),
        Err(e) => {
            error!("Failed to load user {} for refresh: {}", user_id, e);
            return Ok(crate::services::error_response(&e));
        }
    };

    match JwtUtils::generate_access_token(user.id, &user.role.to_string()) {
        Ok(access_token) => {
            let response = RefreshTokenResponse {
                access_token,
                expires_in: config.jwt.access_token_expiry * 60,
            };
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                response,
                "Token refreshed successfully",
            )))
        }
        Err(e) => {
            error!("Failed to generate access token: {}", e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Unable to generate token",
                )),
            )
        }
    }
}

pub async fn handle_get_user(
    _service: &AuthService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    match RequireJWT::extract_user(request) {
        Some(user) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            UserInfoResponse { user },
            "User information retrieved successfully",
        ))),
        None => Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "Unauthorized access, please login",
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;
    use crate::storage::{Storage, sea_orm_storage::{SeaOrmStorage, fixtures}};
    use crate::utils::jwt::REFRESH_TOKEN_COOKIE;
    use actix_web::{cookie::Cookie, http::StatusCode, test, web};
    use std::sync::Arc;

    #[actix_web::test]
    async fn test_refresh_issues_access_token_for_active_user() {
        let storage = SeaOrmStorage::in_memory().await.unwrap();
        let user = fixtures::user(&storage, "Alice", UserRole::Student).await;
        let storage: Arc<dyn Storage> = Arc::new(storage);

        let refresh = JwtUtils::generate_refresh_token(user.id, UserRole::STUDENT, None).unwrap();
        let req = test::TestRequest::default()
            .app_data(web::Data::new(storage))
            .cookie(Cookie::new(REFRESH_TOKEN_COOKIE, refresh))
            .to_http_request();

        let resp = handle_refresh_token(&AuthService::new_lazy(), &req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_access_token_cannot_refresh() {
        let storage: Arc<dyn Storage> = Arc::new(SeaOrmStorage::in_memory().await.unwrap());
        let access = JwtUtils::generate_access_token(1, UserRole::STUDENT).unwrap();
        let req = test::TestRequest::default()
            .app_data(web::Data::new(storage))
            .cookie(Cookie::new(REFRESH_TOKEN_COOKIE, access))
            .to_http_request();

        let resp = handle_refresh_token(&AuthService::new_lazy(), &req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_missing_cookie_is_unauthorized() {
        let req = test::TestRequest::default().to_http_request();
        let resp = handle_refresh_token(&AuthService::new_lazy(), &req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
