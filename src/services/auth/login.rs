use actix_web::{HttpRequest, HttpResponse, HttpResponseBuilder, Result as ActixResult};
use tracing::{debug, error, info};

use crate::models::users::entities::{User, UserStatus};
use crate::models::{
    ApiResponse, ErrorCode,
    auth::{LoginRequest, LoginResponse},
};
use crate::utils::jwt;
use crate::utils::password::verify_password;

use super::AuthService;

const LOGIN_FAILED: &str = "Email or password is incorrect";

pub async fn handle_login(
    service: &AuthService,
    login_request: LoginRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let email = login_request.email.trim().to_lowercase();

    // 1. 根据邮箱获取用户信息
    let user = match storage.get_user_by_email(&email).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            debug!("Login rejected, unknown email {}", email);
            return Ok(HttpResponse::Unauthorized()
                .json(ApiResponse::error_empty(ErrorCode::AuthFailed, LOGIN_FAILED)));
        }
        Err(e) => {
            error!("Login lookup failed: {}", e);
            return Ok(crate::services::error_response(&e));
        }
    };

    // 2. 验证密码
    if !verify_password(&login_request.password, &user.password_hash) {
        debug!("Login rejected, wrong password for user {}", user.id);
        return Ok(HttpResponse::Unauthorized()
            .json(ApiResponse::error_empty(ErrorCode::AuthFailed, LOGIN_FAILED)));
    }

    if user.status != UserStatus::Active {
        return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::AuthFailed,
            "Account is suspended",
        )));
    }

    // 3. 更新最后登录时间
    if let Err(e) = storage.update_last_login(user.id).await {
        error!("Failed to update last login for user {}: {}", user.id, e);
    }

    info!("User {} logged in successfully", user.id);
    issue_tokens(
        service,
        HttpResponse::Ok(),
        user,
        login_request.remember_me,
        "Login successful",
    )
}

/// 签发 access/refresh token：access token 放在响应体，refresh token 放在 cookie
pub(super) fn issue_tokens(
    service: &AuthService,
    mut builder: HttpResponseBuilder,
    user: User,
    remember_me: bool,
    message: &str,
) -> ActixResult<HttpResponse> {
    let config = service.get_config();
    let refresh_expiry =
        remember_me.then(|| chrono::Duration::days(config.jwt.refresh_token_remember_me_expiry));

    match user.generate_token_pair(refresh_expiry) {
        Ok(token_pair) => {
            let response = LoginResponse {
                access_token: token_pair.access_token,
                expires_in: config.jwt.access_token_expiry * 60, // 转换为秒
                user,
                created_at: chrono::Utc::now(),
            };

            let refresh_cookie =
                jwt::JwtUtils::create_refresh_token_cookie(&token_pair.refresh_token, remember_me);

            Ok(builder
                .cookie(refresh_cookie)
                .json(ApiResponse::success(response, message)))
        }
        Err(e) => {
            error!("Failed to generate JWT token: {}", e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Unable to generate token",
                )),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::{entities::UserRole, requests::CreateUserRequest};
    use crate::storage::{Storage, sea_orm_storage::SeaOrmStorage};
    use crate::utils::password::hash_password;
    use actix_web::{http::StatusCode, test, web};
    use std::sync::Arc;

    async fn request_with_user(password: &str) -> HttpRequest {
        let storage = SeaOrmStorage::in_memory().await.unwrap();
        storage
            .create_user(CreateUserRequest {
                name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
                phone: None,
                password: hash_password(password).unwrap(),
                role: UserRole::Student,
            })
            .await
            .unwrap();
        let storage: Arc<dyn Storage> = Arc::new(storage);
        test::TestRequest::default()
            .app_data(web::Data::new(storage))
            .to_http_request()
    }

    fn login(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
            remember_me: false,
        }
    }

    #[actix_web::test]
    async fn test_login_sets_refresh_cookie() {
        let req = request_with_user("correct-horse").await;
        let resp = handle_login(
            &AuthService::new_lazy(),
            login("Alice@Example.com", "correct-horse"),
            &req,
        )
        .await
        .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert!(
            resp.cookies()
                .any(|c| c.name() == jwt::REFRESH_TOKEN_COOKIE && !c.value().is_empty())
        );
    }

    #[actix_web::test]
    async fn test_wrong_password_and_unknown_email_look_the_same() {
        let req = request_with_user("correct-horse").await;
        let service = AuthService::new_lazy();

        let wrong = handle_login(&service, login("alice@example.com", "nope-nope"), &req)
            .await
            .unwrap();
        let unknown = handle_login(&service, login("bob@example.com", "correct-horse"), &req)
            .await
            .unwrap();

        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    }
}
