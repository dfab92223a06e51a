use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use crate::errors::EduTaskError;
use crate::models::users::{
    entities::UserRole,
    requests::{CreateUserRequest, RegisterRequest},
};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::validation_response;
use crate::utils::password::hash_password;

use super::AuthService;

pub async fn handle_register(
    service: &AuthService,
    register_request: RegisterRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    // 1. 校验字段
    let register_request = match register_request.validate() {
        Ok(valid) => valid,
        Err(errors) => return Ok(validation_response(errors)),
    };

    // 2. 哈希密码
    let password_hash = match hash_password(&register_request.password) {
        Ok(hash) => hash,
        Err(e) => {
            error!("Password hashing failed: {}", e);
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::RegisterFailed,
                    "Registration failed",
                )),
            );
        }
    };

    // 3. 创建学生账号，邮箱唯一性由存储层保证
    let create_request = CreateUserRequest {
        name: register_request.name,
        email: register_request.email,
        phone: register_request.phone,
        password: password_hash,
        role: UserRole::Student,
    };

    match storage.create_user(create_request).await {
        Ok(user) => {
            info!("Student {} registered", user.id);
            super::login::issue_tokens(
                service,
                HttpResponse::Created(),
                user,
                false,
                "Registration successful",
            )
        }
        Err(EduTaskError::Conflict(_)) => Ok(HttpResponse::Conflict().json(
            ApiResponse::error_empty(ErrorCode::UserEmailAlreadyExists, "Email already exists"),
        )),
        Err(e) => {
            error!("Failed to create user: {}", e);
            Ok(crate::services::error_response(&e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Storage, sea_orm_storage::SeaOrmStorage};
    use actix_web::{http::StatusCode, test, web};
    use std::sync::Arc;

    async fn empty_request() -> (HttpRequest, Arc<dyn Storage>) {
        let storage: Arc<dyn Storage> = Arc::new(SeaOrmStorage::in_memory().await.unwrap());
        let req = test::TestRequest::default()
            .app_data(web::Data::new(storage.clone()))
            .to_http_request();
        (req, storage)
    }

    fn register(email: &str) -> RegisterRequest {
        RegisterRequest {
            name: "Alice".to_string(),
            email: email.to_string(),
            phone: Some("13800000000".to_string()),
            password: "s3cret-pass".to_string(),
        }
    }

    #[actix_web::test]
    async fn test_register_creates_student() {
        let (req, storage) = empty_request().await;
        let resp = handle_register(&AuthService::new_lazy(), register("Alice@Example.com"), &req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let user = storage
            .get_user_by_email("alice@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.role, UserRole::Student);
        assert_ne!(user.password_hash, "s3cret-pass");
    }

    #[actix_web::test]
    async fn test_duplicate_email_is_conflict() {
        let (req, _) = empty_request().await;
        let service = AuthService::new_lazy();
        handle_register(&service, register("alice@example.com"), &req)
            .await
            .unwrap();
        let resp = handle_register(&service, register("ALICE@example.com"), &req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn test_invalid_fields_are_rejected() {
        let (req, storage) = empty_request().await;
        let mut bad = register("not-an-email");
        bad.password = "123".to_string();
        let resp = handle_register(&AuthService::new_lazy(), bad, &req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(storage.count_users().await.unwrap(), 0);
    }
}
