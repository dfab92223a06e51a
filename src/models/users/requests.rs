use super::entities::UserRole;
use crate::models::common::{FieldErrors, PaginationQuery};
use crate::utils::validate::{
    NAME_MIN_CHARS, check_min_chars, validate_email, validate_password, validate_phone,
};
use serde::Deserialize;
use ts_rs::TS;

// 学生注册请求（来自HTTP请求）
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "user.ts")]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub phone: Option<String>,
    #[serde(default)]
    pub password: String,
}

impl RegisterRequest {
    /// 校验并规范化注册信息，一次返回所有不合法的字段
    pub fn validate(self) -> Result<RegisterRequest, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = self.name.trim().to_string();
        check_min_chars(&mut errors, "name", &name, NAME_MIN_CHARS);

        let email = self.email.trim().to_lowercase();
        if let Err(msg) = validate_email(&email) {
            errors.add("email", msg);
        }

        let phone = self
            .phone
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());
        if let Some(phone) = &phone
            && let Err(msg) = validate_phone(phone)
        {
            errors.add("phone", msg);
        }

        if let Err(msg) = validate_password(&self.password) {
            errors.add("password", msg);
        }

        errors.into_result(RegisterRequest {
            name,
            email,
            phone,
            password: self.password,
        })
    }
}

// 用户创建请求（用于存储层，password 已经哈希）
#[derive(Debug, Clone)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password: String,
    pub role: UserRole,
}

// 学生列表查询参数（来自HTTP请求）
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "user.ts")]
pub struct StudentListParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    pub search: Option<String>,
}

// 学生列表查询参数（用于存储层）
#[derive(Debug, Clone, Default)]
pub struct StudentListQuery {
    pub pagination: PaginationQuery,
    pub search: Option<String>,
}

impl From<StudentListParams> for StudentListQuery {
    fn from(params: StudentListParams) -> Self {
        Self {
            pagination: params.pagination,
            search: params.search,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(name: &str, email: &str, phone: Option<&str>, password: &str) -> RegisterRequest {
        RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.map(str::to_string),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_register_normalizes_fields() {
        let req = register("  Alice ", " Alice@Example.COM ", Some("  "), "s3cret-pass")
            .validate()
            .unwrap();
        assert_eq!(req.name, "Alice");
        assert_eq!(req.email, "alice@example.com");
        assert_eq!(req.phone, None);
    }

    #[test]
    fn test_register_reports_every_invalid_field() {
        let errors = register("A", "not-an-email", Some("1234567890123"), "123")
            .validate()
            .unwrap_err();
        assert!(errors.contains("name"));
        assert!(errors.contains("email"));
        assert!(errors.contains("phone"));
        assert!(errors.contains("password"));
    }
}
