//! 统一错误处理模块
//!
//! 使用宏自动生成错误类型，支持错误代码和类型名称。

use std::fmt;

/// 定义错误类型的宏
///
/// 自动生成：
/// - enum 定义
/// - code() 方法 - 返回错误代码
/// - error_type() 方法 - 返回错误类型名称
/// - message() 方法 - 返回错误详情
/// - 便捷构造函数
macro_rules! define_edutask_errors {
    ($(
        $variant:ident($code:literal, $type_name:literal)
    ),* $(,)?) => {
        #[derive(Debug, Clone, PartialEq)]
        pub enum EduTaskError {
            $($variant(String),)*
        }

        impl EduTaskError {
            /// 获取错误代码
            pub fn code(&self) -> &'static str {
                match self {
                    $(EduTaskError::$variant(_) => $code,)*
                }
            }

            /// 获取错误类型名称
            pub fn error_type(&self) -> &'static str {
                match self {
                    $(EduTaskError::$variant(_) => $type_name,)*
                }
            }

            /// 获取错误详情
            pub fn message(&self) -> &str {
                match self {
                    $(EduTaskError::$variant(msg) => msg,)*
                }
            }
        }

        // 生成便捷构造函数
        paste::paste! {
            impl EduTaskError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        EduTaskError::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

define_edutask_errors! {
    CacheConnection("E001", "Cache Connection Error"),
    DatabaseConfig("E002", "Database Configuration Error"),
    DatabaseConnection("E003", "Database Connection Error"),
    DatabaseOperation("E004", "Database Operation Error"),
    FileOperation("E005", "File Operation Error"),
    Validation("E006", "Validation Error"),
    NotFound("E007", "Resource Not Found"),
    Serialization("E008", "Serialization Error"),
    DateParse("E009", "Date Parse Error"),
    Authentication("E010", "Authentication Error"),
    Authorization("E011", "Authorization Error"),
    Conflict("E012", "Resource Conflict"),
    AlreadyEnrolled("E020", "Already Enrolled"),
    PastDue("E021", "Past Due"),
    NotEnrolled("E022", "Not Enrolled"),
    AlreadySubmitted("E023", "Already Submitted"),
}

impl EduTaskError {
    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }

    /// 是否为存储层故障（调用方无法修正的错误）
    pub fn is_store_failure(&self) -> bool {
        matches!(
            self,
            EduTaskError::DatabaseOperation(_)
                | EduTaskError::DatabaseConnection(_)
                | EduTaskError::DatabaseConfig(_)
                | EduTaskError::CacheConnection(_)
        )
    }
}

impl fmt::Display for EduTaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for EduTaskError {}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for EduTaskError {
    fn from(err: sea_orm::DbErr) -> Self {
        EduTaskError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for EduTaskError {
    fn from(err: std::io::Error) -> Self {
        EduTaskError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for EduTaskError {
    fn from(err: serde_json::Error) -> Self {
        EduTaskError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for EduTaskError {
    fn from(err: chrono::ParseError) -> Self {
        EduTaskError::DateParse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EduTaskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(EduTaskError::cache_connection("test").code(), "E001");
        assert_eq!(EduTaskError::validation("test").code(), "E006");
        assert_eq!(EduTaskError::authentication("test").code(), "E010");
        assert_eq!(EduTaskError::already_enrolled("test").code(), "E020");
        assert_eq!(EduTaskError::already_submitted("test").code(), "E023");
    }

    #[test]
    fn test_error_types() {
        assert_eq!(EduTaskError::past_due("test").error_type(), "Past Due");
        assert_eq!(
            EduTaskError::not_enrolled("test").error_type(),
            "Not Enrolled"
        );
    }

    #[test]
    fn test_error_message() {
        let err = EduTaskError::validation("title: too short");
        assert_eq!(err.message(), "title: too short");
    }

    #[test]
    fn test_format_simple() {
        let err = EduTaskError::not_found("Assignment not found");
        let formatted = err.format_simple();
        assert!(formatted.contains("Resource Not Found"));
        assert!(formatted.contains("Assignment not found"));
    }

    #[test]
    fn test_db_error_is_store_failure() {
        let err: EduTaskError = sea_orm::DbErr::Custom("boom".into()).into();
        assert!(err.is_store_failure());
        assert!(!EduTaskError::past_due("late").is_store_failure());
    }
}
