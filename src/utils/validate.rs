use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::FieldErrors;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("Invalid email regex")
});

pub const NAME_MIN_CHARS: usize = 2;
pub const PHONE_MAX_CHARS: usize = 12;
pub const PASSWORD_MIN_CHARS: usize = 6;

/// 常见弱密码，不区分大小写
const WEAK_PASSWORDS: [&str; 6] = ["123456", "1234567", "12345678", "password", "qwerty", "abc123"];

pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if !EMAIL_RE.is_match(email) {
        return Err("Email format is invalid");
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < PASSWORD_MIN_CHARS {
        return Err("Minimum 6 characters");
    }
    if WEAK_PASSWORDS
        .iter()
        .any(|weak| password.eq_ignore_ascii_case(weak))
    {
        return Err("Password is too common, please choose a stronger password");
    }
    Ok(())
}

pub fn validate_phone(phone: &str) -> Result<(), &'static str> {
    if phone.chars().count() > PHONE_MAX_CHARS {
        return Err("Maximum 12 characters");
    }
    Ok(())
}

/// 字符数不少于 `min` 时通过，否则记录到 `errors`
pub fn check_min_chars(errors: &mut FieldErrors, field: &str, value: &str, min: usize) {
    if value.chars().count() < min {
        errors.add(field, format!("Must be at least {min} characters"));
    }
}

/// 解析 RFC 3339 截止时间，失败时记录到 `errors`
pub fn parse_due_date(errors: &mut FieldErrors, field: &str, value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, "Due date is required");
        return None;
    }
    match DateTime::parse_from_rfc3339(value) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(_) => {
            errors.add(field, "Due date must be an RFC 3339 timestamp");
            None
        }
    }
}
