use std::collections::BTreeMap;

use serde::Serialize;
use ts_rs::TS;

use crate::errors::EduTaskError;

/// 按字段收集的校验错误
#[derive(Debug, Clone, Default, PartialEq, Serialize, TS)]
#[ts(export, export_to = "api.ts")]
pub struct FieldErrors {
    pub errors: BTreeMap<String, Vec<String>>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    /// 无错误时返回给定值
    pub fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }

    /// 单行摘要，形如 `title: ...; subject: ...`
    pub fn summary(&self) -> String {
        self.errors
            .iter()
            .map(|(field, messages)| format!("{field}: {}", messages.join(", ")))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl From<FieldErrors> for EduTaskError {
    fn from(errors: FieldErrors) -> Self {
        EduTaskError::validation(errors.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_messages_per_field() {
        let mut errors = FieldErrors::new();
        errors.add("title", "too short");
        errors.add("title", "required");
        errors.add("subject", "too short");

        assert!(errors.contains("title"));
        assert_eq!(errors.errors["title"].len(), 2);
        assert_eq!(
            errors.summary(),
            "subject: too short; title: too short, required"
        );
    }

    #[test]
    fn test_into_result() {
        assert_eq!(FieldErrors::new().into_result(7), Ok(7));

        let mut errors = FieldErrors::new();
        errors.add("email", "invalid");
        let err: EduTaskError = errors.into_result(()).unwrap_err().into();
        assert_eq!(err.code(), "E006");
    }
}
