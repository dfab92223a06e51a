use chrono::{DateTime, Utc};
use serde::Deserialize;
use ts_rs::TS;

use super::entities::{AssignmentStatus, SubmissionStatus};
use crate::models::common::{FieldErrors, PaginationQuery};
use crate::utils::validate::{check_min_chars, parse_due_date};

pub const TITLE_MIN_CHARS: usize = 3;
pub const DESCRIPTION_MIN_CHARS: usize = 5;
pub const SUBJECT_MIN_CHARS: usize = 2;

/// 创建作业请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "assignment.ts")]
pub struct CreateAssignmentRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub subject: String,
    /// RFC 3339 格式，如 "2026-01-24T12:00:00Z"
    #[serde(default)]
    pub due_date: String,
}

/// 通过校验的新作业（用于存储层）
#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub title: String,
    pub description: String,
    pub subject: String,
    pub due_date: DateTime<Utc>,
}

impl CreateAssignmentRequest {
    /// 校验全部字段，返回所有出错字段
    pub fn validate(self) -> Result<NewAssignment, FieldErrors> {
        let mut errors = FieldErrors::new();

        let title = self.title.trim().to_string();
        let description = self.description.trim().to_string();
        let subject = self.subject.trim().to_string();

        check_min_chars(&mut errors, "title", &title, TITLE_MIN_CHARS);
        check_min_chars(&mut errors, "description", &description, DESCRIPTION_MIN_CHARS);
        check_min_chars(&mut errors, "subject", &subject, SUBJECT_MIN_CHARS);
        let due_date = parse_due_date(&mut errors, "due_date", &self.due_date);

        match due_date {
            Some(due_date) if errors.is_empty() => Ok(NewAssignment {
                title,
                description,
                subject,
                due_date,
            }),
            _ => Err(errors),
        }
    }
}

/// 更新作业请求
#[derive(Debug, Default, Deserialize, TS)]
#[ts(export, export_to = "assignment.ts")]
pub struct UpdateAssignmentRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub subject: Option<String>,
    pub status: Option<AssignmentStatus>,
}

/// 通过校验的作业修改（用于存储层）
#[derive(Debug, Clone, Default)]
pub struct AssignmentChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub subject: Option<String>,
    pub status: Option<AssignmentStatus>,
}

impl UpdateAssignmentRequest {
    pub fn validate(self) -> Result<AssignmentChanges, FieldErrors> {
        let mut errors = FieldErrors::new();

        let title = self.title.map(|t| t.trim().to_string());
        let description = self.description.map(|d| d.trim().to_string());
        let subject = self.subject.map(|s| s.trim().to_string());

        if let Some(ref title) = title {
            check_min_chars(&mut errors, "title", title, TITLE_MIN_CHARS);
        }
        if let Some(ref description) = description {
            check_min_chars(&mut errors, "description", description, DESCRIPTION_MIN_CHARS);
        }
        if let Some(ref subject) = subject {
            check_min_chars(&mut errors, "subject", subject, SUBJECT_MIN_CHARS);
        }

        errors.into_result(AssignmentChanges {
            title,
            description,
            subject,
            status: self.status,
        })
    }
}

/// 管理端作业列表查询参数（HTTP 请求）
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "assignment.ts")]
pub struct AssignmentListParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    pub status: Option<AssignmentStatus>,
    pub subject: Option<String>,
}

// 用于存储层的内部查询参数
#[derive(Debug, Clone, Default)]
pub struct AssignmentListQuery {
    pub pagination: PaginationQuery,
    pub status: Option<AssignmentStatus>,
    pub subject: Option<String>,
}

impl From<AssignmentListParams> for AssignmentListQuery {
    fn from(params: AssignmentListParams) -> Self {
        Self {
            pagination: params.pagination,
            status: params.status,
            subject: params.subject,
        }
    }
}

/// 学生可选作业查询参数
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "assignment.ts")]
pub struct AvailableAssignmentsParams {
    pub subject: Option<String>,
    pub status: Option<AssignmentStatus>,
    #[serde(default, alias = "includeExpired")]
    pub include_expired: bool,
}

/// 学生已选作业查询参数
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "assignment.ts")]
pub struct MyAssignmentsParams {
    #[serde(alias = "submissionStatus")]
    pub submission_status: Option<SubmissionStatus>,
}

/// 学生视角的作业筛选条件（用于存储层）
#[derive(Debug, Clone, Default)]
pub struct StudentAssignmentFilter {
    pub subject: Option<String>,
    pub status: Option<AssignmentStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_request(
        title: &str,
        description: &str,
        subject: &str,
        due: &str,
    ) -> CreateAssignmentRequest {
        CreateAssignmentRequest {
            title: title.to_string(),
            description: description.to_string(),
            subject: subject.to_string(),
            due_date: due.to_string(),
        }
    }

    #[test]
    fn test_create_request_trims_and_parses() {
        let new = create_request("  Essay  ", "Write five pages", "History", "2099-01-01T00:00:00Z")
            .validate()
            .unwrap();
        assert_eq!(new.title, "Essay");
        assert_eq!(new.due_date.to_rfc3339(), "2099-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_create_request_enumerates_every_bad_field() {
        let errors = create_request("ab", "four", "x", "tomorrow")
            .validate()
            .unwrap_err();
        for field in ["title", "description", "subject", "due_date"] {
            assert!(errors.contains(field), "missing error for {field}");
        }
    }

    #[test]
    fn test_update_request_checks_only_present_fields() {
        let changes = UpdateAssignmentRequest {
            status: Some(AssignmentStatus::Completed),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(changes.status, Some(AssignmentStatus::Completed));
        assert!(changes.title.is_none());

        let errors = UpdateAssignmentRequest {
            title: Some(" a ".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert!(errors.contains("title"));
        assert!(!errors.contains("subject"));
    }

    #[test]
    fn test_available_params_accept_camel_case() {
        let params: AvailableAssignmentsParams =
            serde_json::from_str(r#"{"includeExpired":true,"subject":"Math"}"#).unwrap();
        assert!(params.include_expired);
        assert_eq!(params.subject.as_deref(), Some("Math"));

        let params: MyAssignmentsParams =
            serde_json::from_str(r#"{"submissionStatus":"submitted"}"#).unwrap();
        assert_eq!(params.submission_status, Some(SubmissionStatus::Submitted));
    }
}
