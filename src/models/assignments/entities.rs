use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 作业状态（由管理员控制，与选课情况无关）
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "assignment.ts")]
pub enum AssignmentStatus {
    #[default]
    Pending,
    Completed,
}

impl std::fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssignmentStatus::Pending => write!(f, "pending"),
            AssignmentStatus::Completed => write!(f, "completed"),
        }
    }
}

impl std::str::FromStr for AssignmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AssignmentStatus::Pending),
            "completed" => Ok(AssignmentStatus::Completed),
            _ => Err(format!("Invalid assignment status: {s}")),
        }
    }
}

// 提交状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "assignment.ts")]
pub enum SubmissionStatus {
    #[default]
    NotSubmitted,
    Submitted,
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmissionStatus::NotSubmitted => write!(f, "not_submitted"),
            SubmissionStatus::Submitted => write!(f, "submitted"),
        }
    }
}

impl std::str::FromStr for SubmissionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_submitted" => Ok(SubmissionStatus::NotSubmitted),
            "submitted" => Ok(SubmissionStatus::Submitted),
            _ => Err(format!("Invalid submission status: {s}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "assignment.ts")]
pub struct Assignment {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub subject: String,
    // 截止时间
    pub due_date: DateTime<Utc>,
    pub status: AssignmentStatus,
    // 创建者（管理员）ID
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Assignment {
    /// 截止时间已过（严格早于 now）
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.due_date < now
    }
}

/// 某个学生在某份作业上的选课记录
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "assignment.ts")]
pub struct EnrollmentRecord {
    pub student_id: i64,
    pub enrolled_at: DateTime<Utc>,
    pub submission_status: SubmissionStatus,
    // 仅在 submitted 时存在，写入后不再变化
    pub submitted_at: Option<DateTime<Utc>>,
}

impl EnrollmentRecord {
    pub fn new(student_id: i64, enrolled_at: DateTime<Utc>) -> Self {
        Self {
            student_id,
            enrolled_at,
            submission_status: SubmissionStatus::NotSubmitted,
            submitted_at: None,
        }
    }

    pub fn is_submitted(&self) -> bool {
        self.submission_status == SubmissionStatus::Submitted
    }
}
