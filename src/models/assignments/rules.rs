//! 选课与提交规则
//!
//! 纯函数实现，不访问存储。调用方负责取得当前状态、传入服务器时间 `now`，
//! 并在规则通过后持久化结果。
//!
//! ```text
//! [无记录] --选课 (now < due_date)--> NotSubmitted --提交--> Submitted（终态）
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::entities::{Assignment, EnrollmentRecord, SubmissionStatus};
use super::responses::{AvailableAssignmentItem, MyAssignmentItem, StudentAssignmentDetail};
use crate::errors::{EduTaskError, Result};
use crate::models::dashboard::responses::StudentDashboardStats;

pub const MSG_ALREADY_ENROLLED: &str = "Already enrolled in this assignment";
pub const MSG_PAST_DUE: &str = "Cannot enroll - assignment due date has passed";
pub const MSG_NOT_ENROLLED: &str = "You are not enrolled in this assignment";
pub const MSG_ALREADY_SUBMITTED: &str = "Assignment already submitted";

/// 一份作业上的全部选课记录，按学生 ID 唯一
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Enrollments {
    records: BTreeMap<i64, EnrollmentRecord>,
}

impl Enrollments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, student_id: i64) -> Option<&EnrollmentRecord> {
        self.records.get(&student_id)
    }

    pub fn contains(&self, student_id: i64) -> bool {
        self.records.contains_key(&student_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn count_by_status(&self, status: SubmissionStatus) -> usize {
        self.records
            .values()
            .filter(|r| r.submission_status == status)
            .count()
    }

    /// 按选课时间排列的记录
    pub fn into_records(self) -> Vec<EnrollmentRecord> {
        let mut records: Vec<_> = self.records.into_values().collect();
        records.sort_by(|a, b| {
            a.enrolled_at
                .cmp(&b.enrolled_at)
                .then(a.student_id.cmp(&b.student_id))
        });
        records
    }

    /// 选课
    ///
    /// 先检查重复选课，再检查截止时间（`now >= due_date` 时拒绝）。
    pub fn enroll(
        &mut self,
        student_id: i64,
        due_date: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<&EnrollmentRecord> {
        if self.contains(student_id) {
            return Err(EduTaskError::already_enrolled(MSG_ALREADY_ENROLLED));
        }
        if now >= due_date {
            return Err(EduTaskError::past_due(MSG_PAST_DUE));
        }

        let record = self
            .records
            .entry(student_id)
            .or_insert_with(|| EnrollmentRecord::new(student_id, now));
        Ok(&*record)
    }

    /// 提交
    ///
    /// 不检查截止时间。重复提交返回错误而不是静默成功。
    pub fn submit(&mut self, student_id: i64, now: DateTime<Utc>) -> Result<&EnrollmentRecord> {
        let record = self
            .records
            .get_mut(&student_id)
            .ok_or_else(|| EduTaskError::not_enrolled(MSG_NOT_ENROLLED))?;

        if record.is_submitted() {
            return Err(EduTaskError::already_submitted(MSG_ALREADY_SUBMITTED));
        }

        record.submission_status = SubmissionStatus::Submitted;
        record.submitted_at = Some(now);
        Ok(&*record)
    }
}

impl FromIterator<EnrollmentRecord> for Enrollments {
    // 同一学生出现多次时保留第一条
    fn from_iter<I: IntoIterator<Item = EnrollmentRecord>>(iter: I) -> Self {
        let mut records = BTreeMap::new();
        for record in iter {
            records.entry(record.student_id).or_insert(record);
        }
        Self { records }
    }
}

/// 作业及其当前选课状态
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentState {
    pub assignment: Assignment,
    pub enrollments: Enrollments,
}

impl AssignmentState {
    pub fn enroll(&mut self, student_id: i64, now: DateTime<Utc>) -> Result<EnrollmentRecord> {
        let due_date = self.assignment.due_date;
        self.enrollments.enroll(student_id, due_date, now).cloned()
    }

    pub fn submit(&mut self, student_id: i64, now: DateTime<Utc>) -> Result<EnrollmentRecord> {
        self.enrollments.submit(student_id, now).cloned()
    }
}

/// 从某个学生角度看到的作业：作业本身及该学生的选课记录（若有）
#[derive(Debug, Clone, PartialEq)]
pub struct StudentAssignmentView {
    pub assignment: Assignment,
    pub enrollment: Option<EnrollmentRecord>,
}

impl StudentAssignmentView {
    pub fn into_detail(self) -> StudentAssignmentDetail {
        StudentAssignmentDetail {
            is_enrolled: self.enrollment.is_some(),
            assignment: self.assignment,
            enrollment: self.enrollment,
        }
    }
}

/// 学生尚未选的作业
///
/// `include_expired` 为 false 时排除 `due_date < now` 的作业。结果按截止时间升序。
pub fn compute_available_assignments(
    views: Vec<StudentAssignmentView>,
    now: DateTime<Utc>,
    include_expired: bool,
) -> Vec<AvailableAssignmentItem> {
    let mut items: Vec<_> = views
        .into_iter()
        .filter(|v| v.enrollment.is_none())
        .filter(|v| include_expired || !v.assignment.is_expired(now))
        .map(|v| AvailableAssignmentItem {
            is_expired: v.assignment.is_expired(now),
            assignment: v.assignment,
        })
        .collect();

    items.sort_by(|a, b| {
        a.assignment
            .due_date
            .cmp(&b.assignment.due_date)
            .then(a.assignment.id.cmp(&b.assignment.id))
    });
    items
}

/// 学生已选的作业，附带本人的选课字段
pub fn compute_my_assignments(
    views: Vec<StudentAssignmentView>,
    status_filter: Option<SubmissionStatus>,
) -> Vec<MyAssignmentItem> {
    let mut items: Vec<_> = views
        .into_iter()
        .filter_map(|v| {
            let enrollment = v.enrollment?;
            if status_filter.is_some_and(|s| s != enrollment.submission_status) {
                return None;
            }
            Some(MyAssignmentItem {
                assignment: v.assignment,
                enrolled_at: enrollment.enrolled_at,
                submission_status: enrollment.submission_status,
                submitted_at: enrollment.submitted_at,
            })
        })
        .collect();

    items.sort_by(|a, b| {
        a.assignment
            .due_date
            .cmp(&b.assignment.due_date)
            .then(a.assignment.id.cmp(&b.assignment.id))
    });
    items
}

/// 学生端统计，未选作业数包含已过期的作业
pub fn compute_student_stats(views: &[StudentAssignmentView]) -> StudentDashboardStats {
    let mut stats = StudentDashboardStats::default();
    for view in views {
        match &view.enrollment {
            None => stats.available_assignments += 1,
            Some(record) => {
                stats.total_enrolled += 1;
                match record.submission_status {
                    SubmissionStatus::NotSubmitted => stats.not_submitted += 1,
                    SubmissionStatus::Submitted => stats.submitted += 1,
                }
            }
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::assignments::entities::AssignmentStatus;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn assignment(id: i64, due_date: DateTime<Utc>) -> Assignment {
        Assignment {
            id,
            title: format!("Assignment {id}"),
            description: "Read chapter one".to_string(),
            subject: "Math".to_string(),
            due_date,
            status: AssignmentStatus::Pending,
            created_by: 1,
            created_at: at(2024, 1, 1),
            updated_at: at(2024, 1, 1),
        }
    }

    fn state(due_date: DateTime<Utc>) -> AssignmentState {
        AssignmentState {
            assignment: assignment(1, due_date),
            enrollments: Enrollments::new(),
        }
    }

    #[test]
    fn test_enroll_adds_one_not_submitted_record() {
        let mut state = state(at(2099, 1, 1));
        let now = at(2025, 1, 2);

        let record = state.enroll(7, now).unwrap();

        assert_eq!(record.student_id, 7);
        assert_eq!(record.enrolled_at, now);
        assert_eq!(record.submission_status, SubmissionStatus::NotSubmitted);
        assert!(record.submitted_at.is_none());
        assert_eq!(state.enrollments.len(), 1);
        assert_eq!(state.enrollments.get(7), Some(&record));
    }

    #[test]
    fn test_enroll_twice_is_rejected() {
        let mut state = state(at(2099, 1, 1));
        state.enroll(7, at(2025, 1, 2)).unwrap();

        let err = state.enroll(7, at(2025, 1, 3)).unwrap_err();
        assert!(matches!(err, EduTaskError::AlreadyEnrolled(_)));
        assert_eq!(state.enrollments.len(), 1);
        assert!(state.enrollments.contains(7));
        assert!(!state.enrollments.contains(8));
    }

    #[test]
    fn test_enroll_past_due_is_rejected() {
        let mut state = state(at(2025, 1, 1));

        let err = state.enroll(7, at(2025, 1, 2)).unwrap_err();
        assert!(matches!(err, EduTaskError::PastDue(_)));
        assert!(state.enrollments.is_empty());
    }

    #[test]
    fn test_enroll_exactly_at_due_date_is_rejected() {
        let due = at(2025, 6, 1);
        let mut state = state(due);
        assert!(matches!(
            state.enroll(7, due).unwrap_err(),
            EduTaskError::PastDue(_)
        ));
    }

    #[test]
    fn test_duplicate_check_precedes_due_date_check() {
        let due = at(2025, 1, 1);
        let mut state = state(due);
        state.enroll(7, at(2024, 12, 1)).unwrap();

        let err = state.enroll(7, at(2025, 1, 2)).unwrap_err();
        assert!(matches!(err, EduTaskError::AlreadyEnrolled(_)));
    }

    #[test]
    fn test_enroll_leaves_assignment_fields_untouched() {
        let mut state = state(at(2099, 1, 1));
        let before = state.assignment.clone();
        state.enroll(7, at(2025, 1, 2)).unwrap();
        assert_eq!(state.assignment, before);
    }

    #[test]
    fn test_submit_without_enrollment_is_rejected() {
        let mut state = state(at(2099, 1, 1));
        let err = state.submit(7, at(2025, 1, 2)).unwrap_err();
        assert!(matches!(err, EduTaskError::NotEnrolled(_)));
    }

    #[test]
    fn test_submit_sets_timestamp_once() {
        let mut state = state(at(2099, 1, 1));
        state.enroll(7, at(2025, 1, 2)).unwrap();

        let submitted_at = at(2025, 1, 5);
        let record = state.submit(7, submitted_at).unwrap();
        assert_eq!(record.submission_status, SubmissionStatus::Submitted);
        assert_eq!(record.submitted_at, Some(submitted_at));

        let err = state.submit(7, at(2025, 1, 6)).unwrap_err();
        assert!(matches!(err, EduTaskError::AlreadySubmitted(_)));
        assert_eq!(
            state.enrollments.get(7).and_then(|r| r.submitted_at),
            Some(submitted_at)
        );
    }

    #[test]
    fn test_submit_after_due_date_is_allowed() {
        let mut state = state(at(2025, 1, 10));
        state.enroll(7, at(2025, 1, 2)).unwrap();

        let record = state.submit(7, at(2025, 2, 1)).unwrap();
        assert!(record.is_submitted());
    }

    #[test]
    fn test_lifecycle_scenario() {
        let now = at(2025, 1, 2);

        let mut expired = state(at(2025, 1, 1));
        assert!(matches!(
            expired.enroll(42, now).unwrap_err(),
            EduTaskError::PastDue(_)
        ));

        let mut open = state(at(2099, 1, 1));
        let record = open.enroll(42, now).unwrap();
        assert_eq!(record.submission_status, SubmissionStatus::NotSubmitted);
        assert_eq!(open.enrollments.len(), 1);

        let record = open.submit(42, now).unwrap();
        assert_eq!(record.submission_status, SubmissionStatus::Submitted);
        assert!(record.submitted_at.is_some());

        assert!(matches!(
            open.submit(42, now).unwrap_err(),
            EduTaskError::AlreadySubmitted(_)
        ));
    }

    #[test]
    fn test_from_iter_keeps_first_record_per_student() {
        let first = EnrollmentRecord::new(3, at(2025, 1, 1));
        let second = EnrollmentRecord::new(3, at(2025, 1, 9));
        let other = EnrollmentRecord::new(4, at(2024, 12, 31));

        let enrollments: Enrollments = vec![first.clone(), second, other.clone()]
            .into_iter()
            .collect();

        assert_eq!(enrollments.len(), 2);
        assert_eq!(enrollments.get(3), Some(&first));
        assert_eq!(enrollments.into_records(), vec![other, first]);
    }

    #[test]
    fn test_count_by_status() {
        let mut state = state(at(2099, 1, 1));
        state.enroll(1, at(2025, 1, 1)).unwrap();
        state.enroll(2, at(2025, 1, 1)).unwrap();
        state.submit(2, at(2025, 1, 2)).unwrap();

        assert_eq!(
            state.enrollments.count_by_status(SubmissionStatus::NotSubmitted),
            1
        );
        assert_eq!(
            state.enrollments.count_by_status(SubmissionStatus::Submitted),
            1
        );
    }

    fn views(now: DateTime<Utc>) -> Vec<StudentAssignmentView> {
        let mut submitted = EnrollmentRecord::new(9, at(2024, 12, 1));
        submitted.submission_status = SubmissionStatus::Submitted;
        submitted.submitted_at = Some(at(2024, 12, 2));

        vec![
            // 未选、未过期
            StudentAssignmentView {
                assignment: assignment(1, at(2099, 1, 1)),
                enrollment: None,
            },
            // 未选、已过期
            StudentAssignmentView {
                assignment: assignment(2, now - chrono::Duration::days(1)),
                enrollment: None,
            },
            // 已选、未提交
            StudentAssignmentView {
                assignment: assignment(3, at(2098, 1, 1)),
                enrollment: Some(EnrollmentRecord::new(9, at(2024, 12, 1))),
            },
            // 已选、已提交
            StudentAssignmentView {
                assignment: assignment(4, at(2097, 1, 1)),
                enrollment: Some(submitted),
            },
        ]
    }

    #[test]
    fn test_available_excludes_enrolled_and_expired() {
        let now = at(2025, 1, 2);
        let items = compute_available_assignments(views(now), now, false);

        let ids: Vec<_> = items.iter().map(|i| i.assignment.id).collect();
        assert_eq!(ids, vec![1]);
        assert!(items.iter().all(|i| !i.is_expired));
        assert!(items.iter().all(|i| i.assignment.due_date >= now));
    }

    #[test]
    fn test_available_with_expired_flags_them() {
        let now = at(2025, 1, 2);
        let items = compute_available_assignments(views(now), now, true);

        let ids: Vec<_> = items.iter().map(|i| i.assignment.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert!(items[0].is_expired);
        assert!(!items[1].is_expired);
    }

    #[test]
    fn test_my_assignments_merges_enrollment_fields() {
        let now = at(2025, 1, 2);
        let items = compute_my_assignments(views(now), None);

        let ids: Vec<_> = items.iter().map(|i| i.assignment.id).collect();
        assert_eq!(ids, vec![4, 3]);
        assert_eq!(items[0].submission_status, SubmissionStatus::Submitted);
        assert!(items[0].submitted_at.is_some());
        assert_eq!(items[1].enrolled_at, at(2024, 12, 1));
    }

    #[test]
    fn test_my_assignments_status_filter() {
        let now = at(2025, 1, 2);
        let items = compute_my_assignments(views(now), Some(SubmissionStatus::NotSubmitted));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].assignment.id, 3);
    }

    #[test]
    fn test_detail_view_flags_enrollment() {
        let now = at(2025, 1, 2);
        let mut all = views(now);
        let enrolled = all.remove(2).into_detail();
        assert!(enrolled.is_enrolled);
        assert_eq!(enrolled.enrollment.map(|e| e.student_id), Some(9));

        let open = all.remove(0).into_detail();
        assert!(!open.is_enrolled);
        assert!(open.enrollment.is_none());
    }

    #[test]
    fn test_student_stats_counts_expired_as_available() {
        let now = at(2025, 1, 2);
        let stats = compute_student_stats(&views(now));
        assert_eq!(
            stats,
            StudentDashboardStats {
                total_enrolled: 2,
                available_assignments: 2,
                not_submitted: 1,
                submitted: 1,
            }
        );
    }
}
