use super::{SeaOrmStorage, is_unique_violation};
use crate::entity::assignments::{Column as AssignmentColumn, Entity as Assignments};
use crate::entity::enrollments::{ActiveModel, Column, Entity as Enrollments};
use crate::errors::{EduTaskError, Result};
use crate::models::assignments::{
    entities::{EnrollmentRecord, SubmissionStatus},
    requests::StudentAssignmentFilter,
    responses::EnrollmentListItem,
    rules::{MSG_ALREADY_ENROLLED, StudentAssignmentView},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    sea_query::Expr,
};
use std::collections::HashMap;

impl SeaOrmStorage {
    /// 插入选课记录
    ///
    /// (assignment_id, student_id) 唯一索引冲突时返回 AlreadyEnrolled，
    /// 并发的重复选课由数据库裁决。
    pub async fn insert_enrollment_impl(
        &self,
        assignment_id: i64,
        record: &EnrollmentRecord,
    ) -> Result<EnrollmentRecord> {
        let model = ActiveModel {
            assignment_id: Set(assignment_id),
            student_id: Set(record.student_id),
            enrolled_at: Set(record.enrolled_at.timestamp()),
            submission_status: Set(record.submission_status.to_string()),
            submitted_at: Set(record.submitted_at.map(|t| t.timestamp())),
            ..Default::default()
        };

        let result = model.insert(&self.db).await.map_err(|e| {
            if is_unique_violation(&e) {
                EduTaskError::already_enrolled(MSG_ALREADY_ENROLLED)
            } else {
                EduTaskError::database_operation(format!("创建选课记录失败: {e}"))
            }
        })?;

        Ok(result.into_record())
    }

    /// 条件更新：仅当记录仍为 not_submitted 时写入提交状态和时间
    pub async fn mark_enrollment_submitted_impl(
        &self,
        assignment_id: i64,
        student_id: i64,
        submitted_at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = Enrollments::update_many()
            .col_expr(
                Column::SubmissionStatus,
                Expr::value(SubmissionStatus::Submitted.to_string()),
            )
            .col_expr(Column::SubmittedAt, Expr::value(submitted_at.timestamp()))
            .filter(Column::AssignmentId.eq(assignment_id))
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::SubmissionStatus.eq(SubmissionStatus::NotSubmitted.to_string()))
            .exec(&self.db)
            .await
            .map_err(|e| EduTaskError::database_operation(format!("更新提交状态失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 学生视角的作业列表：每份作业附带该学生的选课记录（若有）
    pub async fn list_assignments_for_student_impl(
        &self,
        student_id: i64,
        filter: StudentAssignmentFilter,
    ) -> Result<Vec<StudentAssignmentView>> {
        let mut select = Assignments::find();

        if let Some(ref subject) = filter.subject
            && !subject.trim().is_empty()
        {
            select = select.filter(AssignmentColumn::Subject.eq(subject.trim()));
        }

        if let Some(status) = filter.status {
            select = select.filter(AssignmentColumn::Status.eq(status.to_string()));
        }

        let assignments = select
            .order_by_asc(AssignmentColumn::DueDate)
            .order_by_asc(AssignmentColumn::Id)
            .all(&self.db)
            .await
            .map_err(|e| EduTaskError::database_operation(format!("查询作业列表失败: {e}")))?;

        let mut records: HashMap<i64, EnrollmentRecord> = Enrollments::find()
            .filter(Column::StudentId.eq(student_id))
            .all(&self.db)
            .await
            .map_err(|e| EduTaskError::database_operation(format!("查询选课记录失败: {e}")))?
            .into_iter()
            .map(|m| (m.assignment_id, m.into_record()))
            .collect();

        Ok(assignments
            .into_iter()
            .map(|m| StudentAssignmentView {
                enrollment: records.remove(&m.id),
                assignment: m.into_assignment(),
            })
            .collect())
    }

    /// 学生视角的单个作业
    pub async fn get_assignment_for_student_impl(
        &self,
        assignment_id: i64,
        student_id: i64,
    ) -> Result<Option<StudentAssignmentView>> {
        let Some(assignment) = self.get_assignment_by_id_impl(assignment_id).await? else {
            return Ok(None);
        };

        let enrollment = Enrollments::find()
            .filter(Column::AssignmentId.eq(assignment_id))
            .filter(Column::StudentId.eq(student_id))
            .one(&self.db)
            .await
            .map_err(|e| EduTaskError::database_operation(format!("查询选课记录失败: {e}")))?;

        Ok(Some(StudentAssignmentView {
            assignment,
            enrollment: enrollment.map(|m| m.into_record()),
        }))
    }

    /// 跨作业展开全部选课记录，最新创建的作业在前
    pub async fn list_enrollments_impl(&self) -> Result<Vec<EnrollmentListItem>> {
        let assignments = Assignments::find()
            .order_by_desc(AssignmentColumn::CreatedAt)
            .order_by_desc(AssignmentColumn::Id)
            .all(&self.db)
            .await
            .map_err(|e| EduTaskError::database_operation(format!("查询作业列表失败: {e}")))?;

        let records = Enrollments::find()
            .order_by_asc(Column::EnrolledAt)
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| EduTaskError::database_operation(format!("查询选课记录失败: {e}")))?;

        let mut student_ids: Vec<i64> = records.iter().map(|m| m.student_id).collect();
        student_ids.sort_unstable();
        student_ids.dedup();
        let students = self.get_users_by_ids(student_ids).await?;

        let mut by_assignment: HashMap<i64, Vec<_>> = HashMap::new();
        for record in records {
            by_assignment
                .entry(record.assignment_id)
                .or_default()
                .push(record);
        }

        let mut items = Vec::new();
        for assignment in assignments {
            let Some(records) = by_assignment.remove(&assignment.id) else {
                continue;
            };
            let assignment = assignment.into_assignment();
            for model in records {
                let Some(student) = students.get(&model.student_id) else {
                    continue;
                };
                let record = model.into_record();
                items.push(EnrollmentListItem {
                    assignment_id: assignment.id,
                    assignment_title: assignment.title.clone(),
                    subject: assignment.subject.clone(),
                    due_date: assignment.due_date,
                    student_id: student.id,
                    student_name: student.name.clone(),
                    student_email: student.email.clone(),
                    enrolled_at: record.enrolled_at,
                    submission_status: record.submission_status,
                    submitted_at: record.submitted_at,
                });
            }
        }

        Ok(items)
    }

    /// 统计选课记录数量
    pub async fn count_enrollments_impl(&self) -> Result<u64> {
        Enrollments::find()
            .count(&self.db)
            .await
            .map_err(|e| EduTaskError::database_operation(format!("统计选课记录失败: {e}")))
    }
}
