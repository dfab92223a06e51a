//! 选课记录实体
//!
//! (assignment_id, student_id) 上有唯一索引。

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "enrollments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub assignment_id: i64,
    pub student_id: i64,
    pub enrolled_at: i64,
    pub submission_status: String,
    pub submitted_at: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::assignments::Entity",
        from = "Column::AssignmentId",
        to = "super::assignments::Column::Id",
        on_delete = "Cascade"
    )]
    Assignment,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::StudentId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    Student,
}

impl Related<super::assignments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignment.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_record(self) -> crate::models::assignments::entities::EnrollmentRecord {
        use super::from_timestamp;
        use crate::models::assignments::entities::{EnrollmentRecord, SubmissionStatus};

        EnrollmentRecord {
            student_id: self.student_id,
            enrolled_at: from_timestamp(self.enrolled_at),
            submission_status: self
                .submission_status
                .parse::<SubmissionStatus>()
                .unwrap_or(SubmissionStatus::NotSubmitted),
            submitted_at: self.submitted_at.map(from_timestamp),
        }
    }
}
