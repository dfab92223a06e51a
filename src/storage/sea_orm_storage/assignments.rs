use super::SeaOrmStorage;
use crate::entity::assignments::{ActiveModel, Column, Entity as Assignments};
use crate::entity::enrollments::{Column as EnrollmentColumn, Entity as Enrollments};
use crate::errors::{EduTaskError, Result};
use crate::models::{
    PaginationInfo,
    assignments::{
        entities::{Assignment, AssignmentStatus},
        requests::{AssignmentChanges, AssignmentListQuery, NewAssignment},
        responses::{
            AssignmentCreator, AssignmentDetail, AssignmentListItem, AssignmentListResponse,
        },
        rules::AssignmentState,
    },
    users::entities::User,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use std::collections::HashMap;

fn creator_of(user: &User) -> AssignmentCreator {
    AssignmentCreator {
        id: user.id,
        name: user.name.clone(),
        email: user.email.clone(),
    }
}

impl SeaOrmStorage {
    /// 创建作业
    pub async fn create_assignment_impl(
        &self,
        created_by: i64,
        req: NewAssignment,
    ) -> Result<Assignment> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            title: Set(req.title),
            description: Set(req.description),
            subject: Set(req.subject),
            due_date: Set(req.due_date.timestamp()),
            status: Set(AssignmentStatus::Pending.to_string()),
            created_by: Set(created_by),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| EduTaskError::database_operation(format!("创建作业失败: {e}")))?;

        Ok(result.into_assignment())
    }

    /// 通过 ID 获取作业
    pub async fn get_assignment_by_id_impl(&self, id: i64) -> Result<Option<Assignment>> {
        let result = Assignments::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| EduTaskError::database_operation(format!("查询作业失败: {e}")))?;

        Ok(result.map(|m| m.into_assignment()))
    }

    /// 作业及其全部选课记录
    pub async fn get_assignment_state_impl(&self, id: i64) -> Result<Option<AssignmentState>> {
        let Some(assignment) = self.get_assignment_by_id_impl(id).await? else {
            return Ok(None);
        };

        let records = Enrollments::find()
            .filter(EnrollmentColumn::AssignmentId.eq(id))
            .order_by_asc(EnrollmentColumn::EnrolledAt)
            .all(&self.db)
            .await
            .map_err(|e| EduTaskError::database_operation(format!("查询选课记录失败: {e}")))?;

        Ok(Some(AssignmentState {
            assignment,
            enrollments: records.into_iter().map(|m| m.into_record()).collect(),
        }))
    }

    /// 作业详情（管理端）
    pub async fn get_assignment_detail_impl(&self, id: i64) -> Result<Option<AssignmentDetail>> {
        let Some(state) = self.get_assignment_state_impl(id).await? else {
            return Ok(None);
        };

        let creators = self
            .get_users_by_ids(vec![state.assignment.created_by])
            .await?;
        let creator = creators.get(&state.assignment.created_by).map(creator_of);

        Ok(Some(AssignmentDetail {
            assignment: state.assignment,
            creator,
            enrollments: state.enrollments.into_records(),
        }))
    }

    /// 分页列出作业，最新创建的在前
    pub async fn list_assignments_with_pagination_impl(
        &self,
        query: AssignmentListQuery,
    ) -> Result<AssignmentListResponse> {
        let (page, size) = query.pagination.normalized();

        let mut select = Assignments::find();

        if let Some(status) = query.status {
            select = select.filter(Column::Status.eq(status.to_string()));
        }

        if let Some(ref subject) = query.subject
            && !subject.trim().is_empty()
        {
            select = select.filter(Column::Subject.eq(subject.trim()));
        }

        let paginator = select
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .paginate(&self.db, size);

        let total = paginator
            .num_items()
            .await
            .map_err(|e| EduTaskError::database_operation(format!("查询作业总数失败: {e}")))?;

        let assignments = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| EduTaskError::database_operation(format!("查询作业列表失败: {e}")))?;

        let ids: Vec<i64> = assignments.iter().map(|m| m.id).collect();
        let mut creator_ids: Vec<i64> = assignments.iter().map(|m| m.created_by).collect();
        creator_ids.sort_unstable();
        creator_ids.dedup();

        let counts = self.count_enrollments_by_assignment(&ids).await?;
        let creators = self.get_users_by_ids(creator_ids).await?;

        let items = assignments
            .into_iter()
            .map(|m| {
                let enrollment_count = counts.get(&m.id).copied().unwrap_or(0);
                let assignment = m.into_assignment();
                AssignmentListItem {
                    creator: creators.get(&assignment.created_by).map(creator_of),
                    assignment,
                    enrollment_count,
                }
            })
            .collect();

        Ok(AssignmentListResponse {
            items,
            pagination: PaginationInfo::new(page, size, total),
        })
    }

    /// 更新作业，截止时间不可修改
    pub async fn update_assignment_impl(
        &self,
        id: i64,
        changes: AssignmentChanges,
    ) -> Result<Option<Assignment>> {
        if self.get_assignment_by_id_impl(id).await?.is_none() {
            return Ok(None);
        }

        let mut model = ActiveModel {
            id: Set(id),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        if let Some(title) = changes.title {
            model.title = Set(title);
        }

        if let Some(description) = changes.description {
            model.description = Set(description);
        }

        if let Some(subject) = changes.subject {
            model.subject = Set(subject);
        }

        if let Some(status) = changes.status {
            model.status = Set(status.to_string());
        }

        model
            .update(&self.db)
            .await
            .map_err(|e| EduTaskError::database_operation(format!("更新作业失败: {e}")))?;

        self.get_assignment_by_id_impl(id).await
    }

    /// 删除作业，同一事务内先删除其选课记录
    pub async fn delete_assignment_impl(&self, id: i64) -> Result<bool> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| EduTaskError::database_operation(format!("开启事务失败: {e}")))?;

        Enrollments::delete_many()
            .filter(EnrollmentColumn::AssignmentId.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| EduTaskError::database_operation(format!("删除选课记录失败: {e}")))?;

        let result = Assignments::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(|e| EduTaskError::database_operation(format!("删除作业失败: {e}")))?;

        txn.commit()
            .await
            .map_err(|e| EduTaskError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 统计作业数量
    pub async fn count_assignments_impl(&self, status: Option<AssignmentStatus>) -> Result<u64> {
        let mut select = Assignments::find();
        if let Some(status) = status {
            select = select.filter(Column::Status.eq(status.to_string()));
        }

        select
            .count(&self.db)
            .await
            .map_err(|e| EduTaskError::database_operation(format!("统计作业数量失败: {e}")))
    }

    /// 按作业统计选课数
    async fn count_enrollments_by_assignment(
        &self,
        assignment_ids: &[i64],
    ) -> Result<HashMap<i64, i64>> {
        if assignment_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(i64, i64)> = Enrollments::find()
            .select_only()
            .column(EnrollmentColumn::AssignmentId)
            .column_as(EnrollmentColumn::Id.count(), "count")
            .filter(EnrollmentColumn::AssignmentId.is_in(assignment_ids.to_vec()))
            .group_by(EnrollmentColumn::AssignmentId)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| EduTaskError::database_operation(format!("统计选课数失败: {e}")))?;

        Ok(rows.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{assignment, at, user};
    use super::*;
    use crate::models::assignments::entities::EnrollmentRecord;
    use crate::models::users::entities::UserRole;
    use crate::storage::Storage;

    #[tokio::test]
    async fn test_create_and_get_assignment() {
        let storage = SeaOrmStorage::in_memory().await.unwrap();
        let admin = user(&storage, "Admin", UserRole::Admin).await;

        let created = assignment(&storage, admin.id, "Essay", "History", at(2099, 1, 1)).await;
        assert_eq!(created.status, AssignmentStatus::Pending);
        assert_eq!(created.created_by, admin.id);

        let loaded = storage
            .get_assignment_by_id(created.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded, created);
        assert_eq!(loaded.due_date, at(2099, 1, 1));
        assert!(storage.get_assignment_by_id(9999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_filters_and_counts() {
        let storage = SeaOrmStorage::in_memory().await.unwrap();
        let admin = user(&storage, "Admin", UserRole::Admin).await;
        let student = user(&storage, "Alice", UserRole::Student).await;

        let math = assignment(&storage, admin.id, "Algebra", "Math", at(2099, 1, 1)).await;
        let history = assignment(&storage, admin.id, "Essay", "History", at(2099, 1, 1)).await;
        storage
            .update_assignment(
                history.id,
                AssignmentChanges {
                    status: Some(AssignmentStatus::Completed),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        storage
            .insert_enrollment(math.id, &EnrollmentRecord::new(student.id, at(2025, 1, 1)))
            .await
            .unwrap();

        let all = storage
            .list_assignments_with_pagination(AssignmentListQuery::default())
            .await
            .unwrap();
        assert_eq!(all.pagination.total, 2);
        // 最新创建的在前
        assert_eq!(all.items[0].assignment.id, history.id);
        let math_item = all
            .items
            .iter()
            .find(|i| i.assignment.id == math.id)
            .unwrap();
        assert_eq!(math_item.enrollment_count, 1);
        assert_eq!(math_item.creator.as_ref().map(|c| c.id), Some(admin.id));

        let completed = storage
            .list_assignments_with_pagination(AssignmentListQuery {
                status: Some(AssignmentStatus::Completed),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(completed.items.len(), 1);
        assert_eq!(completed.items[0].assignment.id, history.id);

        let by_subject = storage
            .list_assignments_with_pagination(AssignmentListQuery {
                subject: Some("Math".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_subject.items.len(), 1);

        assert_eq!(storage.count_assignments(None).await.unwrap(), 2);
        assert_eq!(
            storage
                .count_assignments(Some(AssignmentStatus::Pending))
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_update_changes_only_given_fields() {
        let storage = SeaOrmStorage::in_memory().await.unwrap();
        let admin = user(&storage, "Admin", UserRole::Admin).await;
        let created = assignment(&storage, admin.id, "Essay", "History", at(2099, 1, 1)).await;

        let updated = storage
            .update_assignment(
                created.id,
                AssignmentChanges {
                    title: Some("Long essay".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "Long essay");
        assert_eq!(updated.subject, "History");
        assert_eq!(updated.due_date, created.due_date);

        assert!(
            storage
                .update_assignment(9999, AssignmentChanges::default())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_delete_cascades_to_enrollments() {
        let storage = SeaOrmStorage::in_memory().await.unwrap();
        let admin = user(&storage, "Admin", UserRole::Admin).await;
        let student = user(&storage, "Alice", UserRole::Student).await;
        let created = assignment(&storage, admin.id, "Essay", "History", at(2099, 1, 1)).await;
        storage
            .insert_enrollment(created.id, &EnrollmentRecord::new(student.id, at(2025, 1, 1)))
            .await
            .unwrap();

        assert!(storage.delete_assignment(created.id).await.unwrap());
        assert!(storage.get_assignment_by_id(created.id).await.unwrap().is_none());
        assert_eq!(storage.count_enrollments().await.unwrap(), 0);
        assert!(!storage.delete_assignment(created.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_detail_includes_creator_and_records() {
        let storage = SeaOrmStorage::in_memory().await.unwrap();
        let admin = user(&storage, "Admin", UserRole::Admin).await;
        let alice = user(&storage, "Alice", UserRole::Student).await;
        let bob = user(&storage, "Bob", UserRole::Student).await;
        let created = assignment(&storage, admin.id, "Essay", "History", at(2099, 1, 1)).await;

        storage
            .insert_enrollment(created.id, &EnrollmentRecord::new(bob.id, at(2025, 1, 2)))
            .await
            .unwrap();
        storage
            .insert_enrollment(created.id, &EnrollmentRecord::new(alice.id, at(2025, 1, 1)))
            .await
            .unwrap();

        let detail = storage
            .get_assignment_detail(created.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(detail.creator.map(|c| c.email), Some(admin.email));
        let students: Vec<_> = detail.enrollments.iter().map(|r| r.student_id).collect();
        assert_eq!(students, vec![alice.id, bob.id]);
    }
}
