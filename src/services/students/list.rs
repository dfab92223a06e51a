use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::error;

use super::StudentService;
use crate::errors::Result;
use crate::models::ApiResponse;
use crate::models::users::{
    entities::{Caller, UserRole},
    requests::{StudentListParams, StudentListQuery},
    responses::StudentListResponse,
};
use crate::services::{current_caller, error_response};
use crate::storage::Storage;

/// 分页列出学生，`search` 对姓名和邮箱做不区分大小写的子串匹配
pub async fn list_students(
    storage: &dyn Storage,
    caller: &Caller,
    query: StudentListQuery,
) -> Result<StudentListResponse> {
    caller.require(UserRole::Admin)?;
    storage.list_students_with_pagination(query).await
}

pub async fn handle_list_students(
    service: &StudentService,
    request: &HttpRequest,
    query: StudentListParams,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let caller = current_caller(request)?;

    match list_students(storage.as_ref(), &caller, query.into()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "Student list retrieved successfully",
        ))),
        Err(e) => {
            if e.is_store_failure() {
                error!("Failed to list students: {}", e);
            }
            Ok(error_response(&e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::sea_orm_storage::{SeaOrmStorage, fixtures};

    #[tokio::test]
    async fn test_search_matches_name_case_insensitively() {
        let storage = SeaOrmStorage::in_memory().await.unwrap();
        let admin = fixtures::user(&storage, "Admin", UserRole::Admin).await;
        fixtures::user(&storage, "Alice", UserRole::Student).await;
        fixtures::user(&storage, "Bob", UserRole::Student).await;

        let query = StudentListQuery {
            search: Some("ALI".to_string()),
            ..Default::default()
        };
        let response = list_students(&storage, &admin.caller(), query).await.unwrap();
        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].name, "Alice");

        let all = list_students(&storage, &admin.caller(), StudentListQuery::default())
            .await
            .unwrap();
        assert_eq!(all.items.len(), 2);
    }
}
