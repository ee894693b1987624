use uuid::Uuid;
use validator::Validate;

use crate::api::gateway::ApiGateway;
use crate::error::ApiError;
use crate::models::{Task, TaskCreate, TaskQuery, TaskUpdate};

/// List the current user's tasks, optionally paginated and filtered by completion.
pub async fn list_tasks(gateway: &ApiGateway, query: &TaskQuery) -> Result<Vec<Task>, ApiError> {
    gateway
        .get(&format!("/tasks/{}", query.to_query_string()))
        .await
}

pub async fn get_task(gateway: &ApiGateway, task_id: Uuid) -> Result<Task, ApiError> {
    gateway.get(&format!("/tasks/{}", task_id)).await
}

/// Create a task. The input is validated before anything is sent.
pub async fn create_task(gateway: &ApiGateway, data: &TaskCreate) -> Result<Task, ApiError> {
    data.validate()?;
    gateway.post("/tasks/", data).await
}

/// Update a task. The input is validated before anything is sent.
pub async fn update_task(
    gateway: &ApiGateway,
    task_id: Uuid,
    data: &TaskUpdate,
) -> Result<Task, ApiError> {
    data.validate()?;
    gateway.put(&format!("/tasks/{}", task_id), data).await
}

pub async fn delete_task(gateway: &ApiGateway, task_id: Uuid) -> Result<(), ApiError> {
    gateway.delete(&format!("/tasks/{}", task_id)).await
}
