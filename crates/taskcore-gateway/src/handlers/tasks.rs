//! `/tasks` handlers (spec §6).

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use taskcore_kernel::domain::{Constraints, Task, TaskId, TaskOwner, TaskStatus};
use taskcore_kernel::error::TaskCoreError;
use taskcore_kernel::traits::{AuthenticatedUser, TaskFilter};

use crate::error::ApiError;
use crate::state::AppState;

pub(crate) fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError(TaskCoreError::Unauthorized("missing bearer token".to_string())))
}

pub(crate) async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<AuthenticatedUser, ApiError> {
    let token = bearer_token(headers)?;
    Ok(state.auth.authenticate(token).await?)
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub goal: String,
    #[serde(default)]
    pub constraints: Option<Constraints>,
    #[serde(default)]
    pub auto_start: bool,
    #[serde(default)]
    pub metadata: Option<std::collections::HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub task: Task,
}

pub async fn create_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskResponse>), ApiError> {
    let user = authenticate(&state, &headers).await?;
    if body.goal.trim().is_empty() {
        return Err(ApiError(TaskCoreError::invalid_input("goal must not be empty")));
    }

    let owner = TaskOwner { user_id: user.user_id, organization_id: user.organization_id };
    let task = state
        .use_cases
        .create_task(owner, body.goal, body.constraints.unwrap_or_default(), body.auto_start)
        .await?;

    let task = if let Some(metadata) = body.metadata {
        state
            .store
            .update_task(&task.id, task.version, taskcore_kernel::traits::TaskPatch { metadata: Some(metadata), ..Default::default() })
            .await?
    } else {
        task
    };

    Ok((StatusCode::CREATED, Json(TaskResponse { task })))
}

pub async fn get_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(task_id): Path<TaskId>,
) -> Result<Json<TaskResponse>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let task = state.store.get_task(&task_id).await?;
    state.auth.authorize_task_access(&user, &task.owner.organization_id).map_err(|_| TaskCoreError::not_found(format!("task {task_id}")))?;
    Ok(Json(TaskResponse { task }))
}

pub async fn cancel_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(task_id): Path<TaskId>,
) -> Result<(StatusCode, Json<TaskResponse>), ApiError> {
    let user = authenticate(&state, &headers).await?;
    let existing = state.store.get_task(&task_id).await?;
    state
        .auth
        .authorize_task_access(&user, &existing.owner.organization_id)
        .map_err(|_| TaskCoreError::not_found(format!("task {task_id}")))?;

    let task = state.use_cases.cancel_task(&task_id).await?;
    Ok((StatusCode::ACCEPTED, Json(TaskResponse { task })))
}

#[derive(Debug, Deserialize)]
pub struct ListTasksQuery {
    pub status: Option<String>,
    pub tree_id: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ListTasksResponse {
    pub items: Vec<Task>,
    pub next_cursor: Option<usize>,
}

fn parse_status(raw: &str) -> Result<TaskStatus, ApiError> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .map_err(|_| ApiError(TaskCoreError::invalid_input(format!("unknown task status {raw}"))))
}

pub async fn list_tasks(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListTasksQuery>,
) -> Result<Json<ListTasksResponse>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let status = query.status.as_deref().map(parse_status).transpose()?;
    let limit = query.limit;
    let offset = query.offset.unwrap_or(0);

    let filter = TaskFilter {
        organization_id: Some(user.organization_id),
        user_id: None,
        status,
        tree_id: query.tree_id,
        limit: limit.map(|l| l + 1),
        offset: Some(offset),
    };
    let mut items = state.store.list_tasks(filter).await?;

    let next_cursor = match limit {
        Some(limit) if items.len() > limit => {
            items.truncate(limit);
            Some(offset + limit)
        }
        _ => None,
    };

    Ok(Json(ListTasksResponse { items, next_cursor }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_requires_the_bearer_prefix() {
        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::AUTHORIZATION, "Basic abc".parse().unwrap());
        assert!(bearer_token(&headers).is_err());

        headers.insert(axum::http::header::AUTHORIZATION, "Bearer u1:org1".parse().unwrap());
        assert_eq!(bearer_token(&headers).unwrap(), "u1:org1");
    }

    #[test]
    fn parse_status_accepts_screaming_snake_case() {
        assert_eq!(parse_status("RUNNING").unwrap(), TaskStatus::Running);
        assert!(parse_status("not-a-status").is_err());
    }
}
