//! `/tasks/{id}/checkpoints` and checkpoint-resolution handlers (spec §6).

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use taskcore_kernel::domain::{Checkpoint, CheckpointDecision, CheckpointResponse, Task, TaskId};
use taskcore_kernel::error::TaskCoreError;

use super::tasks::authenticate;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PendingCheckpointsResponse {
    pub items: Vec<Checkpoint>,
}

pub async fn pending_checkpoints(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(task_id): Path<TaskId>,
) -> Result<Json<PendingCheckpointsResponse>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let task = state.store.get_task(&task_id).await?;
    state.auth.authorize_task_access(&user, &task.owner.organization_id).map_err(|_| TaskCoreError::not_found(format!("task {task_id}")))?;

    let items = state.checkpoints.get_pending(&task_id).await?;
    Ok(Json(PendingCheckpointsResponse { items }))
}

#[derive(Debug, Deserialize)]
pub struct ResolveCheckpointRequest {
    pub decision: CheckpointDecision,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub inputs: Option<std::collections::HashMap<String, serde_json::Value>>,
    #[serde(default)]
    pub modified_inputs: Option<std::collections::HashMap<String, serde_json::Value>>,
    #[serde(default)]
    pub selected_alternative: Option<serde_json::Value>,
    #[serde(default)]
    pub answers: Option<std::collections::HashMap<String, serde_json::Value>>,
    #[serde(default)]
    pub learn: bool,
}

#[derive(Debug, Serialize)]
pub struct ResolveCheckpointResponse {
    pub checkpoint: Checkpoint,
    pub task: Task,
}

pub async fn resolve_checkpoint(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((task_id, step_id)): Path<(TaskId, String)>,
    Json(body): Json<ResolveCheckpointRequest>,
) -> Result<Json<ResolveCheckpointResponse>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let existing = state.store.get_task(&task_id).await?;
    state
        .auth
        .authorize_task_access(&user, &existing.owner.organization_id)
        .map_err(|_| TaskCoreError::not_found(format!("task {task_id}")))?;

    let response = CheckpointResponse {
        feedback: body.feedback,
        inputs: body.inputs,
        modified_inputs: body.modified_inputs,
        selected_alternative: body.selected_alternative,
        answers: body.answers,
        learn: body.learn,
    };

    let task = state
        .use_cases
        .resume_checkpoint(&task_id, &step_id, body.decision, Some(response), Some(user.user_id))
        .await?;
    let checkpoint = state
        .checkpoints
        .get_resolution(&task_id, &step_id)
        .await?
        .ok_or_else(|| TaskCoreError::not_found(format!("checkpoint for step {step_id}")))?;

    Ok(Json(ResolveCheckpointResponse { checkpoint, task }))
}
