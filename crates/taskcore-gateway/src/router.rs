//! Router assembly, grounded on the teacher's `mofa-gateway::server` router
//! (state + route table + tower-http trace/CORS layers).

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{capabilities, checkpoints, events, tasks};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/tasks", post(tasks::create_task).get(tasks::list_tasks))
        .route("/tasks/{id}", get(tasks::get_task))
        .route("/tasks/{id}/cancel", post(tasks::cancel_task))
        .route("/tasks/{id}/checkpoints/pending", get(checkpoints::pending_checkpoints))
        .route("/tasks/{id}/steps/{step_id}/checkpoint/resolve", post(checkpoints::resolve_checkpoint))
        .route("/tasks/{id}/events", get(events::task_events))
        .route("/capabilities/plugins", get(capabilities::list_plugins))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
