//! End-to-end HTTP surface tests, grounded on `iridite-tandem`'s
//! `tandem-server/src/http.rs` oneshot-request test style.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use taskcore_foundation::{
    with_builtin_plugins, DefaultStepDispatcher, InMemoryCheckpointManager, InMemoryEventBus, InMemoryTaskStore, LlmPlanner,
    TaskOrchestrator, TokioScheduler, UseCases,
};
use taskcore_gateway::auth::StaticTokenAuthProvider;
use taskcore_gateway::{build_router, AppState};
use taskcore_kernel::traits::{AuthProvider, CheckpointManager, EventBus, Orchestrator, Planner, Scheduler, TaskStore};
use tower::ServiceExt;

fn wiring() -> AppState {
    let store: Arc<dyn TaskStore> = Arc::new(InMemoryTaskStore::new(Duration::from_secs(600)));
    let bus: Arc<dyn EventBus> = Arc::new(InMemoryEventBus::new(1000));
    let checkpoints: Arc<dyn CheckpointManager> = Arc::new(InMemoryCheckpointManager::new(store.clone(), 86_400));
    let plugins = Arc::new(with_builtin_plugins(Arc::new(taskcore_foundation::plugins::RecordingNotificationProvider::new())));
    let files = Arc::new(taskcore_foundation::dispatcher::StubFileService::new());
    let dispatcher = Arc::new(DefaultStepDispatcher::new(plugins.clone(), checkpoints.clone(), None, files, Vec::new()));
    let scheduler: Arc<dyn Scheduler> = Arc::new(TokioScheduler::new(dispatcher, bus.clone(), 4));
    let llm = Arc::new(taskcore_foundation::planner::StaticLLMProvider::new(
        r#"[{"id": "s1", "name": "notify", "kind": "plugin", "plugin_namespace": "send_email", "depends_on": [], "inputs": {"to": "ops@example.com"}}]"#,
    ));
    let planner: Arc<dyn Planner> = Arc::new(LlmPlanner::new(llm, 2));
    let orchestrator: Arc<dyn Orchestrator> = Arc::new(TaskOrchestrator::new(store.clone(), bus.clone(), planner, scheduler, checkpoints.clone(), 2));
    let use_cases = Arc::new(UseCases::new(store.clone(), orchestrator, checkpoints.clone()));
    let auth: Arc<dyn AuthProvider> = Arc::new(StaticTokenAuthProvider::new());

    AppState { store, bus, checkpoints, plugins, auth, use_cases }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn create_task_without_auth_is_rejected() {
    let app = build_router(wiring());
    let request = Request::post("/tasks")
        .header("content-type", "application/json")
        .body(Body::from(json!({"goal": "do a thing"}).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_task_then_get_it_back() {
    let app = build_router(wiring());
    let request = Request::post("/tasks")
        .header("content-type", "application/json")
        .header("authorization", "Bearer u1:org1")
        .body(Body::from(json!({"goal": "do a thing", "auto_start": false}).to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    let task_id = created["task"]["id"].as_str().unwrap().to_string();
    assert_eq!(created["task"]["status"], json!("DRAFT"));

    let request = Request::get(format!("/tasks/{task_id}")).header("authorization", "Bearer u1:org1").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = body_json(response).await;
    assert_eq!(fetched["task"]["id"], json!(task_id));
}

#[tokio::test]
async fn get_task_owned_by_another_org_is_not_found() {
    let state = wiring();
    let app = build_router(state.clone());

    let request = Request::post("/tasks")
        .header("content-type", "application/json")
        .header("authorization", "Bearer u1:org1")
        .body(Body::from(json!({"goal": "secret"}).to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let created = body_json(response).await;
    let task_id = created["task"]["id"].as_str().unwrap().to_string();

    let request = Request::get(format!("/tasks/{task_id}")).header("authorization", "Bearer u2:org2").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cancel_task_returns_202_and_marks_it_cancelled() {
    let app = build_router(wiring());
    let request = Request::post("/tasks")
        .header("content-type", "application/json")
        .header("authorization", "Bearer u1:org1")
        .body(Body::from(json!({"goal": "do a thing"}).to_string()))
        .unwrap();
    let created = body_json(app.clone().oneshot(request).await.unwrap()).await;
    let task_id = created["task"]["id"].as_str().unwrap().to_string();

    let request =
        Request::post(format!("/tasks/{task_id}/cancel")).header("authorization", "Bearer u1:org1").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = body_json(response).await;
    assert_eq!(body["task"]["status"], json!("CANCELLED"));
}

#[tokio::test]
async fn checkpoint_approval_flow_completes_the_task() {
    let app = build_router(wiring());
    let request = Request::post("/tasks")
        .header("content-type", "application/json")
        .header("authorization", "Bearer u1:org1")
        .body(Body::from(json!({"goal": "notify ops", "auto_start": true}).to_string()))
        .unwrap();
    let created = body_json(app.clone().oneshot(request).await.unwrap()).await;
    let task_id = created["task"]["id"].as_str().unwrap().to_string();
    assert_eq!(created["task"]["status"], json!("WAITING_APPROVAL"));

    let request = Request::get(format!("/tasks/{task_id}/checkpoints/pending"))
        .header("authorization", "Bearer u1:org1")
        .body(Body::empty())
        .unwrap();
    let pending = body_json(app.clone().oneshot(request).await.unwrap()).await;
    assert_eq!(pending["items"].as_array().unwrap().len(), 1);
    let step_id = pending["items"][0]["step_id"].as_str().unwrap().to_string();

    let request = Request::post(format!("/tasks/{task_id}/steps/{step_id}/checkpoint/resolve"))
        .header("content-type", "application/json")
        .header("authorization", "Bearer u1:org1")
        .body(Body::from(json!({"decision": "approved"}).to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let resolved = body_json(response).await;
    assert_eq!(resolved["task"]["status"], json!("COMPLETED"));
    assert_eq!(resolved["checkpoint"]["decision"], json!("approved"));
}

#[tokio::test]
async fn capabilities_lists_the_builtin_plugins() {
    let app = build_router(wiring());
    let request = Request::get("/capabilities/plugins").header("authorization", "Bearer u1:org1").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let namespaces: Vec<String> = body["items"].as_array().unwrap().iter().map(|s| s["namespace"].as_str().unwrap().to_string()).collect();
    assert!(namespaces.contains(&"send_email".to_string()));
}
