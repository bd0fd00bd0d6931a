//! `GET /tasks/{id}/events` SSE bridge (spec §6), grounded on the
//! `BroadcastStream` + `KeepAlive` SSE pattern: one forwarding subscription
//! per connection, a 30s heartbeat, and natural termination on disconnect
//! since the stream ends when the underlying channel closes.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use futures::stream::Stream;
use taskcore_kernel::error::TaskCoreError;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

use super::tasks::authenticate;
use crate::error::ApiError;
use crate::state::AppState;

pub async fn task_events(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(task_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<SseEvent, Infallible>>>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let task = state.store.get_task(&task_id).await?;
    state.auth.authorize_task_access(&user, &task.owner.organization_id).map_err(|_| TaskCoreError::not_found(format!("task {task_id}")))?;

    let pattern = format!("task.{task_id}.**");
    let subscription = state.bus.subscribe(&pattern).await?;

    let stream = ReceiverStream::new(subscription.receiver).map(|event| {
        let data = serde_json::to_string(&event).unwrap_or_else(|_| "{}".to_string());
        Ok(SseEvent::default().event(event.event_type).data(data))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(30)).text("keep-alive")))
}
