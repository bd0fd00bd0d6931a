//! `GET /capabilities/plugins` (spec §6).

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;
use taskcore_kernel::traits::PluginSpec;

use super::tasks::authenticate;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PluginCapabilitiesResponse {
    pub items: Vec<PluginSpec>,
}

pub async fn list_plugins(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<PluginCapabilitiesResponse>, ApiError> {
    authenticate(&state, &headers).await?;
    Ok(Json(PluginCapabilitiesResponse { items: state.plugins.list() }))
}
