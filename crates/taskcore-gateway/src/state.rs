//! Shared application state, grounded on the teacher's `mofa-gateway::server`
//! `AppState` (one `Arc`-wrapped handle per collaborator, `Clone` for axum).

use std::sync::Arc;

use taskcore_foundation::UseCases;
use taskcore_kernel::traits::{AuthProvider, CheckpointManager, EventBus, PluginRegistry, TaskStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TaskStore>,
    pub bus: Arc<dyn EventBus>,
    pub checkpoints: Arc<dyn CheckpointManager>,
    pub plugins: Arc<dyn PluginRegistry>,
    pub auth: Arc<dyn AuthProvider>,
    pub use_cases: Arc<UseCases>,
}
