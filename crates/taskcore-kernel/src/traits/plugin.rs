//! C4 — Plugin Registry & Executor: the capability surface a `Plugin` step
//! dispatches into.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TaskCoreResult;
use crate::traits::context::TaskContext;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default: Option<serde_json::Value>,
    #[serde(default)]
    pub r#enum: Option<Vec<serde_json::Value>>,
}

/// Registration record grounded on the original plugin manifests
/// (namespace/category/schemas/`requires_checkpoint`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginSpec {
    pub namespace: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub inputs_schema: HashMap<String, FieldSpec>,
    pub outputs_schema: HashMap<String, FieldSpec>,
    #[serde(default)]
    pub requires_checkpoint: bool,
}

pub trait PluginRegistry: Send + Sync {
    fn register(&self, spec: PluginSpec, executor: std::sync::Arc<dyn PluginExecutor>) -> TaskCoreResult<()>;

    fn get(&self, namespace: &str) -> TaskCoreResult<(PluginSpec, std::sync::Arc<dyn PluginExecutor>)>;

    fn list(&self) -> Vec<PluginSpec>;
}

/// A single capability's runtime behavior. Input/output validation against
/// `PluginSpec::{inputs,outputs}_schema` happens in the caller (the
/// dispatcher), not inside the executor, so executors stay pure business
/// logic.
#[async_trait]
pub trait PluginExecutor: Send + Sync {
    async fn execute(
        &self,
        ctx: &TaskContext,
        inputs: HashMap<String, serde_json::Value>,
    ) -> TaskCoreResult<HashMap<String, serde_json::Value>>;
}
