//! Plugin Registry: namespace → spec + executor, grounded on
//! `mofa-foundation/src/agent/tools/registry.rs`'s DashMap-backed catalogue.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use taskcore_kernel::error::{TaskCoreError, TaskCoreResult};
use taskcore_kernel::traits::{PluginExecutor, PluginRegistry, PluginSpec};

pub struct InMemoryPluginRegistry {
    entries: DashMap<String, (PluginSpec, Arc<dyn PluginExecutor>)>,
}

impl InMemoryPluginRegistry {
    pub fn new() -> Self {
        Self { entries: DashMap::new() }
    }
}

impl Default for InMemoryPluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginRegistry for InMemoryPluginRegistry {
    fn register(&self, spec: PluginSpec, executor: Arc<dyn PluginExecutor>) -> TaskCoreResult<()> {
        self.entries.insert(spec.namespace.clone(), (spec, executor));
        Ok(())
    }

    fn get(&self, namespace: &str) -> TaskCoreResult<(PluginSpec, Arc<dyn PluginExecutor>)> {
        self.entries
            .get(namespace)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| TaskCoreError::not_found(format!("plugin {namespace}")))
    }

    fn list(&self) -> Vec<PluginSpec> {
        self.entries.iter().map(|entry| entry.value().0.clone()).collect()
    }
}

/// Builds the registry pre-populated with the three built-in system plugins
/// (spec §4.4 supplement).
pub fn with_builtin_plugins(notifier: Arc<dyn taskcore_kernel::traits::NotificationProvider>) -> InMemoryPluginRegistry {
    use taskcore_kernel::traits::FieldSpec;

    let registry = InMemoryPluginRegistry::new();

    registry
        .register(
            PluginSpec {
                namespace: "http.get".to_string(),
                description: "Fetch a URL over HTTPS, subject to the task's allow-host policy.".to_string(),
                category: "io".to_string(),
                inputs_schema: HashMap::from([(
                    "url".to_string(),
                    FieldSpec { field_type: "string".to_string(), required: true, default: None, r#enum: None },
                )]),
                outputs_schema: HashMap::from([
                    ("status".to_string(), FieldSpec { field_type: "integer".to_string(), required: true, default: None, r#enum: None }),
                    ("body".to_string(), FieldSpec { field_type: "string".to_string(), required: true, default: None, r#enum: None }),
                ]),
                requires_checkpoint: false,
            },
            Arc::new(super::http_get::HttpGetPlugin::new()),
        )
        .expect("register http.get");

    registry
        .register(
            PluginSpec {
                namespace: "transform".to_string(),
                description: "Apply a data-processing operation (json_path, template, to_upper, to_lower) to an input value.".to_string(),
                category: "data_processing".to_string(),
                inputs_schema: HashMap::from([(
                    "operation".to_string(),
                    FieldSpec {
                        field_type: "string".to_string(),
                        required: true,
                        default: None,
                        r#enum: Some(vec![
                            serde_json::json!("json_path"),
                            serde_json::json!("template"),
                            serde_json::json!("to_upper"),
                            serde_json::json!("to_lower"),
                        ]),
                    },
                )]),
                outputs_schema: HashMap::from([(
                    "result".to_string(),
                    FieldSpec { field_type: "any".to_string(), required: true, default: None, r#enum: None },
                )]),
                requires_checkpoint: false,
            },
            Arc::new(super::transform::TransformPlugin),
        )
        .expect("register transform");

    registry
        .register(
            PluginSpec {
                namespace: "send_email".to_string(),
                description: "Send an email notification; always gated behind a human-approval checkpoint.".to_string(),
                category: "communication".to_string(),
                inputs_schema: HashMap::from([
                    ("to".to_string(), FieldSpec { field_type: "string".to_string(), required: true, default: None, r#enum: None }),
                    ("subject".to_string(), FieldSpec { field_type: "string".to_string(), required: false, default: None, r#enum: None }),
                    ("body".to_string(), FieldSpec { field_type: "string".to_string(), required: false, default: None, r#enum: None }),
                ]),
                outputs_schema: HashMap::from([(
                    "sent".to_string(),
                    FieldSpec { field_type: "boolean".to_string(), required: true, default: None, r#enum: None },
                )]),
                requires_checkpoint: true,
            },
            Arc::new(super::send_email::SendEmailPlugin::new(notifier)),
        )
        .expect("register send_email");

    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::send_email::RecordingNotificationProvider;

    #[test]
    fn builtin_registry_lists_all_three_plugins() {
        let registry = with_builtin_plugins(Arc::new(RecordingNotificationProvider::new()));
        let mut namespaces: Vec<String> = registry.list().into_iter().map(|s| s.namespace).collect();
        namespaces.sort();
        assert_eq!(namespaces, vec!["http.get".to_string(), "send_email".to_string(), "transform".to_string()]);
    }

    #[test]
    fn send_email_requires_a_checkpoint() {
        let registry = with_builtin_plugins(Arc::new(RecordingNotificationProvider::new()));
        let (spec, _) = registry.get("send_email").unwrap();
        assert!(spec.requires_checkpoint);
    }
}
