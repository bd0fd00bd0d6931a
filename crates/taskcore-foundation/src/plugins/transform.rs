//! `transform` system plugin: deterministic JSON/string reshaping, ported in
//! spirit from `original_source/apps/tentackl/src/plugins/transform_plugin.py`.
//! Supported operations: `json_path`, `template`, `to_upper`, `to_lower`.

use std::collections::HashMap;

use async_trait::async_trait;
use taskcore_kernel::error::{TaskCoreError, TaskCoreResult};
use taskcore_kernel::traits::{PluginExecutor, TaskContext};

pub struct TransformPlugin;

fn json_path<'a>(value: &'a serde_json::Value, path: &str) -> Option<&'a serde_json::Value> {
    path.split('.').try_fold(value, |acc, segment| acc.get(segment))
}

fn apply_template(template: &str, data: &serde_json::Value) -> String {
    let mut out = template.to_string();
    if let serde_json::Value::Object(map) = data {
        for (k, v) in map {
            let placeholder = format!("{{{{{k}}}}}");
            let replacement = match v {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            out = out.replace(&placeholder, &replacement);
        }
    }
    out
}

#[async_trait]
impl PluginExecutor for TransformPlugin {
    async fn execute(
        &self,
        _ctx: &TaskContext,
        inputs: HashMap<String, serde_json::Value>,
    ) -> TaskCoreResult<HashMap<String, serde_json::Value>> {
        let operation = inputs
            .get("operation")
            .and_then(|v| v.as_str())
            .ok_or_else(|| TaskCoreError::invalid_input("transform requires a string `operation` input"))?;
        let data = inputs.get("data").cloned().unwrap_or(serde_json::Value::Null);

        let result = match operation {
            "json_path" => {
                let path = inputs
                    .get("path")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| TaskCoreError::invalid_input("json_path requires a `path` input"))?;
                json_path(&data, path).cloned().unwrap_or(serde_json::Value::Null)
            }
            "template" => {
                let template = inputs
                    .get("template")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| TaskCoreError::invalid_input("template requires a `template` input"))?;
                serde_json::json!(apply_template(template, &data))
            }
            "to_upper" => serde_json::json!(data.as_str().unwrap_or_default().to_uppercase()),
            "to_lower" => serde_json::json!(data.as_str().unwrap_or_default().to_lowercase()),
            other => return Err(TaskCoreError::invalid_input(format!("unknown transform operation: {other}"))),
        };

        let mut out = HashMap::new();
        out.insert("result".to_string(), result);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn json_path_extracts_a_nested_field() {
        let plugin = TransformPlugin;
        let ctx = TaskContext::new("t1", "s1", 1);
        let mut inputs = HashMap::new();
        inputs.insert("operation".to_string(), serde_json::json!("json_path"));
        inputs.insert("data".to_string(), serde_json::json!({"a": {"b": 7}}));
        inputs.insert("path".to_string(), serde_json::json!("a.b"));
        let out = plugin.execute(&ctx, inputs).await.unwrap();
        assert_eq!(out["result"], serde_json::json!(7));
    }

    #[tokio::test]
    async fn template_substitutes_fields_from_data() {
        let plugin = TransformPlugin;
        let ctx = TaskContext::new("t1", "s1", 1);
        let mut inputs = HashMap::new();
        inputs.insert("operation".to_string(), serde_json::json!("template"));
        inputs.insert("data".to_string(), serde_json::json!({"name": "Ada"}));
        inputs.insert("template".to_string(), serde_json::json!("hello {{name}}"));
        let out = plugin.execute(&ctx, inputs).await.unwrap();
        assert_eq!(out["result"], serde_json::json!("hello Ada"));
    }
}
