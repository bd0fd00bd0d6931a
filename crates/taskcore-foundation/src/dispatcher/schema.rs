//! Input validation for plugin steps: builds a JSON Schema object from a
//! `PluginSpec::inputs_schema` map and validates resolved step inputs
//! against it with `jsonschema`, rather than hand-rolling per-field checks.

use std::collections::HashMap;

use jsonschema::JSONSchema;
use serde_json::Value;
use taskcore_kernel::error::{TaskCoreError, TaskCoreResult};
use taskcore_kernel::traits::{FieldSpec, PluginSpec};

fn field_schema(field: &FieldSpec) -> Value {
    let mut schema = serde_json::Map::new();
    // "any" is how a plugin spec opts an output/input out of type checking;
    // it has no JSON Schema draft-7 equivalent, so we simply omit `type`.
    if field.field_type != "any" {
        schema.insert("type".to_string(), Value::String(field.field_type.clone()));
    }
    if let Some(values) = &field.r#enum {
        schema.insert("enum".to_string(), Value::Array(values.clone()));
    }
    Value::Object(schema)
}

fn build_schema(spec: &PluginSpec) -> Value {
    let mut properties = serde_json::Map::new();
    let mut required = Vec::new();
    for (name, field) in &spec.inputs_schema {
        properties.insert(name.clone(), field_schema(field));
        if field.required {
            required.push(Value::String(name.clone()));
        }
    }
    serde_json::json!({
        "type": "object",
        "properties": Value::Object(properties),
        "required": Value::Array(required),
    })
}

/// Validates `inputs` against `spec.inputs_schema`. Unknown keys in `inputs`
/// are allowed through (plugins may accept org-specific extras); only
/// declared fields are checked for type/enum/required.
pub fn validate_inputs(spec: &PluginSpec, inputs: &HashMap<String, Value>) -> TaskCoreResult<()> {
    let schema = build_schema(spec);
    let compiled = JSONSchema::compile(&schema)
        .map_err(|e| TaskCoreError::internal(format!("invalid plugin schema for {}: {e}", spec.namespace)))?;
    let instance = serde_json::json!(inputs);
    compiled.validate(&instance).map_err(|errors| {
        let messages: Vec<String> = errors.map(|e| e.to_string()).collect();
        TaskCoreError::invalid_input(format!("plugin {} input validation failed: {}", spec.namespace, messages.join("; ")))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> PluginSpec {
        PluginSpec {
            namespace: "test.plugin".to_string(),
            description: String::new(),
            category: "test".to_string(),
            inputs_schema: HashMap::from([
                ("url".to_string(), FieldSpec { field_type: "string".to_string(), required: true, default: None, r#enum: None }),
                (
                    "mode".to_string(),
                    FieldSpec {
                        field_type: "string".to_string(),
                        required: false,
                        default: None,
                        r#enum: Some(vec![serde_json::json!("fast"), serde_json::json!("slow")]),
                    },
                ),
            ]),
            outputs_schema: HashMap::new(),
            requires_checkpoint: false,
        }
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let inputs = HashMap::new();
        assert!(validate_inputs(&spec(), &inputs).is_err());
    }

    #[test]
    fn wrong_type_is_rejected() {
        let inputs = HashMap::from([("url".to_string(), serde_json::json!(42))]);
        assert!(validate_inputs(&spec(), &inputs).is_err());
    }

    #[test]
    fn value_outside_enum_is_rejected() {
        let inputs =
            HashMap::from([("url".to_string(), serde_json::json!("https://example.com")), ("mode".to_string(), serde_json::json!("turbo"))]);
        assert!(validate_inputs(&spec(), &inputs).is_err());
    }

    #[test]
    fn valid_inputs_pass() {
        let inputs =
            HashMap::from([("url".to_string(), serde_json::json!("https://example.com")), ("mode".to_string(), serde_json::json!("fast"))]);
        assert!(validate_inputs(&spec(), &inputs).is_ok());
    }
}
