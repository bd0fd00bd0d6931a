//! Checkpoint fingerprinting: a stable key identifying "this same kind of
//! decision", used to look up a learned `UserPreference`. Hash of the step
//! name, a normalized form of the preview data, and the checkpoint type —
//! moved here from the domain crate because it needs `sha2`/`hex`.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};
use taskcore_kernel::domain::step::CheckpointType;

/// Recursively sorts object keys so two semantically-equal JSON values with
/// different key orders hash identically.
fn normalize(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let sorted: BTreeMap<String, serde_json::Value> =
                map.iter().map(|(k, v)| (k.clone(), normalize(v))).collect();
            serde_json::to_value(sorted).unwrap_or(serde_json::Value::Null)
        }
        serde_json::Value::Array(items) => serde_json::Value::Array(items.iter().map(normalize).collect()),
        other => other.clone(),
    }
}

pub fn fingerprint(
    step_name: &str,
    preview_data: &std::collections::HashMap<String, serde_json::Value>,
    checkpoint_type: CheckpointType,
) -> String {
    let normalized = normalize(&serde_json::json!(preview_data));
    let canonical = serde_json::to_string(&normalized).unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(step_name.as_bytes());
    hasher.update([0u8]);
    hasher.update(format!("{checkpoint_type:?}").as_bytes());
    hasher.update([0u8]);
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_order_does_not_change_the_fingerprint() {
        let mut a = std::collections::HashMap::new();
        a.insert("x".to_string(), serde_json::json!(1));
        a.insert("y".to_string(), serde_json::json!(2));

        let mut b = std::collections::HashMap::new();
        b.insert("y".to_string(), serde_json::json!(2));
        b.insert("x".to_string(), serde_json::json!(1));

        assert_eq!(
            fingerprint("send_email", &a, CheckpointType::Approval),
            fingerprint("send_email", &b, CheckpointType::Approval)
        );
    }

    #[test]
    fn different_checkpoint_types_hash_differently() {
        let data = std::collections::HashMap::new();
        assert_ne!(
            fingerprint("send_email", &data, CheckpointType::Approval),
            fingerprint("send_email", &data, CheckpointType::Input)
        );
    }
}
