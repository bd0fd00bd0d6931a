//! Preference store backing `try_auto_decide`'s narrowest-scope-first search.

use std::collections::HashMap;

use parking_lot::RwLock;
use taskcore_kernel::domain::{PreferenceDecision, PreferenceScope, UserPreference};

fn key(user_id: &str, scope: PreferenceScope, scope_value: Option<&str>, preference_key: &str) -> String {
    format!("{user_id}:{scope:?}:{}:{preference_key}", scope_value.unwrap_or(""))
}

#[derive(Default)]
pub struct PreferenceStore {
    entries: RwLock<HashMap<String, UserPreference>>,
}

impl PreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(
        &self,
        user_id: &str,
        scope: PreferenceScope,
        scope_value: Option<&str>,
        preference_key: &str,
    ) -> Option<UserPreference> {
        self.entries.read().get(&key(user_id, scope, scope_value, preference_key)).cloned()
    }

    /// Record a decision, creating the preference on first observation and
    /// applying the EMA update on subsequent ones (spec §4.3).
    pub fn observe(
        &self,
        user_id: &str,
        scope: PreferenceScope,
        scope_value: Option<&str>,
        preference_key: &str,
        decision: PreferenceDecision,
    ) {
        let k = key(user_id, scope, scope_value, preference_key);
        let mut entries = self.entries.write();
        entries
            .entry(k)
            .and_modify(|p| p.observe(decision))
            .or_insert_with(|| {
                UserPreference::new(user_id, scope, scope_value.map(str::to_string), preference_key, decision)
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observing_the_same_key_updates_in_place() {
        let store = PreferenceStore::new();
        store.observe("u1", PreferenceScope::Global, None, "fp1", PreferenceDecision::Approve);
        store.observe("u1", PreferenceScope::Global, None, "fp1", PreferenceDecision::Approve);
        let pref = store.lookup("u1", PreferenceScope::Global, None, "fp1").unwrap();
        assert_eq!(pref.usage_count, 2);
    }

    #[test]
    fn different_scopes_are_independent() {
        let store = PreferenceStore::new();
        store.observe("u1", PreferenceScope::Task, Some("t1"), "fp1", PreferenceDecision::Approve);
        assert!(store.lookup("u1", PreferenceScope::Global, None, "fp1").is_none());
        assert!(store.lookup("u1", PreferenceScope::Task, Some("t1"), "fp1").is_some());
    }
}
