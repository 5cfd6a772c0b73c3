//! Turns an edit session into a minimal partial-update document.
//!
//! Top-level fields pass through verbatim. Fields under a nested group are merged into a copy
//! of that group as it exists on the baseline, so keys the session did not touch survive the
//! backend's merge-style update.

use crate::ExValue;
use crate::config::{GroupMerge, GroupRules};
use crate::error::ReconcileError;
use crate::session::{EditEntry, EditSession};
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

/// Sparse record fragment sent as a partial update.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Payload(IndexMap<String, ExValue>);

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(key: impl Into<String>, value: impl Into<ExValue>) -> Self {
        let mut payload = Self::new();
        payload.insert(key, value);
        payload
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ExValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ExValue> {
        self.0.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &IndexMap<String, ExValue> {
        &self.0
    }

    pub fn to_value(&self) -> ExValue {
        ExValue::Object(self.0.clone())
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::from(&self.to_value())
    }
}

/// Lower-case ASCII alphanumerics; everything else becomes `_`.
pub fn sanitize_key(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Lenient float parse for numeric groups; unparseable text counts as zero.
fn coerce_number(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

pub fn reconcile(session: &EditSession, rules: &GroupRules) -> Result<Payload, ReconcileError> {
    let mut payload = Payload::new();
    let mut grouped: IndexMap<&str, Vec<&EditEntry>> = IndexMap::new();

    for entry in session.changed_entries() {
        match entry.group() {
            None => payload.insert(entry.key(), entry.current_value()),
            Some(group) => grouped.entry(group).or_default().push(entry),
        }
    }

    for (group, changed) in grouped {
        if let Some(merged) = merge_group(session, group, &changed, rules.merge_for(group))? {
            payload.insert(group, merged);
        }
    }

    tracing::debug!(
        keys = ?payload.keys().collect::<Vec<_>>(),
        "reconciled edit session"
    );
    Ok(payload)
}

fn merge_group(
    session: &EditSession,
    group: &str,
    changed: &[&EditEntry],
    merge: GroupMerge,
) -> Result<Option<ExValue>, ReconcileError> {
    // Keys held by entries of this group that the user left alone.
    let mut claimed: IndexSet<String> = session
        .entries()
        .iter()
        .filter(|e| e.group() == Some(group) && !e.is_new() && !e.is_effective())
        .map(|e| e.original_key().to_string())
        .collect();

    let (included, skipped): (Vec<&EditEntry>, Vec<&EditEntry>) = changed
        .iter()
        .copied()
        .partition(|e| !sanitize_key(e.key()).is_empty() && !e.current_value().trim().is_empty());
    // Skipped stored entries keep their baseline key in the merged copy.
    claimed.extend(
        skipped
            .iter()
            .filter(|e| !e.is_new())
            .map(|e| e.original_key().to_string()),
    );

    let mut writes: Vec<(&EditEntry, String)> = Vec::new();
    for entry in included {
        let key = sanitize_key(entry.key());
        if !claimed.insert(key.clone()) {
            return Err(ReconcileError::KeyCollision {
                group: group.to_string(),
                key,
            });
        }
        writes.push((entry, key));
    }

    if writes.is_empty() {
        return Ok(None);
    }

    let mut merged = session
        .baseline()
        .get(group)
        .and_then(ExValue::as_object)
        .cloned()
        .unwrap_or_default();

    // Removals first so a rename onto a key vacated by another rename is not undone.
    for (entry, key) in &writes {
        if !entry.is_new() && entry.original_key() != key.as_str() {
            merged.shift_remove(entry.original_key());
        }
    }
    for (entry, key) in writes {
        let value = match merge {
            GroupMerge::Text => ExValue::from(entry.current_value()),
            GroupMerge::Numeric => ExValue::from(coerce_number(entry.current_value())),
        };
        merged.insert(key, value);
    }

    Ok(Some(ExValue::Object(merged)))
}

#[cfg(test)]
mod tests {
    use super::{coerce_number, sanitize_key};

    #[test]
    fn sanitize_lowercases_and_replaces_symbols() {
        assert_eq!(sanitize_key("Net Weight"), "net_weight");
        assert_eq!(sanitize_key("  ISO-9001 cert. "), "iso_9001_cert_");
        assert_eq!(sanitize_key("Café"), "caf_");
        assert_eq!(sanitize_key("   "), "");
    }

    #[test]
    fn numbers_default_to_zero() {
        assert_eq!(coerce_number("12.5"), 12.5);
        assert_eq!(coerce_number(" 3 "), 3.0);
        assert_eq!(coerce_number("12cm"), 0.0);
        assert_eq!(coerce_number("NaN"), 0.0);
    }
}
