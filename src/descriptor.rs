//! Field descriptors: which attributes of a record an editor exposes, and where they live.

use crate::error::ConfigError;
use crate::session::EditEntry;
use crate::{ExValue, statics};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Input shape of an editable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldKind {
    #[default]
    SingleLine,
    MultiLine,
    Numeric,
}

impl FieldKind {
    /// What an absent attribute projects to.
    pub fn empty_value(self) -> &'static str {
        match self {
            FieldKind::Numeric => statics::EN_ZERO,
            FieldKind::SingleLine | FieldKind::MultiLine => statics::EN_EMPTY,
        }
    }
}

/// Location of a field: a top-level key, or a key inside one nested group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    group: Option<String>,
    key: String,
}

impl FieldPath {
    pub fn top(key: impl Into<String>) -> Self {
        Self {
            group: None,
            key: key.into(),
        }
    }

    pub fn nested(group: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            group: Some(group.into()),
            key: key.into(),
        }
    }

    /// Parse a dotted path of depth one or two.
    pub fn parse(dotted: &str) -> Result<Self, ConfigError> {
        let dotted = dotted.trim();
        if dotted.is_empty() {
            return Err(ConfigError::EmptyPath);
        }
        let mut parts = dotted.split('.');
        let first = parts.next().unwrap_or_default();
        let second = parts.next();
        if parts.next().is_some() {
            return Err(ConfigError::PathTooDeep(dotted.to_string()));
        }
        match second {
            None => Ok(Self::top(first)),
            Some(key) if !first.is_empty() && !key.is_empty() => Ok(Self::nested(first, key)),
            Some(_) => Err(ConfigError::EmptyPath),
        }
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn with_key(&self, key: impl Into<String>) -> Self {
        Self {
            group: self.group.clone(),
            key: key.into(),
        }
    }

    /// Forgiving read: any missing or non-object hop yields `None`.
    pub fn lookup<'a>(&self, record: &'a ExValue) -> Option<&'a ExValue> {
        match &self.group {
            None => record.get(&self.key),
            Some(group) => record.get(group)?.get(&self.key),
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.group {
            Some(group) => write!(f, "{group}.{}", self.key),
            None => f.write_str(&self.key),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub path: FieldPath,
    pub label: String,
    pub kind: FieldKind,
    /// The key name itself is user-editable (dynamic specification tables).
    pub editable_key: bool,
}

impl FieldDescriptor {
    pub fn new(path: FieldPath, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            path,
            label: label.into(),
            kind,
            editable_key: false,
        }
    }

    pub fn dynamic(group: &str, key: &str, kind: FieldKind) -> Self {
        Self {
            path: FieldPath::nested(group, key),
            label: key.to_string(),
            kind,
            editable_key: true,
        }
    }

    /// The value this descriptor sees in `record`, as edit text.
    pub fn project_value(&self, record: &ExValue) -> String {
        match self.path.lookup(record) {
            None | Some(ExValue::Null) => self.kind.empty_value().to_string(),
            Some(v) => v.to_edit_string(),
        }
    }
}

/// A nested map whose keys are discovered from the record at projection time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicGroup {
    pub group: String,
    pub kind: FieldKind,
}

/// Fixed descriptors plus dynamic groups for one kind of editor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DescriptorSet {
    fields: Vec<FieldDescriptor>,
    dynamic_groups: Vec<DynamicGroup>,
}

impl DescriptorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, descriptor: FieldDescriptor) -> Self {
        self.push_field(descriptor);
        self
    }

    pub fn with_dynamic_group(mut self, group: impl Into<String>, kind: FieldKind) -> Self {
        self.push_dynamic_group(group, kind);
        self
    }

    /// Adds a descriptor unless one already targets the same path.
    pub fn push_field(&mut self, descriptor: FieldDescriptor) {
        if self.fields.iter().all(|d| d.path != descriptor.path) {
            self.fields.push(descriptor);
        }
    }

    pub fn push_dynamic_group(&mut self, group: impl Into<String>, kind: FieldKind) {
        let group = group.into();
        if self.dynamic_groups.iter().all(|g| g.group != group) {
            self.dynamic_groups.push(DynamicGroup { group, kind });
        }
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn dynamic_groups(&self) -> &[DynamicGroup] {
        &self.dynamic_groups
    }

    pub fn dynamic_group(&self, group: &str) -> Option<&DynamicGroup> {
        self.dynamic_groups.iter().find(|g| g.group == group)
    }

    /// One edit entry per fixed descriptor, then one per existing key of each dynamic group.
    /// Dynamic keys already covered by a fixed descriptor are not repeated.
    pub fn project(&self, record: &ExValue) -> Vec<EditEntry> {
        let mut entries: Vec<EditEntry> = self
            .fields
            .iter()
            .map(|d| EditEntry::projected(d.clone(), d.project_value(record)))
            .collect();

        for dynamic in &self.dynamic_groups {
            let Some(map) = record.get(&dynamic.group).and_then(ExValue::as_object) else {
                continue;
            };
            for key in map.keys() {
                let path = FieldPath::nested(dynamic.group.as_str(), key.as_str());
                if self.fields.iter().any(|d| d.path == path) {
                    continue;
                }
                let descriptor = FieldDescriptor::dynamic(&dynamic.group, key, dynamic.kind);
                let value = descriptor.project_value(record);
                entries.push(EditEntry::projected(descriptor, value));
            }
        }

        entries
    }
}

#[cfg(test)]
mod tests {
    use super::{DescriptorSet, FieldDescriptor, FieldKind, FieldPath};
    use crate::{ExValue, error::ConfigError, statics};
    use serde_json::json;

    fn product() -> ExValue {
        ExValue::from(json!({
            "name": "Shirt",
            "unit_price": 12.5,
            "quality_specs": { "origin": "local", "weight": "2kg" },
            "dimensions_l_w_h": { "length": 10 }
        }))
    }

    #[test]
    fn parse_accepts_depth_one_and_two_only() {
        assert_eq!(FieldPath::parse("name").unwrap(), FieldPath::top("name"));
        assert_eq!(
            FieldPath::parse("quality_specs.origin").unwrap(),
            FieldPath::nested("quality_specs", "origin")
        );
        assert_eq!(
            FieldPath::parse("a.b.c"),
            Err(ConfigError::PathTooDeep("a.b.c".to_string()))
        );
        assert_eq!(FieldPath::parse("  "), Err(ConfigError::EmptyPath));
        assert_eq!(FieldPath::parse("a."), Err(ConfigError::EmptyPath));
    }

    #[test]
    fn projection_reads_values_or_kind_defaults() {
        let set = DescriptorSet::new()
            .with_field(FieldDescriptor::new(FieldPath::top("name"), "Name", FieldKind::SingleLine))
            .with_field(FieldDescriptor::new(
                FieldPath::top("hs_code"),
                "HS code",
                FieldKind::SingleLine,
            ))
            .with_field(FieldDescriptor::new(
                FieldPath::top("unit_price"),
                "Price",
                FieldKind::Numeric,
            ))
            .with_field(FieldDescriptor::new(
                FieldPath::nested(statics::REC_GROUP_DIMENSIONS, "width"),
                "Width",
                FieldKind::Numeric,
            ));

        let entries = set.project(&product());
        let values: Vec<&str> = entries.iter().map(|e| e.original_value()).collect();
        assert_eq!(values, vec!["Shirt", "", "12.5", "0"]);
        assert!(entries.iter().all(|e| !e.is_changed()));
    }

    #[test]
    fn dynamic_groups_follow_the_record_keys() {
        let set = DescriptorSet::new()
            .with_field(FieldDescriptor::new(
                FieldPath::nested(statics::REC_GROUP_QUALITY_SPECS, "origin"),
                "Origin",
                FieldKind::SingleLine,
            ))
            .with_dynamic_group(statics::REC_GROUP_QUALITY_SPECS, FieldKind::SingleLine);

        let entries = set.project(&product());
        let paths: Vec<String> = entries.iter().map(|e| e.path().to_string()).collect();
        assert_eq!(paths, vec!["quality_specs.origin", "quality_specs.weight"]);
        assert!(!entries[0].descriptor().editable_key);
        assert!(entries[1].descriptor().editable_key);
        assert_eq!(entries[1].original_value(), "2kg");
    }

    #[test]
    fn missing_dynamic_group_projects_nothing() {
        let set = DescriptorSet::new().with_dynamic_group("certifications", FieldKind::SingleLine);
        assert!(set.project(&product()).is_empty());
        assert!(set.project(&ExValue::Null).is_empty());
    }
}
