use crate::descriptor::{DescriptorSet, FieldDescriptor, FieldKind, FieldPath};
use crate::error::ConfigError;
use crate::remote::ListParams;
use crate::statics;
use anyhow::Context;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// How changed entries of a nested group are written into the merged copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupMerge {
    /// Values are sent as the text the user typed.
    Text,
    /// Values are parsed as floats, zero when unparseable.
    Numeric,
}

/// Merge rule per nested group name. Unlisted groups merge as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupRules(IndexMap<String, GroupMerge>);

impl Default for GroupRules {
    fn default() -> Self {
        let mut rules = IndexMap::new();
        rules.insert(statics::REC_GROUP_QUALITY_SPECS.to_string(), GroupMerge::Text);
        rules.insert(statics::REC_GROUP_DIMENSIONS.to_string(), GroupMerge::Numeric);
        Self(rules)
    }
}

impl GroupRules {
    pub fn empty() -> Self {
        Self(IndexMap::new())
    }

    pub fn with(mut self, group: impl Into<String>, merge: GroupMerge) -> Self {
        self.0.insert(group.into(), merge);
        self
    }

    pub fn merge_for(&self, group: &str) -> GroupMerge {
        self.0.get(group).copied().unwrap_or(GroupMerge::Text)
    }

    pub fn contains(&self, group: &str) -> bool {
        self.0.contains_key(group)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldConfig {
    pub path: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub kind: FieldKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EntityConfig {
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
    /// Nested groups edited as free key/value tables.
    #[serde(default)]
    pub dynamic_groups: Vec<String>,
}

fn default_page_size() -> u32 {
    statics::DEFAULT_PAGE_SIZE
}

/// Editor layout for the console, usually read from a JSON5 file next to the deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleConfig {
    #[serde(default)]
    pub groups: GroupRules,
    #[serde(default)]
    pub entities: IndexMap<String, EntityConfig>,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ConsoleConfig {
    /// The product editor shipped with the console.
    pub fn builtin() -> Self {
        let field = |path: &str, label: &str, kind: FieldKind| FieldConfig {
            path: path.to_string(),
            label: Some(label.to_string()),
            kind,
        };
        let dims = |key: &str| format!("{}.{key}", statics::REC_GROUP_DIMENSIONS);

        let product = EntityConfig {
            fields: vec![
                field(statics::REC_FIELD_NAME, "Product name", FieldKind::SingleLine),
                field(statics::REC_FIELD_DESCRIPTION, "Description", FieldKind::MultiLine),
                field(
                    statics::REC_FIELD_MATERIAL_COMPOSITION,
                    "Material composition",
                    FieldKind::SingleLine,
                ),
                field(statics::REC_FIELD_HS_CODE, "HS code", FieldKind::SingleLine),
                field(statics::REC_FIELD_UNIT_PRICE, "Unit price", FieldKind::Numeric),
                field(&dims(statics::REC_DIMENSION_LENGTH), "Length", FieldKind::Numeric),
                field(&dims(statics::REC_DIMENSION_WIDTH), "Width", FieldKind::Numeric),
                field(&dims(statics::REC_DIMENSION_HEIGHT), "Height", FieldKind::Numeric),
            ],
            dynamic_groups: vec![statics::REC_GROUP_QUALITY_SPECS.to_string()],
        };

        let mut entities = IndexMap::new();
        entities.insert(statics::ENTITY_PRODUCT.to_string(), product);
        Self {
            groups: GroupRules::default(),
            entities,
            page_size: statics::DEFAULT_PAGE_SIZE,
        }
    }

    pub fn load_path(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("reading {path:?}"))?;
        Self::from_json5_str(&text).with_context(|| format!("loading {path:?}"))
    }

    pub fn from_json5_str(text: &str) -> anyhow::Result<Self> {
        let config: Self = json5::from_str(text).context("parsing JSON5")?;
        config.validate().context("validating editor layout")?;
        tracing::info!(entities = config.entities.len(), "loaded console config");
        Ok(config)
    }

    /// Every entity must produce a valid descriptor set.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for name in self.entities.keys() {
            self.descriptors(name)?;
        }
        Ok(())
    }

    pub fn descriptors(&self, entity: &str) -> Result<DescriptorSet, ConfigError> {
        let config = self
            .entities
            .get(entity)
            .ok_or_else(|| ConfigError::UnknownEntity(entity.to_string()))?;

        let mut set = DescriptorSet::new();
        for field in &config.fields {
            let path = FieldPath::parse(&field.path)?;
            self.check_group(&field.path, path.group())?;
            let label = field
                .label
                .clone()
                .unwrap_or_else(|| humanize(path.key()));
            set.push_field(FieldDescriptor::new(path, label, field.kind));
        }
        for group in &config.dynamic_groups {
            self.check_group(group, Some(group.as_str()))?;
            let kind = match self.groups.merge_for(group) {
                GroupMerge::Numeric => FieldKind::Numeric,
                GroupMerge::Text => FieldKind::SingleLine,
            };
            set.push_dynamic_group(group.as_str(), kind);
        }
        Ok(set)
    }

    pub fn list_params(&self) -> ListParams {
        ListParams::page(1, self.page_size)
    }

    fn check_group(&self, path: &str, group: Option<&str>) -> Result<(), ConfigError> {
        match group {
            Some(group) if !self.groups.contains(group) => Err(ConfigError::UnknownGroup {
                path: path.to_string(),
                group: group.to_string(),
            }),
            _ => Ok(()),
        }
    }
}

/// "material_composition" -> "Material composition"
fn humanize(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::{ConsoleConfig, GroupMerge, GroupRules, humanize};
    use crate::descriptor::FieldKind;
    use crate::error::ConfigError;
    use crate::statics;

    #[test]
    fn builtin_product_editor_is_valid() {
        let config = ConsoleConfig::builtin();
        config.validate().unwrap();

        let set = config.descriptors(statics::ENTITY_PRODUCT).unwrap();
        assert_eq!(set.fields().len(), 8);
        assert_eq!(set.dynamic_groups()[0].group, statics::REC_GROUP_QUALITY_SPECS);
        assert_eq!(set.dynamic_groups()[0].kind, FieldKind::SingleLine);
    }

    #[test]
    fn json5_layout_parses_with_defaults() {
        let config = ConsoleConfig::from_json5_str(
            r#"{
                // product editor trimmed to two fields
                entities: {
                    product: {
                        fields: [
                            { path: 'hs_code' },
                            { path: 'dimensions_l_w_h.length', kind: 'numeric', label: 'L' },
                        ],
                        dynamic_groups: ['quality_specs'],
                    },
                },
            }"#,
        )
        .unwrap();

        assert_eq!(config.page_size, statics::DEFAULT_PAGE_SIZE);
        assert_eq!(config.groups, GroupRules::default());
        let set = config.descriptors("product").unwrap();
        assert_eq!(set.fields()[0].label, "Hs code");
        assert_eq!(set.fields()[1].kind, FieldKind::Numeric);
    }

    #[test]
    fn undeclared_groups_are_rejected() {
        let err = ConsoleConfig::from_json5_str(
            "{ groups: { quality_specs: 'text' }, entities: { p: { fields: [{ path: 'packaging.type' }] } } }",
        )
        .unwrap_err();
        let root = err.root_cause().to_string();
        assert!(root.contains("packaging"), "{root}");

        let config = ConsoleConfig::builtin();
        assert_eq!(
            config.descriptors("buyer").unwrap_err(),
            ConfigError::UnknownEntity("buyer".to_string())
        );
    }

    #[test]
    fn group_rules_default_to_text() {
        let rules = GroupRules::empty().with("dims", GroupMerge::Numeric);
        assert_eq!(rules.merge_for("dims"), GroupMerge::Numeric);
        assert_eq!(rules.merge_for("anything"), GroupMerge::Text);
    }

    #[test]
    fn humanize_spaces_and_capitalizes() {
        assert_eq!(humanize("material_composition"), "Material composition");
        assert_eq!(humanize(""), "");
    }
}
