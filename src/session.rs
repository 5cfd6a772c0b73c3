//! Edit sessions: the in-progress, not yet persisted edits of one open editor.

use crate::ExValue;
use crate::descriptor::{DescriptorSet, DynamicGroup, FieldDescriptor, FieldPath};
use crate::error::SessionError;
use std::sync::Arc;

/// One editable field with its original and current text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditEntry {
    descriptor: FieldDescriptor,
    /// Current key segment; differs from `descriptor.path` only after a rename.
    key: String,
    original_value: String,
    current_value: String,
    is_new: bool,
}

impl EditEntry {
    pub(crate) fn projected(descriptor: FieldDescriptor, value: String) -> Self {
        Self {
            key: descriptor.path.key().to_string(),
            descriptor,
            original_value: value.clone(),
            current_value: value,
            is_new: false,
        }
    }

    fn staged(group: &DynamicGroup) -> Self {
        Self {
            descriptor: FieldDescriptor::dynamic(&group.group, "", group.kind),
            key: String::new(),
            original_value: String::new(),
            current_value: String::new(),
            is_new: true,
        }
    }

    pub fn descriptor(&self) -> &FieldDescriptor {
        &self.descriptor
    }

    /// Where the entry points now, including any rename.
    pub fn path(&self) -> FieldPath {
        self.descriptor.path.with_key(self.key.as_str())
    }

    pub fn group(&self) -> Option<&str> {
        self.descriptor.path.group()
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Key the entry had on the baseline record; empty for new entries.
    pub fn original_key(&self) -> &str {
        self.descriptor.path.key()
    }

    pub fn original_value(&self) -> &str {
        &self.original_value
    }

    pub fn current_value(&self) -> &str {
        &self.current_value
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn key_changed(&self) -> bool {
        !self.is_new && self.key != self.descriptor.path.key()
    }

    pub fn is_changed(&self) -> bool {
        self.current_value != self.original_value || self.key_changed()
    }

    /// Both key and value carry content.
    pub fn is_complete(&self) -> bool {
        !self.key.trim().is_empty() && !self.current_value.trim().is_empty()
    }

    /// Whether the entry takes part in a reconciled payload.
    pub fn is_effective(&self) -> bool {
        if self.is_new {
            self.is_complete()
        } else {
            self.is_changed()
        }
    }

    fn reset(&mut self) {
        self.current_value = self.original_value.clone();
        self.key = self.descriptor.path.key().to_string();
    }
}

/// Ordered edit entries derived from one baseline snapshot.
///
/// A session belongs to exactly one opening of an editor. Reopening against a fresh
/// baseline builds a new session; nothing is merged across sessions.
#[derive(Debug, Clone)]
pub struct EditSession {
    baseline: Arc<ExValue>,
    entries: Vec<EditEntry>,
    dynamic_groups: Vec<DynamicGroup>,
}

impl EditSession {
    pub fn open(baseline: Arc<ExValue>, descriptors: &DescriptorSet) -> Self {
        let entries = descriptors.project(&baseline);
        tracing::debug!(entries = entries.len(), "opened edit session");
        Self {
            baseline,
            entries,
            dynamic_groups: descriptors.dynamic_groups().to_vec(),
        }
    }

    pub fn baseline(&self) -> &ExValue {
        &self.baseline
    }

    pub fn entries(&self) -> &[EditEntry] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> Option<&EditEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the entry currently addressing `path`.
    pub fn position(&self, path: &FieldPath) -> Option<usize> {
        self.entries.iter().position(|e| &e.path() == path)
    }

    pub fn set(&mut self, index: usize, value: impl Into<String>) -> Result<(), SessionError> {
        let entry = self.entry_mut(index)?;
        entry.current_value = value.into();
        Ok(())
    }

    /// Rename the key of an editable-key entry.
    pub fn set_key(&mut self, index: usize, key: impl Into<String>) -> Result<(), SessionError> {
        let entry = self.entry_mut(index)?;
        if !entry.descriptor.editable_key {
            return Err(SessionError::FixedKey(entry.descriptor.path.to_string()));
        }
        entry.key = key.into();
        Ok(())
    }

    /// Append an empty row to a dynamic group and return its index.
    pub fn add_new(&mut self, group: &str) -> Result<usize, SessionError> {
        let Some(dynamic) = self.dynamic_groups.iter().find(|g| g.group == group) else {
            return Err(SessionError::NotDynamicGroup(group.to_string()));
        };
        self.entries.push(EditEntry::staged(dynamic));
        Ok(self.entries.len() - 1)
    }

    /// Drop a row added in this session. Stored attributes are never removed here.
    pub fn remove(&mut self, index: usize) -> Result<EditEntry, SessionError> {
        let entry = self.entry_mut(index)?;
        if !entry.is_new {
            return Err(SessionError::PersistedEntry(entry.descriptor.path.to_string()));
        }
        Ok(self.entries.remove(index))
    }

    pub fn reset(&mut self, index: usize) -> Result<(), SessionError> {
        self.entry_mut(index)?.reset();
        Ok(())
    }

    pub fn reset_all(&mut self) {
        self.entries.retain(|e| !e.is_new);
        for entry in &mut self.entries {
            entry.reset();
        }
    }

    pub fn has_changes(&self) -> bool {
        self.entries.iter().any(EditEntry::is_effective)
    }

    pub fn changed_entries(&self) -> impl Iterator<Item = &EditEntry> {
        self.entries.iter().filter(|e| e.is_effective())
    }

    /// Copy rows that were added but not yet completed in `previous` into this session.
    /// Used by batch surfaces that keep staged rows across a save.
    pub fn adopt_staged(&mut self, previous: &EditSession) -> usize {
        let mut adopted = 0;
        for entry in previous.entries.iter().filter(|e| e.is_new && !e.is_complete()) {
            let Some(group) = entry.group() else {
                continue;
            };
            if self.dynamic_groups.iter().any(|g| g.group == group) {
                self.entries.push(entry.clone());
                adopted += 1;
            }
        }
        adopted
    }

    fn entry_mut(&mut self, index: usize) -> Result<&mut EditEntry, SessionError> {
        self.entries
            .get_mut(index)
            .ok_or(SessionError::IndexOutOfRange(index))
    }
}
