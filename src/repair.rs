//! Repair editors driven by an export-readiness compliance report.
//!
//! `BatchRepair` edits every flagged field of a record at once and keeps staged specification
//! rows open across saves. `SmartRepair` fixes one field and closes after a successful save.

use crate::config::GroupRules;
use crate::descriptor::{DescriptorSet, FieldDescriptor, FieldKind, FieldPath};
use crate::error::{RemoteError, SurfaceError};
use crate::listing::unwrap_record;
use crate::remote::{EntityService, SessionContext};
use crate::session::EditSession;
use crate::surface::{DetailView, SaveOutcome, SavePolicy};
use crate::{ExValue, statics};
use std::sync::Arc;
use tracing::{debug, warn};

/// One problem the compliance check found on a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplianceIssue {
    pub field: FieldPath,
    pub label: String,
    pub kind: FieldKind,
    pub message: String,
    pub suggestion: Option<String>,
}

impl ComplianceIssue {
    /// Read the `issues` array of a report. Entries without a usable field path are skipped.
    pub fn from_report(report: &ExValue) -> Vec<ComplianceIssue> {
        let report = unwrap_record(report.clone());
        let Some(issues) = report.get(statics::API_ISSUES).and_then(ExValue::as_array) else {
            return Vec::new();
        };
        issues.iter().filter_map(Self::from_value).collect()
    }

    fn from_value(value: &ExValue) -> Option<Self> {
        let raw = value.get(statics::API_ISSUE_FIELD)?.as_str()?;
        let field = match FieldPath::parse(raw) {
            Ok(field) => field,
            Err(e) => {
                warn!(field = raw, error = %e, "skipping compliance issue");
                return None;
            }
        };
        let text = |key: &str| {
            value
                .get(key)
                .filter(|v| !v.is_null())
                .map(ExValue::to_edit_string)
                .filter(|s| !s.trim().is_empty())
        };
        Some(Self {
            label: text(statics::API_ISSUE_LABEL).unwrap_or_else(|| field.key().to_string()),
            kind: text(statics::API_ISSUE_KIND)
                .map(|k| parse_kind(&k))
                .unwrap_or_default(),
            message: text(statics::API_MESSAGE).unwrap_or_default(),
            suggestion: text(statics::API_ISSUE_SUGGESTION),
            field,
        })
    }

    pub fn descriptor(&self) -> FieldDescriptor {
        FieldDescriptor::new(self.field.clone(), self.label.clone(), self.kind)
    }
}

fn parse_kind(raw: &str) -> FieldKind {
    match raw.trim().to_ascii_lowercase().as_str() {
        "numeric" | "number" => FieldKind::Numeric,
        "multi-line" | "multiline" | "textarea" => FieldKind::MultiLine,
        _ => FieldKind::SingleLine,
    }
}

/// Edits all flagged fields of one record together.
pub struct BatchRepair {
    view: DetailView,
    issues: Vec<ComplianceIssue>,
}

impl BatchRepair {
    pub fn new(
        service: Arc<dyn EntityService>,
        record_id: impl Into<String>,
        issues: Vec<ComplianceIssue>,
        rules: GroupRules,
    ) -> Self {
        let mut descriptors = DescriptorSet::new();
        for issue in &issues {
            descriptors.push_field(issue.descriptor());
        }
        descriptors.push_dynamic_group(statics::REC_GROUP_QUALITY_SPECS, FieldKind::SingleLine);
        Self {
            view: DetailView::new(service, descriptors, rules, record_id),
            issues,
        }
    }

    pub fn issues(&self) -> &[ComplianceIssue] {
        &self.issues
    }

    pub fn view(&self) -> &DetailView {
        &self.view
    }

    pub fn session_mut(&mut self) -> Option<&mut EditSession> {
        self.view.session_mut()
    }

    pub async fn open(&mut self, ctx: &SessionContext) -> Result<&mut EditSession, RemoteError> {
        self.view.open_editor(ctx).await
    }

    /// Stage every suggestion into its field. Returns how many entries were filled.
    pub fn apply_suggestions(&mut self) -> Result<usize, SurfaceError> {
        let session = self.view.session_mut().ok_or(SurfaceError::NoSession)?;
        let mut applied = 0;
        for issue in &self.issues {
            let Some(suggestion) = &issue.suggestion else {
                continue;
            };
            let Some(index) = session.position(&issue.field) else {
                continue;
            };
            if session.set(index, suggestion.as_str()).is_ok() {
                applied += 1;
            }
        }
        debug!(applied, "staged compliance suggestions");
        Ok(applied)
    }

    pub async fn save(&mut self, ctx: &SessionContext) -> Result<SaveOutcome, SurfaceError> {
        self.view.save(ctx, SavePolicy::KeepStaged).await
    }

    pub fn close(&mut self) {
        self.view.close();
    }
}

/// Single-field fix opened from one compliance issue.
pub struct SmartRepair {
    view: DetailView,
    field: FieldPath,
}

impl SmartRepair {
    pub fn new(
        service: Arc<dyn EntityService>,
        record_id: impl Into<String>,
        issue: &ComplianceIssue,
        rules: GroupRules,
    ) -> Self {
        let descriptors = DescriptorSet::new().with_field(issue.descriptor());
        Self {
            view: DetailView::new(service, descriptors, rules, record_id),
            field: issue.field.clone(),
        }
    }

    pub fn field(&self) -> &FieldPath {
        &self.field
    }

    pub fn view(&self) -> &DetailView {
        &self.view
    }

    pub fn is_open(&self) -> bool {
        self.view.is_editing()
    }

    /// Fetch the record and return the field's current text.
    pub async fn open(&mut self, ctx: &SessionContext) -> Result<String, RemoteError> {
        let session = self.view.open_editor(ctx).await?;
        Ok(session
            .entry(0)
            .map(|e| e.current_value().to_string())
            .unwrap_or_default())
    }

    pub fn value(&self) -> Option<&str> {
        self.view.session()?.entry(0).map(|e| e.current_value())
    }

    pub fn set_value(&mut self, value: impl Into<String>) -> Result<(), SurfaceError> {
        let session = self.view.session_mut().ok_or(SurfaceError::NoSession)?;
        Ok(session.set(0, value)?)
    }

    pub async fn save(&mut self, ctx: &SessionContext) -> Result<SaveOutcome, SurfaceError> {
        self.view.save(ctx, SavePolicy::Close).await
    }

    pub fn cancel(&mut self) {
        self.view.cancel_editor();
    }
}
