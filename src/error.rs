use crate::{ExValue, statics};
use thiserror::Error;

// ---------------------------------------------------------------------------
// SessionError
// ---------------------------------------------------------------------------

/// Rejected edit-session operations. The session is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("no edit entry at index {0}")]
    IndexOutOfRange(usize),

    #[error("field \"{0}\" has a fixed key and cannot be renamed")]
    FixedKey(String),

    #[error("field \"{0}\" is stored on the record and cannot be removed here")]
    PersistedEntry(String),

    #[error("group \"{0}\" does not accept new entries in this editor")]
    NotDynamicGroup(String),
}

// ---------------------------------------------------------------------------
// ReconcileError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error("more than one entry of \"{group}\" maps to the key \"{key}\"")]
    KeyCollision { group: String, key: String },
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("field path is empty")]
    EmptyPath,

    #[error("field path \"{0}\" is nested deeper than one group")]
    PathTooDeep(String),

    #[error("field path \"{path}\" uses undeclared group \"{group}\"")]
    UnknownGroup { path: String, group: String },

    #[error("no editor is configured for entity \"{0}\"")]
    UnknownEntity(String),
}

// ---------------------------------------------------------------------------
// RemoteError
// ---------------------------------------------------------------------------

/// Failure reported by an `EntityService`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RemoteError {
    #[error("record not found")]
    NotFound,

    #[error("not authenticated")]
    Unauthorized,

    #[error("access forbidden")]
    Forbidden,

    #[error("request rejected with status {status}")]
    Rejected { status: u16, body: Option<ExValue> },

    #[error("transport failure: {0}")]
    Transport(String),
}

impl RemoteError {
    pub fn rejected(status: u16, body: impl Into<ExValue>) -> Self {
        RemoteError::Rejected {
            status,
            body: Some(body.into()),
        }
    }

    /// Convert any backend failure into a string the console can show as-is.
    pub fn display_message(&self) -> String {
        match self {
            RemoteError::NotFound => statics::EN_ERR_NOT_FOUND.to_string(),
            RemoteError::Unauthorized => statics::EN_ERR_UNAUTHORIZED.to_string(),
            RemoteError::Forbidden => statics::EN_ERR_FORBIDDEN.to_string(),
            RemoteError::Rejected { status, body } => body
                .as_ref()
                .and_then(extract_backend_message)
                .unwrap_or_else(|| format!("{} ({status})", statics::EN_ERR_REQUEST_FAILED)),
            RemoteError::Transport(detail) if detail.trim().is_empty() => {
                statics::EN_ERR_NETWORK.to_string()
            }
            RemoteError::Transport(detail) => format!("{}: {detail}", statics::EN_ERR_NETWORK),
        }
    }
}

/// Pull the most specific human message out of an error body.
/// Known shapes are tried in order; anything else yields `None`.
fn extract_backend_message(body: &ExValue) -> Option<String> {
    if let Some(text) = non_empty(body.as_str()) {
        return Some(text);
    }

    for key in [statics::API_ERROR, statics::API_DETAIL, statics::API_MESSAGE] {
        match body.get(key) {
            Some(ExValue::String(s)) if !s.trim().is_empty() => return Some(s.trim().to_string()),
            Some(nested @ ExValue::Object(_)) => {
                if let Some(text) = extract_backend_message(nested) {
                    return Some(text);
                }
            }
            _ => {}
        }
    }

    if let Some(text) = body
        .get(statics::API_NON_FIELD_ERRORS)
        .and_then(first_text)
    {
        return Some(text);
    }

    // Field-keyed validation bodies: { errors: { hs_code: ["..."] } } or the bare map.
    let fields = body
        .get(statics::API_ERRORS)
        .and_then(ExValue::as_object)
        .or_else(|| body.as_object())?;
    let parts: Vec<String> = fields
        .iter()
        .filter_map(|(field, v)| first_text(v).map(|msg| format!("{field}: {msg}")))
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("; "))
    }
}

fn first_text(value: &ExValue) -> Option<String> {
    match value {
        ExValue::String(s) => non_empty(Some(s.as_str())),
        ExValue::Array(values) => values.iter().find_map(first_text),
        _ => None,
    }
}

fn non_empty(text: Option<&str>) -> Option<String> {
    text.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// ---------------------------------------------------------------------------
// ApplyError / SurfaceError
// ---------------------------------------------------------------------------

/// Why a partial update did not settle successfully.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApplyError {
    #[error("{message}")]
    Remote {
        message: String,
        #[source]
        source: RemoteError,
    },

    #[error("editing surface closed before the request settled")]
    Cancelled,
}

impl ApplyError {
    pub fn from_remote(source: RemoteError) -> Self {
        ApplyError::Remote {
            message: source.display_message(),
            source,
        }
    }

    pub fn display_message(&self) -> String {
        match self {
            ApplyError::Remote { message, .. } => message.clone(),
            ApplyError::Cancelled => statics::EN_ERR_SURFACE_CLOSED.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SurfaceError {
    #[error("no edit session is open")]
    NoSession,

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error(transparent)]
    Apply(#[from] ApplyError),

    /// The update was stored but the refreshed record could not be loaded.
    #[error("saved, but reloading the record failed: {0}")]
    Refresh(RemoteError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl SurfaceError {
    pub fn display_message(&self) -> String {
        match self {
            SurfaceError::NoSession => statics::EN_ERR_NO_SESSION.to_string(),
            SurfaceError::Session(e) => e.to_string(),
            SurfaceError::Reconcile(e) => e.to_string(),
            SurfaceError::Apply(e) => e.display_message(),
            SurfaceError::Refresh(e) => e.display_message(),
            SurfaceError::Config(e) => e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RemoteError;
    use crate::{ExValue, statics};
    use serde_json::json;

    #[test]
    fn rejected_bodies_yield_the_most_specific_message() {
        let e = RemoteError::rejected(400, ExValue::from(json!({ "error": "HS code is invalid" })));
        assert_eq!(e.display_message(), "HS code is invalid");

        let e = RemoteError::rejected(400, ExValue::from(json!({ "detail": "Not allowed" })));
        assert_eq!(e.display_message(), "Not allowed");

        let e = RemoteError::rejected(
            400,
            ExValue::from(json!({ "error": { "message": "nested message" } })),
        );
        assert_eq!(e.display_message(), "nested message");

        let e = RemoteError::rejected(
            400,
            ExValue::from(json!({ "non_field_errors": ["Duplicate product"] })),
        );
        assert_eq!(e.display_message(), "Duplicate product");
    }

    #[test]
    fn field_error_maps_are_joined() {
        let e = RemoteError::rejected(
            400,
            ExValue::from(json!({
                "errors": { "hs_code": ["Must be 6 digits"], "name": ["Required", "Too short"] }
            })),
        );
        assert_eq!(
            e.display_message(),
            "hs_code: Must be 6 digits; name: Required"
        );
    }

    #[test]
    fn unknown_bodies_fall_back_to_status() {
        let e = RemoteError::Rejected {
            status: 502,
            body: Some(ExValue::from(json!({ "unexpected": 1 }))),
        };
        assert_eq!(
            e.display_message(),
            format!("{} (502)", statics::EN_ERR_REQUEST_FAILED)
        );
        assert_eq!(
            RemoteError::Transport(String::new()).display_message(),
            statics::EN_ERR_NETWORK
        );
        assert_eq!(
            RemoteError::Transport("connection reset".into()).display_message(),
            "Network error: connection reset"
        );
    }
}
