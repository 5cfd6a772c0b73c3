//! Editing core for the export-readiness console.
//! Turns field-level edits of product, module and buyer-request records into minimal
//! merge-style update payloads, and keeps list, detail and reorder views consistent with
//! the backend after every write.

pub mod config;
pub mod descriptor;
pub mod error;
pub mod guard;
pub mod invoker;
pub mod lifetime;
pub mod listing;
pub mod reconcile;
pub mod remote;
pub mod reorder;
pub mod repair;
pub mod session;
pub mod statics;
pub mod surface;
mod value;

pub use config::{ConsoleConfig, GroupMerge, GroupRules};
pub use descriptor::{DescriptorSet, FieldDescriptor, FieldKind, FieldPath};
pub use error::{ApplyError, ConfigError, ReconcileError, RemoteError, SessionError, SurfaceError};
pub use guard::{DeleteOutcome, ListDetailGuard};
pub use invoker::PatchInvoker;
pub use lifetime::{SurfaceLifetime, SurfaceSignal};
pub use listing::Listing;
pub use reconcile::{Payload, reconcile, sanitize_key};
pub use remote::{EntityService, ListParams, SessionContext};
pub use reorder::{MoveDirection, OrderedItem, ReorderController, ReorderOutcome, ReorderPhase};
pub use repair::{BatchRepair, ComplianceIssue, SmartRepair};
pub use session::{EditEntry, EditSession};
pub use surface::{DetailView, SaveOutcome, SavePolicy};
pub use value::{ExNumber, ExValue};
