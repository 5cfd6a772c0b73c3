use crate::config::GroupRules;
use crate::descriptor::DescriptorSet;
use crate::error::{RemoteError, SurfaceError};
use crate::invoker::PatchInvoker;
use crate::lifetime::{SurfaceLifetime, SurfaceSignal};
use crate::listing::unwrap_record;
use crate::reconcile::{Payload, reconcile};
use crate::remote::{EntityService, SessionContext};
use crate::session::EditSession;
use crate::{ExValue, statics};
use std::sync::Arc;
use tracing::{info, warn};

/// What happens to the edit session after a successful save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SavePolicy {
    /// Re-project a fresh session from the refreshed record.
    #[default]
    Reproject,
    /// Close the editor; single-field surfaces work this way.
    Close,
    /// Re-project, then carry over staged rows that were not complete yet.
    KeepStaged,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved { payload: Payload },
    NothingToSave,
}

/// Detail view of one record with an optional inline editor.
///
/// The baseline is replaced wholesale on every fetch and never edited in place. An edit
/// session exists only while the editor is open and always derives from the latest baseline.
pub struct DetailView {
    invoker: PatchInvoker,
    descriptors: DescriptorSet,
    rules: GroupRules,
    record_id: String,
    baseline: Option<Arc<ExValue>>,
    session: Option<EditSession>,
    lifetime: SurfaceLifetime,
    page_error: Option<String>,
    edit_error: Option<String>,
    status: Option<String>,
}

impl DetailView {
    pub fn new(
        service: Arc<dyn EntityService>,
        descriptors: DescriptorSet,
        rules: GroupRules,
        record_id: impl Into<String>,
    ) -> Self {
        Self {
            invoker: PatchInvoker::new(service),
            descriptors,
            rules,
            record_id: record_id.into(),
            baseline: None,
            session: None,
            lifetime: SurfaceLifetime::new(),
            page_error: None,
            edit_error: None,
            status: None,
        }
    }

    pub fn record_id(&self) -> &str {
        &self.record_id
    }

    pub fn baseline(&self) -> Option<&ExValue> {
        self.baseline.as_deref()
    }

    pub fn session(&self) -> Option<&EditSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut EditSession> {
        self.session.as_mut()
    }

    pub fn is_editing(&self) -> bool {
        self.session.is_some()
    }

    pub fn descriptors(&self) -> &DescriptorSet {
        &self.descriptors
    }

    pub fn page_error(&self) -> Option<&str> {
        self.page_error.as_deref()
    }

    pub fn edit_error(&self) -> Option<&str> {
        self.edit_error.as_deref()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Signal tied to this view; it resolves when the view is torn down.
    pub fn signal(&self) -> SurfaceSignal {
        self.lifetime.signal()
    }

    /// Handle that tears the view down from outside, also while a save is being awaited.
    /// The abandoned save leaves the session and baseline as they were.
    pub fn closer(&self) -> SurfaceLifetime {
        self.lifetime.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.lifetime.is_closed()
    }

    /// Tear the view down. In-flight saves are abandoned without touching local state.
    pub fn close(&mut self) {
        self.lifetime.close();
        self.session = None;
    }

    /// Fetch the baseline. A failed fetch leaves no baseline and no editor.
    ///
    /// A successful load replaces the baseline and closes any open editor, since its entries
    /// were projected from the previous record. Use `open_editor` to edit the new one.
    pub async fn load(&mut self, ctx: &SessionContext) -> Result<&ExValue, RemoteError> {
        match self.fetch(ctx).await {
            Ok(record) => {
                self.page_error = None;
                self.session = None;
                let baseline = self.baseline.insert(Arc::new(record));
                Ok(&**baseline)
            }
            Err(e) => {
                warn!(
                    entity = self.entity(),
                    id = %self.record_id,
                    error = %e,
                    "loading record failed"
                );
                self.page_error = Some(e.display_message());
                self.baseline = None;
                self.session = None;
                Err(e)
            }
        }
    }

    /// Open the inline editor against a freshly fetched baseline, discarding any previous session.
    ///
    /// Reopening a closed view starts a new lifetime; handles from `closer` taken before do
    /// not reach the reopened editor.
    pub async fn open_editor(
        &mut self,
        ctx: &SessionContext,
    ) -> Result<&mut EditSession, RemoteError> {
        self.session = None;
        if self.lifetime.is_closed() {
            self.lifetime = SurfaceLifetime::new();
        }
        self.load(ctx).await?;
        self.edit_error = None;
        let baseline = self.baseline.clone().unwrap_or_default();
        Ok(self.session.insert(EditSession::open(baseline, &self.descriptors)))
    }

    pub fn cancel_editor(&mut self) {
        self.session = None;
        self.edit_error = None;
    }

    /// The payload a save would send right now.
    pub fn pending_payload(&self) -> Result<Payload, SurfaceError> {
        let session = self.session.as_ref().ok_or(SurfaceError::NoSession)?;
        Ok(reconcile(session, &self.rules)?)
    }

    pub async fn save(
        &mut self,
        ctx: &SessionContext,
        policy: SavePolicy,
    ) -> Result<SaveOutcome, SurfaceError> {
        let payload = match self.pending_payload() {
            Ok(payload) => payload,
            Err(e) => {
                self.edit_error = Some(e.display_message());
                return Err(e);
            }
        };
        if payload.is_empty() {
            self.status = Some(statics::EN_STATUS_NOTHING_TO_SAVE.to_string());
            return Ok(SaveOutcome::NothingToSave);
        }

        let signal = self.lifetime.signal();
        let service = Arc::clone(self.invoker.service());
        let refresh_id = self.record_id.clone();
        let result = self
            .invoker
            .apply(ctx, &self.record_id, &payload, &signal, |_| async move {
                service.get(ctx, &refresh_id).await.map(unwrap_record)
            })
            .await;

        match result {
            Err(e) => {
                // The session stays exactly as the user left it, also when the view was closed.
                self.edit_error = Some(e.display_message());
                Err(SurfaceError::Apply(e))
            }
            Ok(Err(refresh_err)) => {
                warn!(
                    entity = self.entity(),
                    id = %self.record_id,
                    error = %refresh_err,
                    "saved but refresh failed"
                );
                self.session = None;
                self.baseline = None;
                self.edit_error = None;
                self.page_error = Some(refresh_err.display_message());
                Err(SurfaceError::Refresh(refresh_err))
            }
            Ok(Ok(record)) => {
                info!(
                    entity = self.entity(),
                    id = %self.record_id,
                    keys = payload.len(),
                    "saved record"
                );
                self.commit_saved(record, policy);
                Ok(SaveOutcome::Saved { payload })
            }
        }
    }

    fn commit_saved(&mut self, record: ExValue, policy: SavePolicy) {
        let baseline = Arc::new(record);
        let previous = self.session.take();
        self.session = match policy {
            SavePolicy::Close => None,
            SavePolicy::Reproject => Some(EditSession::open(baseline.clone(), &self.descriptors)),
            SavePolicy::KeepStaged => {
                let mut fresh = EditSession::open(baseline.clone(), &self.descriptors);
                if let Some(previous) = &previous {
                    fresh.adopt_staged(previous);
                }
                Some(fresh)
            }
        };
        self.baseline = Some(baseline);
        self.page_error = None;
        self.edit_error = None;
        self.status = Some(statics::EN_STATUS_SAVED.to_string());
    }

    async fn fetch(&self, ctx: &SessionContext) -> Result<ExValue, RemoteError> {
        let service = self.invoker.service();
        service.get(ctx, &self.record_id).await.map(unwrap_record)
    }

    fn entity(&self) -> &str {
        self.invoker.service().entity()
    }
}
