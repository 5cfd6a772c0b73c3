use crate::ExValue;
use crate::error::ApplyError;
use crate::lifetime::SurfaceSignal;
use crate::reconcile::Payload;
use crate::remote::{EntityService, SessionContext};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

/// Sends reconciled payloads and hands the stored record to a completion step.
///
/// The invoker never touches an edit session. On failure the caller's session is exactly as
/// it was, so the user can retry without re-entering anything.
#[derive(Clone)]
pub struct PatchInvoker {
    service: Arc<dyn EntityService>,
}

impl PatchInvoker {
    pub fn new(service: Arc<dyn EntityService>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &Arc<dyn EntityService> {
        &self.service
    }

    /// Issue `update(id, payload)`; on success run `on_complete` with the backend's response
    /// and return its output. Both awaits race the surface signal.
    pub async fn apply<F, Fut, T>(
        &self,
        ctx: &SessionContext,
        id: &str,
        payload: &Payload,
        signal: &SurfaceSignal,
        on_complete: F,
    ) -> Result<T, ApplyError>
    where
        F: FnOnce(ExValue) -> Fut,
        Fut: Future<Output = T>,
    {
        let entity = self.service.entity();
        if signal.is_closed() {
            return Err(ApplyError::Cancelled);
        }

        debug!(entity, id, keys = payload.len(), "applying partial update");
        let updated = tokio::select! {
            biased;
            _ = signal.closed() => {
                warn!(entity, id, "surface closed while update was in flight");
                return Err(ApplyError::Cancelled);
            }
            res = self.service.update(ctx, id, payload) => res,
        };

        let updated = match updated {
            Ok(record) => record,
            Err(source) => {
                let err = ApplyError::from_remote(source);
                warn!(entity, id, error = %err, "partial update failed");
                return Err(err);
            }
        };

        tokio::select! {
            biased;
            _ = signal.closed() => {
                warn!(entity, id, "surface closed before refresh completed");
                Err(ApplyError::Cancelled)
            }
            out = on_complete(updated) => Ok(out),
        }
    }
}
