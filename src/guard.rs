use crate::error::RemoteError;
use crate::listing::{Listing, record_id};
use crate::remote::{EntityService, ListParams, SessionContext};
use crate::{ExValue, statics};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// False when the list could not be reloaded and the item was dropped locally instead.
    pub list_refreshed: bool,
}

/// A list with an optional selected item shown in a detail modal.
///
/// After a delete the list, the selection and the modal are updated together, so a removed
/// record is never reachable through a stale selection.
pub struct ListDetailGuard {
    service: Arc<dyn EntityService>,
    params: ListParams,
    items: Vec<ExValue>,
    total: usize,
    selection: Option<String>,
    modal_open: bool,
    error: Option<String>,
    status: Option<String>,
}

impl ListDetailGuard {
    pub fn new(service: Arc<dyn EntityService>, params: ListParams) -> Self {
        Self {
            service,
            params,
            items: Vec::new(),
            total: 0,
            selection: None,
            modal_open: false,
            error: None,
            status: None,
        }
    }

    pub fn items(&self) -> &[ExValue] {
        &self.items
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    /// The selected record, if it is still in the list.
    pub fn selected(&self) -> Option<&ExValue> {
        let id = self.selection.as_deref()?;
        self.find(id)
    }

    pub fn is_modal_open(&self) -> bool {
        self.modal_open
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub async fn refresh(&mut self, ctx: &SessionContext) -> Result<(), RemoteError> {
        match self.service.list(ctx, &self.params).await {
            Ok(response) => {
                self.replace(Listing::from_response(&response));
                self.error = None;
                Ok(())
            }
            Err(e) => {
                warn!(entity = self.service.entity(), error = %e, "loading list failed");
                self.error = Some(e.display_message());
                Err(e)
            }
        }
    }

    /// Select a listed record. Unknown ids leave the selection unchanged.
    pub fn select(&mut self, id: &str) -> bool {
        if self.find(id).is_none() {
            return false;
        }
        self.selection = Some(id.to_string());
        true
    }

    /// Select a record and open its detail modal.
    pub fn open(&mut self, id: &str) -> bool {
        let found = self.select(id);
        if found {
            self.modal_open = true;
            self.error = None;
        }
        found
    }

    pub fn close_modal(&mut self) {
        self.modal_open = false;
    }

    /// Delete a record, reload the list and drop every reference to it.
    ///
    /// On failure nothing local changes; the modal stays open with the error message.
    pub async fn delete(
        &mut self,
        ctx: &SessionContext,
        id: &str,
    ) -> Result<DeleteOutcome, RemoteError> {
        let entity = self.service.entity().to_string();
        if let Err(e) = self.service.delete(ctx, id).await {
            warn!(entity = %entity, id, error = %e, "delete failed");
            self.error = Some(format!(
                "{}: {}",
                statics::EN_ERR_DELETE_FAILED,
                e.display_message()
            ));
            return Err(e);
        }

        let reloaded = self.service.list(ctx, &self.params).await;
        let list_refreshed = reloaded.is_ok();
        match reloaded {
            Ok(response) => {
                self.replace(Listing::from_response(&response));
                self.error = None;
            }
            Err(e) => {
                warn!(
                    entity = %entity,
                    id,
                    error = %e,
                    "reload after delete failed, dropping item locally"
                );
                let before = self.items.len();
                self.items
                    .retain(|item| record_id(item).as_deref() != Some(id));
                self.total = self.total.saturating_sub(before - self.items.len());
                self.error = Some(e.display_message());
            }
        }
        if self.selection.as_deref() == Some(id) {
            self.selection = None;
            self.modal_open = false;
        }
        self.status = Some(statics::EN_STATUS_DELETED.to_string());
        info!(entity = %entity, id, list_refreshed, "deleted record");
        Ok(DeleteOutcome { list_refreshed })
    }

    fn replace(&mut self, listing: Listing) {
        self.total = listing.total();
        self.items = listing.into_items();
        // Keep a selection only while its record is still listed.
        let stale = self
            .selection
            .as_deref()
            .is_some_and(|id| self.find(id).is_none());
        if stale {
            self.selection = None;
            self.modal_open = false;
        }
    }

    fn find(&self, id: &str) -> Option<&ExValue> {
        self.items
            .iter()
            .find(|item| record_id(item).as_deref() == Some(id))
    }
}
