//! Optimistic up/down reordering of an `order_index`-sorted list.
//!
//! A move swaps two neighbours locally and renders at once, persists both new indices, then
//! always replaces the list with the backend's order. No path ends with an unconfirmed local
//! order: if the final re-fetch fails too, the order from before the move is restored.

use crate::error::RemoteError;
use crate::listing::{Listing, record_id};
use crate::reconcile::Payload;
use crate::remote::{EntityService, ListParams, SessionContext};
use crate::{ExValue, statics};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReorderPhase {
    #[default]
    Idle,
    OptimisticApplied,
    Persisting,
    Reconciling,
    RollingBack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderedItem {
    pub id: String,
    pub order_index: i64,
    pub record: ExValue,
}

impl OrderedItem {
    /// Records without an id cannot be reordered and yield `None`.
    pub fn from_record(record: ExValue) -> Option<Self> {
        let id = record_id(&record)?;
        let order_index = match record.get(statics::REC_FIELD_ORDER_INDEX) {
            Some(ExValue::String(s)) => s.trim().parse().unwrap_or(0),
            Some(v) => v.as_i64().unwrap_or(0),
            None => 0,
        };
        Some(Self {
            id,
            order_index,
            record,
        })
    }
}

/// Called on every phase transition with the list as it should be drawn.
pub type RenderCallback = dyn Fn(ReorderPhase, &[OrderedItem]) + Send + Sync;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReorderOutcome {
    /// Out of bounds; nothing was sent.
    NoOp,
    /// Both updates stored and the list reloaded.
    Reconciled,
    /// Something failed; the list shows the backend's (or the previous) order.
    RolledBack { message: String },
}

pub struct ReorderController {
    service: Arc<dyn EntityService>,
    params: ListParams,
    items: Vec<OrderedItem>,
    phase: ReorderPhase,
    error: Option<String>,
    render: Option<Box<RenderCallback>>,
}

impl ReorderController {
    pub fn new(service: Arc<dyn EntityService>, params: ListParams) -> Self {
        Self {
            service,
            params,
            items: Vec::new(),
            phase: ReorderPhase::Idle,
            error: None,
            render: None,
        }
    }

    pub fn with_render(
        mut self,
        render: impl Fn(ReorderPhase, &[OrderedItem]) + Send + Sync + 'static,
    ) -> Self {
        self.render = Some(Box::new(render));
        self
    }

    pub fn items(&self) -> &[OrderedItem] {
        &self.items
    }

    pub fn ids(&self) -> Vec<&str> {
        self.items.iter().map(|i| i.id.as_str()).collect()
    }

    pub fn phase(&self) -> ReorderPhase {
        self.phase
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Replace the list with the backend's order.
    pub async fn refresh(&mut self, ctx: &SessionContext) -> Result<(), RemoteError> {
        match self.fetch(ctx).await {
            Ok(items) => {
                self.items = items;
                self.error = None;
                self.render();
                Ok(())
            }
            Err(e) => {
                warn!(entity = self.service.entity(), error = %e, "loading list failed");
                self.error = Some(e.display_message());
                Err(e)
            }
        }
    }

    pub async fn move_up(&mut self, ctx: &SessionContext, index: usize) -> ReorderOutcome {
        self.move_item(ctx, index, MoveDirection::Up).await
    }

    pub async fn move_down(&mut self, ctx: &SessionContext, index: usize) -> ReorderOutcome {
        self.move_item(ctx, index, MoveDirection::Down).await
    }

    pub async fn move_item(
        &mut self,
        ctx: &SessionContext,
        index: usize,
        direction: MoveDirection,
    ) -> ReorderOutcome {
        let target = match direction {
            MoveDirection::Up => index.checked_sub(1),
            MoveDirection::Down => index.checked_add(1),
        };
        let Some(target) = target.filter(|t| *t < self.items.len() && index < self.items.len())
        else {
            return ReorderOutcome::NoOp;
        };

        let snapshot = self.items.clone();
        self.error = None;

        // Swap the indices and the positions so equal indices still move visibly.
        let moved = self.items[index].order_index;
        self.items[index].order_index = self.items[target].order_index;
        self.items[target].order_index = moved;
        let first = (self.items[index].id.clone(), self.items[index].order_index);
        let second = (self.items[target].id.clone(), self.items[target].order_index);
        self.items.swap(index, target);
        self.items.sort_by_key(|item| item.order_index);
        self.transition(ReorderPhase::OptimisticApplied);

        let first_payload = Payload::single(statics::REC_FIELD_ORDER_INDEX, first.1);
        let second_payload = Payload::single(statics::REC_FIELD_ORDER_INDEX, second.1);

        self.transition(ReorderPhase::Persisting);
        debug!(a = %first.0, b = %second.0, "persisting swapped order");
        let (a, b) = tokio::join!(
            self.service.update(ctx, &first.0, &first_payload),
            self.service.update(ctx, &second.0, &second_payload),
        );
        let failure = a.err().or(b.err());

        let phase = if failure.is_some() {
            ReorderPhase::RollingBack
        } else {
            ReorderPhase::Reconciling
        };
        self.transition(phase);

        let reloaded = self.fetch(ctx).await;
        let outcome = match (failure, reloaded) {
            (None, Ok(items)) => {
                self.items = items;
                info!(entity = self.service.entity(), "reorder stored");
                ReorderOutcome::Reconciled
            }
            (Some(e), Ok(items)) => {
                warn!(entity = self.service.entity(), error = %e, "reorder failed, list reloaded");
                self.items = items;
                self.fail(statics::EN_ERR_REORDER_FAILED)
            }
            (failure, Err(e)) => {
                warn!(
                    entity = self.service.entity(),
                    persist_failed = failure.is_some(),
                    error = %e,
                    "reloading after reorder failed, restoring previous order"
                );
                self.items = snapshot;
                self.fail(statics::EN_ERR_REORDER_RELOAD_FAILED)
            }
        };
        self.transition(ReorderPhase::Idle);
        outcome
    }

    fn fail(&mut self, message: &str) -> ReorderOutcome {
        self.error = Some(message.to_string());
        ReorderOutcome::RolledBack {
            message: message.to_string(),
        }
    }

    fn transition(&mut self, phase: ReorderPhase) {
        debug!(entity = self.service.entity(), phase = ?phase, "reorder phase");
        self.phase = phase;
        self.render();
    }

    fn render(&self) {
        if let Some(render) = &self.render {
            render(self.phase, &self.items);
        }
    }

    async fn fetch(&self, ctx: &SessionContext) -> Result<Vec<OrderedItem>, RemoteError> {
        let response = self.service.list(ctx, &self.params).await?;
        let mut items: Vec<OrderedItem> = Listing::from_response(&response)
            .into_items()
            .into_iter()
            .filter_map(OrderedItem::from_record)
            .collect();
        items.sort_by_key(|item| item.order_index);
        Ok(items)
    }
}
