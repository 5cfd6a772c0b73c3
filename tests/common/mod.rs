#![allow(dead_code)]

use async_trait::async_trait;
use exportdesk::{EntityService, ExValue, ListParams, Payload, RemoteError, SessionContext, statics};
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateCall {
    pub id: String,
    pub payload: Payload,
}

#[derive(Default)]
struct MemoryInner {
    records: IndexMap<String, ExValue>,
    updates: Vec<UpdateCall>,
    deletes: Vec<String>,
    gets: usize,
    lists: usize,
    update_error: Option<RemoteError>,
    update_error_ids: Vec<String>,
    get_error: Option<RemoteError>,
    list_error: Option<RemoteError>,
    delete_error: Option<RemoteError>,
    update_gate: Option<Arc<Notify>>,
    require_token: bool,
    wrap_records: bool,
}

/// In-memory backend with merge-style updates and failure injection.
pub struct MemoryService {
    entity: String,
    inner: Mutex<MemoryInner>,
}

impl MemoryService {
    pub fn new(entity: &str) -> Arc<Self> {
        Arc::new(Self {
            entity: entity.to_string(),
            inner: Mutex::new(MemoryInner::default()),
        })
    }

    pub fn with_records(entity: &str, records: Vec<serde_json::Value>) -> Arc<Self> {
        let service = Self::new(entity);
        for record in records {
            service.put(record);
        }
        service
    }

    pub fn put(&self, record: serde_json::Value) {
        let record = ExValue::from(record);
        let id = exportdesk::listing::record_id(&record).expect("fixture record has an id");
        self.inner.lock().records.insert(id, record);
    }

    pub fn record(&self, id: &str) -> Option<ExValue> {
        self.inner.lock().records.get(id).cloned()
    }

    /// Ids in `order_index` order, as the backend would list them.
    pub fn canonical_order(&self) -> Vec<String> {
        let inner = self.inner.lock();
        let mut rows: Vec<(i64, String)> = inner
            .records
            .iter()
            .map(|(id, r)| {
                let idx = r
                    .get(statics::REC_FIELD_ORDER_INDEX)
                    .and_then(ExValue::as_i64)
                    .unwrap_or(0);
                (idx, id.clone())
            })
            .collect();
        rows.sort_by_key(|(idx, _)| *idx);
        rows.into_iter().map(|(_, id)| id).collect()
    }

    pub fn updates(&self) -> Vec<UpdateCall> {
        self.inner.lock().updates.clone()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.inner.lock().deletes.clone()
    }

    pub fn get_count(&self) -> usize {
        self.inner.lock().gets
    }

    pub fn list_count(&self) -> usize {
        self.inner.lock().lists
    }

    pub fn fail_updates(&self, err: Option<RemoteError>) {
        self.inner.lock().update_error = err;
    }

    pub fn fail_update_of(&self, id: &str) {
        self.inner.lock().update_error_ids.push(id.to_string());
    }

    pub fn fail_gets(&self, err: Option<RemoteError>) {
        self.inner.lock().get_error = err;
    }

    pub fn fail_lists(&self, err: Option<RemoteError>) {
        self.inner.lock().list_error = err;
    }

    pub fn fail_deletes(&self, err: Option<RemoteError>) {
        self.inner.lock().delete_error = err;
    }

    /// Hold every update until the returned gate is notified.
    pub fn gate_updates(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.inner.lock().update_gate = Some(gate.clone());
        gate
    }

    pub fn require_token(&self) {
        self.inner.lock().require_token = true;
    }

    /// Answer `get`/`update` with `{success, data}` envelopes.
    pub fn wrap_records(&self) {
        self.inner.lock().wrap_records = true;
    }

    fn check_auth(&self, ctx: &SessionContext) -> Result<(), RemoteError> {
        if self.inner.lock().require_token && ctx.authorization().is_none() {
            return Err(RemoteError::Unauthorized);
        }
        Ok(())
    }

    fn respond(&self, record: ExValue) -> ExValue {
        if self.inner.lock().wrap_records {
            let mut envelope = IndexMap::new();
            envelope.insert(statics::API_SUCCESS.to_string(), ExValue::Bool(true));
            envelope.insert(statics::API_DATA.to_string(), record);
            ExValue::Object(envelope)
        } else {
            record
        }
    }
}

#[async_trait]
impl EntityService for MemoryService {
    fn entity(&self) -> &str {
        &self.entity
    }

    async fn get(&self, ctx: &SessionContext, id: &str) -> Result<ExValue, RemoteError> {
        self.check_auth(ctx)?;
        let record = {
            let mut inner = self.inner.lock();
            inner.gets += 1;
            if let Some(err) = inner.get_error.clone() {
                return Err(err);
            }
            inner.records.get(id).cloned().ok_or(RemoteError::NotFound)?
        };
        Ok(self.respond(record))
    }

    async fn update(
        &self,
        ctx: &SessionContext,
        id: &str,
        payload: &Payload,
    ) -> Result<ExValue, RemoteError> {
        self.check_auth(ctx)?;
        let gate = {
            let mut inner = self.inner.lock();
            inner.updates.push(UpdateCall {
                id: id.to_string(),
                payload: payload.clone(),
            });
            inner.update_gate.clone()
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let record = {
            let mut inner = self.inner.lock();
            if let Some(err) = inner.update_error.clone() {
                return Err(err);
            }
            if inner.update_error_ids.iter().any(|f| f == id) {
                return Err(RemoteError::rejected(
                    400,
                    ExValue::from(json!({ "error": format!("cannot update {id}") })),
                ));
            }
            let stored = inner.records.get_mut(id).ok_or(RemoteError::NotFound)?;
            let Some(fields) = stored.as_object_mut() else {
                return Err(RemoteError::Transport("stored record is not an object".into()));
            };
            // Merge semantics: only keys present in the payload are written.
            for (key, value) in payload.as_map() {
                fields.insert(key.clone(), value.clone());
            }
            stored.clone()
        };
        Ok(self.respond(record))
    }

    async fn delete(&self, ctx: &SessionContext, id: &str) -> Result<(), RemoteError> {
        self.check_auth(ctx)?;
        let mut inner = self.inner.lock();
        if let Some(err) = inner.delete_error.clone() {
            return Err(err);
        }
        inner.records.shift_remove(id).ok_or(RemoteError::NotFound)?;
        inner.deletes.push(id.to_string());
        Ok(())
    }

    async fn list(
        &self,
        ctx: &SessionContext,
        params: &ListParams,
    ) -> Result<ExValue, RemoteError> {
        self.check_auth(ctx)?;
        let mut inner = self.inner.lock();
        inner.lists += 1;
        if let Some(err) = inner.list_error.clone() {
            return Err(err);
        }
        let size = params.page_size.unwrap_or(statics::DEFAULT_PAGE_SIZE) as usize;
        let page = params.page.unwrap_or(1).max(1) as usize;
        let count = inner.records.len();
        let results: Vec<ExValue> = inner
            .records
            .values()
            .skip((page - 1) * size)
            .take(size)
            .cloned()
            .collect();

        let mut body = IndexMap::new();
        body.insert(statics::API_RESULTS.to_string(), ExValue::Array(results));
        body.insert(statics::API_COUNT.to_string(), ExValue::from(count as i64));
        Ok(ExValue::Object(body))
    }
}

pub fn ctx() -> SessionContext {
    SessionContext::with_token("test-token")
}
