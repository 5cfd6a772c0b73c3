//! Remote entity boundary.
//!
//! The console talks to its backend through one `EntityService` per entity type. Implementations
//! own the network layer (HTTP client, base URL, header handling); the editing core only relies on
//! the merge semantics of `update`: keys absent from the payload stay untouched server-side.

use crate::ExValue;
use crate::error::RemoteError;
use crate::reconcile::Payload;
use async_trait::async_trait;
use indexmap::IndexMap;

/// Credentials for one signed-in user, passed explicitly to every remote call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    token: Option<String>,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    /// Value for an `Authorization` header, if signed in.
    pub fn authorization(&self) -> Option<String> {
        self.token
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(|t| format!("Bearer {t}"))
    }
}

/// Query for list endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub filters: IndexMap<String, String>,
}

impl ListParams {
    pub fn page(page: u32, page_size: u32) -> Self {
        Self {
            page: Some(page),
            page_size: Some(page_size),
            filters: IndexMap::new(),
        }
    }

    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    /// Flattened query pairs in a stable order.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page".to_string(), page.to_string()));
        }
        if let Some(size) = self.page_size {
            pairs.push(("page_size".to_string(), size.to_string()));
        }
        pairs.extend(self.filters.iter().map(|(k, v)| (k.clone(), v.clone())));
        pairs
    }
}

/// User-implemented backend access for one entity type.
///
/// Responses are returned raw; callers normalize envelopes through
/// [`crate::listing::unwrap_record`] and [`crate::listing::Listing::from_response`].
#[async_trait]
pub trait EntityService: Send + Sync {
    /// Entity name, used in log fields.
    fn entity(&self) -> &str;

    async fn get(&self, ctx: &SessionContext, id: &str) -> Result<ExValue, RemoteError>;

    /// Merge-style partial update: only keys present in `payload` are written.
    async fn update(
        &self,
        ctx: &SessionContext,
        id: &str,
        payload: &Payload,
    ) -> Result<ExValue, RemoteError>;

    async fn delete(&self, ctx: &SessionContext, id: &str) -> Result<(), RemoteError>;

    async fn list(&self, ctx: &SessionContext, params: &ListParams)
    -> Result<ExValue, RemoteError>;
}
