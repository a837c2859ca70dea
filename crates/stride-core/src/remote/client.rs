//! Remote document store client.
//!
//! The remote store is the authoritative copy of all user entities, laid
//! out as `users/{user_id}/{kind}/{entity_id}` documents. `RemoteStore` is
//! the trait seam the sync façade talks through; `HttpRemoteStore` is the
//! production implementation over the stride API.
//!
//! Contract notes shared by all implementations:
//! - `create` honors a caller-supplied id and behaves as an upsert when the
//!   id already exists; this is what makes write retries idempotent.
//! - `read` maps permission/authorization failures to an *empty* collection,
//!   so callers cannot distinguish "no data" from "not allowed".
//! - `delete` of a nonexistent document is not an error.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{header, Client};
use tracing::{debug, warn};

use crate::models::{generate_entity_id, EntityKind, EntityPatch, EntityPayload, EntityRecord};

use super::RemoteError;

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// What a caller hands to `create`: the payload, plus an optional
/// pre-chosen id (retries pass the id the local cache already shows).
#[derive(Debug, Clone)]
pub struct EntityDraft {
    pub id: Option<String>,
    pub payload: EntityPayload,
}

impl EntityDraft {
    pub fn new(payload: EntityPayload) -> Self {
        Self { id: None, payload }
    }

    pub fn with_id(id: impl Into<String>, payload: EntityPayload) -> Self {
        Self {
            id: Some(id.into()),
            payload,
        }
    }
}

/// CRUD against one user's remote collections.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Persist a new entity. Assigns an id when the draft has none, stamps
    /// `created_at`/`updated_at` with server-resolved time, and returns the
    /// full stored record. Creating over an existing id upserts.
    async fn create(&self, user_id: &str, draft: EntityDraft)
        -> Result<EntityRecord, RemoteError>;

    /// Full collection for one `(user, kind)`. Empty on permission failure.
    async fn read(&self, user_id: &str, kind: EntityKind)
        -> Result<Vec<EntityRecord>, RemoteError>;

    /// Field-level merge into an existing entity; re-stamps `updated_at`
    /// and returns the merged record.
    async fn update(
        &self,
        user_id: &str,
        kind: EntityKind,
        id: &str,
        patch: &EntityPatch,
    ) -> Result<EntityRecord, RemoteError>;

    /// Unconditional removal; non-existence is not an error.
    async fn delete(&self, user_id: &str, kind: EntityKind, id: &str) -> Result<(), RemoteError>;
}

/// Remote store client over the stride HTTP API.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpRemoteStore {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpRemoteStore {
    pub fn new(base_url: impl Into<String>) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Create a new client with the given bearer token, sharing the
    /// connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    fn collection_url(&self, user_id: &str, kind: EntityKind) -> String {
        format!("{}/users/{}/{}", self.base_url, user_id, kind.as_str())
    }

    fn document_url(&self, user_id: &str, kind: EntityKind, id: &str) -> String {
        format!("{}/{}", self.collection_url(user_id, kind), id)
    }

    fn auth_headers(&self) -> Result<header::HeaderMap, RemoteError> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = self.token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| RemoteError::InvalidResponse(e.to_string()))?,
            );
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, RemoteError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(RemoteError::from_status(status, &body))
        }
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn create(
        &self,
        user_id: &str,
        draft: EntityDraft,
    ) -> Result<EntityRecord, RemoteError> {
        let id = draft
            .id
            .unwrap_or_else(|| generate_entity_id(Utc::now()));
        let url = self.document_url(user_id, draft.payload.kind(), &id);

        debug!(user = user_id, kind = %draft.payload.kind(), id = %id, "Creating remote entity");

        let response = self
            .client
            .put(&url)
            .headers(self.auth_headers()?)
            .json(&draft.payload)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let record: EntityRecord = response.json().await?;
        Ok(record)
    }

    async fn read(
        &self,
        user_id: &str,
        kind: EntityKind,
    ) -> Result<Vec<EntityRecord>, RemoteError> {
        let url = self.collection_url(user_id, kind);

        let response = self
            .client
            .get(&url)
            .headers(self.auth_headers()?)
            .send()
            .await?;

        match Self::check_response(response).await {
            Ok(response) => {
                let records: Vec<EntityRecord> = response.json().await?;
                debug!(user = user_id, kind = %kind, count = records.len(), "Remote read");
                Ok(records)
            }
            Err(e) if e.is_permission_denied() => {
                // Indistinguishable from "no data" by contract.
                warn!(user = user_id, kind = %kind, error = %e, "Remote read denied, returning empty collection");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    async fn update(
        &self,
        user_id: &str,
        kind: EntityKind,
        id: &str,
        patch: &EntityPatch,
    ) -> Result<EntityRecord, RemoteError> {
        let url = self.document_url(user_id, kind, id);

        let response = self
            .client
            .patch(&url)
            .headers(self.auth_headers()?)
            .json(patch)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let record: EntityRecord = response.json().await?;
        Ok(record)
    }

    async fn delete(&self, user_id: &str, kind: EntityKind, id: &str) -> Result<(), RemoteError> {
        let url = self.document_url(user_id, kind, id);

        let response = self
            .client
            .delete(&url)
            .headers(self.auth_headers()?)
            .send()
            .await?;

        match Self::check_response(response).await {
            Ok(_) => Ok(()),
            // Already gone counts as deleted.
            Err(RemoteError::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
