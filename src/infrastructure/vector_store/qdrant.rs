//! Qdrant REST adapter
//!
//! Speaks the plain JSON API: one collection for all tenants, cosine
//! distance, and a keyword payload index on the tenant field so every read
//! and delete can filter by tenant server-side.

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::tenant::TenantId;
use crate::domain::vector_store::{
    ChunkRecord, Payload, ScoredRecord, VectorStore, TENANT_PAYLOAD_KEY,
};
use crate::domain::DomainError;
use crate::infrastructure::http_client::{HttpClientTrait, HttpError};

/// Qdrant-backed vector store
#[derive(Debug)]
pub struct QdrantVectorStore<C: HttpClientTrait> {
    client: C,
    base_url: String,
    collection: String,
    api_key: Option<String>,
    dimensions: usize,
}

impl<C: HttpClientTrait> QdrantVectorStore<C> {
    pub fn new(
        client: C,
        base_url: impl Into<String>,
        collection: impl Into<String>,
        dimensions: usize,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            collection: collection.into(),
            api_key: None,
            dimensions,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    fn collection_url(&self) -> String {
        format!("{}/collections/{}", self.base_url, self.collection)
    }

    fn index_url(&self) -> String {
        format!("{}/collections/{}/index", self.base_url, self.collection)
    }

    fn points_url(&self) -> String {
        format!("{}/collections/{}/points?wait=true", self.base_url, self.collection)
    }

    fn search_url(&self) -> String {
        format!("{}/collections/{}/points/search", self.base_url, self.collection)
    }

    fn scroll_url(&self) -> String {
        format!("{}/collections/{}/points/scroll", self.base_url, self.collection)
    }

    fn delete_url(&self) -> String {
        format!(
            "{}/collections/{}/points/delete?wait=true",
            self.base_url, self.collection
        )
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        let mut headers = vec![("Content-Type", "application/json")];
        if let Some(ref key) = self.api_key {
            headers.push(("api-key", key.as_str()));
        }
        headers
    }

    fn tenant_filter(tenant_id: &TenantId) -> serde_json::Value {
        serde_json::json!({
            "must": [{
                "key": TENANT_PAYLOAD_KEY,
                "match": { "value": tenant_id.as_str() }
            }]
        })
    }
}

/// Creation calls racing an existing collection or index come back as
/// conflicts; both count as the resource being there.
fn tolerate_existing(result: Result<serde_json::Value, HttpError>) -> Result<(), DomainError> {
    match result {
        Ok(_) => Ok(()),
        Err(HttpError::Status { status: 409, .. }) => Ok(()),
        Err(HttpError::Status { ref body, .. })
            if body.to_lowercase().contains("already exists") =>
        {
            Ok(())
        }
        Err(e) => Err(DomainError::vector_store(e.to_string())),
    }
}

#[async_trait]
impl<C: HttpClientTrait> VectorStore for QdrantVectorStore<C> {
    async fn ensure_collection(&self) -> Result<(), DomainError> {
        let body = serde_json::json!({
            "vectors": {
                "size": self.dimensions,
                "distance": "Cosine"
            }
        });
        tolerate_existing(
            self.client
                .put_json(&self.collection_url(), self.headers(), &body)
                .await,
        )?;

        let index_body = serde_json::json!({
            "field_name": TENANT_PAYLOAD_KEY,
            "field_schema": "keyword"
        });
        tolerate_existing(
            self.client
                .put_json(&self.index_url(), self.headers(), &index_body)
                .await,
        )?;

        tracing::debug!(collection = %self.collection, "vector collection ready");
        Ok(())
    }

    async fn upsert(&self, records: &[ChunkRecord]) -> Result<(), DomainError> {
        if records.is_empty() {
            return Ok(());
        }

        let points: Vec<serde_json::Value> = records
            .iter()
            .map(|record| {
                serde_json::json!({
                    "id": record.id,
                    "vector": record.vector,
                    "payload": record.payload(),
                })
            })
            .collect();

        let body = serde_json::json!({ "points": points });
        self.client
            .put_json(&self.points_url(), self.headers(), &body)
            .await
            .map_err(|e| DomainError::vector_store(e.to_string()))?;

        tracing::debug!(
            collection = %self.collection,
            points = records.len(),
            "upserted points"
        );
        Ok(())
    }

    async fn search(
        &self,
        tenant_id: &TenantId,
        query_vector: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredRecord>, DomainError> {
        let body = serde_json::json!({
            "vector": query_vector,
            "filter": Self::tenant_filter(tenant_id),
            "limit": limit,
            "with_payload": true,
        });

        let response = self
            .client
            .post_json(&self.search_url(), self.headers(), &body)
            .await
            .map_err(|e| DomainError::vector_store(e.to_string()))?;

        let parsed: SearchResponse = serde_json::from_value(response)
            .map_err(|e| DomainError::vector_store(format!("bad search response: {e}")))?;

        Ok(parsed
            .result
            .into_iter()
            .map(|hit| ScoredRecord {
                id: point_id_string(&hit.id),
                score: hit.score,
                payload: hit.payload.unwrap_or_default(),
            })
            .collect())
    }

    async fn sample_payloads(
        &self,
        tenant_id: &TenantId,
        limit: usize,
    ) -> Result<Vec<Payload>, DomainError> {
        let body = serde_json::json!({
            "filter": Self::tenant_filter(tenant_id),
            "limit": limit,
            "with_payload": true,
        });

        let response = self
            .client
            .post_json(&self.scroll_url(), self.headers(), &body)
            .await
            .map_err(|e| DomainError::vector_store(e.to_string()))?;

        let parsed: ScrollResponse = serde_json::from_value(response)
            .map_err(|e| DomainError::vector_store(format!("bad scroll response: {e}")))?;

        Ok(parsed
            .result
            .points
            .into_iter()
            .map(|point| point.payload.unwrap_or_default())
            .collect())
    }

    async fn delete_by_tenant(&self, tenant_id: &TenantId) -> Result<(), DomainError> {
        let body = serde_json::json!({
            "filter": Self::tenant_filter(tenant_id)
        });

        self.client
            .post_json(&self.delete_url(), self.headers(), &body)
            .await
            .map_err(|e| DomainError::vector_store(e.to_string()))?;

        tracing::debug!(tenant = %tenant_id, "deleted tenant points");
        Ok(())
    }
}

/// Point ids come back as strings or integers depending on who wrote them
fn point_id_string(id: &serde_json::Value) -> String {
    match id {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// Qdrant REST response types

#[derive(Debug, Deserialize)]
struct SearchResponse {
    result: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    id: serde_json::Value,
    score: f32,
    payload: Option<Payload>,
}

#[derive(Debug, Deserialize)]
struct ScrollResponse {
    result: ScrollResult,
}

#[derive(Debug, Deserialize)]
struct ScrollResult {
    points: Vec<ScrollPoint>,
}

#[derive(Debug, Deserialize)]
struct ScrollPoint {
    #[allow(dead_code)]
    id: serde_json::Value,
    payload: Option<Payload>,
}
