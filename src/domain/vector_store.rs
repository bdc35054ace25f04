//! Vector store trait and record types

use async_trait::async_trait;
use std::fmt::Debug;
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::tenant::TenantId;

/// Payload field holding the owning tenant id on every point
pub const TENANT_PAYLOAD_KEY: &str = "tenant_id";

/// Payload field this system writes chunk text under
pub const TEXT_PAYLOAD_KEY: &str = "text";

/// Arbitrary point payload as stored in the collection.
///
/// Read paths treat payloads as heterogeneous maps because collections may
/// hold points written by earlier ingestion tools with different text keys.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// A chunk ready for indexing: freshly minted point id, embedding vector and
/// the payload fields written alongside it.
#[derive(Debug, Clone)]
pub struct ChunkRecord {
    pub id: String,
    pub vector: Vec<f32>,
    pub tenant_id: TenantId,
    pub text: String,
}

impl ChunkRecord {
    /// Create a record with a fresh uuid point id
    pub fn new(tenant_id: TenantId, vector: Vec<f32>, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            vector,
            tenant_id,
            text: text.into(),
        }
    }

    /// Payload map written with this point
    pub fn payload(&self) -> Payload {
        let mut payload = Payload::new();
        payload.insert(
            TENANT_PAYLOAD_KEY.to_string(),
            serde_json::Value::String(self.tenant_id.to_string()),
        );
        payload.insert(
            TEXT_PAYLOAD_KEY.to_string(),
            serde_json::Value::String(self.text.clone()),
        );
        payload
    }
}

/// A search hit with its similarity score and stored payload
#[derive(Debug, Clone)]
pub struct ScoredRecord {
    pub id: String,
    pub score: f32,
    pub payload: Payload,
}

/// Tenant-partitioned vector storage.
///
/// One logical collection holds all tenants' points; every operation that
/// reads or deletes is filtered on the tenant payload field.
#[async_trait]
pub trait VectorStore: Send + Sync + Debug {
    /// Create the collection and tenant payload index if missing. Idempotent.
    async fn ensure_collection(&self) -> Result<(), DomainError>;

    /// Index a batch of chunk records
    async fn upsert(&self, records: &[ChunkRecord]) -> Result<(), DomainError>;

    /// K nearest points for one tenant by cosine similarity
    async fn search(
        &self,
        tenant_id: &TenantId,
        query_vector: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredRecord>, DomainError>;

    /// A few stored payloads for one tenant, no ordering guarantee
    async fn sample_payloads(
        &self,
        tenant_id: &TenantId,
        limit: usize,
    ) -> Result<Vec<Payload>, DomainError>;

    /// Remove every point belonging to one tenant
    async fn delete_by_tenant(&self, tenant_id: &TenantId) -> Result<(), DomainError>;
}
