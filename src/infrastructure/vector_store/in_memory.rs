//! In-memory vector store for development and testing

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::embedding::cosine_similarity;
use crate::domain::tenant::TenantId;
use crate::domain::vector_store::{
    ChunkRecord, Payload, ScoredRecord, VectorStore, TENANT_PAYLOAD_KEY, TEXT_PAYLOAD_KEY,
};
use crate::domain::DomainError;

/// In-memory vector store for development without Qdrant.
///
/// Brute-force cosine scoring over every stored point, filtered on the same
/// tenant payload field the real store indexes.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    points: Arc<RwLock<Vec<StoredPoint>>>,
}

#[derive(Debug, Clone)]
struct StoredPoint {
    id: String,
    vector: Vec<f32>,
    payload: Payload,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a raw point with an arbitrary payload, for seeding collections
    /// that predate this writer's payload shape.
    pub async fn insert_raw(&self, id: impl Into<String>, vector: Vec<f32>, payload: Payload) {
        self.points.write().await.push(StoredPoint {
            id: id.into(),
            vector,
            payload,
        });
    }

    /// Number of stored points across all tenants
    pub async fn count(&self) -> usize {
        self.points.read().await.len()
    }

    /// Texts stored for one tenant, in insertion order
    pub async fn texts_for(&self, tenant_id: &TenantId) -> Vec<String> {
        self.points
            .read()
            .await
            .iter()
            .filter(|p| point_tenant(p) == Some(tenant_id.as_str().to_string()))
            .filter_map(|p| {
                p.payload
                    .get(TEXT_PAYLOAD_KEY)
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string())
            })
            .collect()
    }
}

fn point_tenant(point: &StoredPoint) -> Option<String> {
    point
        .payload
        .get(TENANT_PAYLOAD_KEY)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn ensure_collection(&self) -> Result<(), DomainError> {
        Ok(())
    }

    async fn upsert(&self, records: &[ChunkRecord]) -> Result<(), DomainError> {
        let mut points = self.points.write().await;

        for record in records {
            let stored = StoredPoint {
                id: record.id.clone(),
                vector: record.vector.clone(),
                payload: record.payload(),
            };

            match points.iter_mut().find(|p| p.id == stored.id) {
                Some(existing) => *existing = stored,
                None => points.push(stored),
            }
        }

        Ok(())
    }

    async fn search(
        &self,
        tenant_id: &TenantId,
        query_vector: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredRecord>, DomainError> {
        let points = self.points.read().await;

        let mut scored: Vec<ScoredRecord> = points
            .iter()
            .filter(|p| point_tenant(p) == Some(tenant_id.as_str().to_string()))
            .map(|p| ScoredRecord {
                id: p.id.clone(),
                score: cosine_similarity(&p.vector, query_vector),
                payload: p.payload.clone(),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);

        Ok(scored)
    }

    async fn sample_payloads(
        &self,
        tenant_id: &TenantId,
        limit: usize,
    ) -> Result<Vec<Payload>, DomainError> {
        let points = self.points.read().await;

        Ok(points
            .iter()
            .filter(|p| point_tenant(p) == Some(tenant_id.as_str().to_string()))
            .take(limit)
            .map(|p| p.payload.clone())
            .collect())
    }

    async fn delete_by_tenant(&self, tenant_id: &TenantId) -> Result<(), DomainError> {
        let mut points = self.points.write().await;
        points.retain(|p| point_tenant(p).as_deref() != Some(tenant_id.as_str()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant(id: &str) -> TenantId {
        TenantId::new(id).unwrap()
    }

    fn record(tenant_id: &TenantId, vector: Vec<f32>, text: &str) -> ChunkRecord {
        ChunkRecord::new(tenant_id.clone(), vector, text)
    }

    #[tokio::test]
    async fn test_search_is_tenant_scoped() {
        let store = InMemoryVectorStore::new();
        let a = tenant("tenant-a");
        let b = tenant("tenant-b");

        store
            .upsert(&[
                record(&a, vec![1.0, 0.0], "alpha text"),
                record(&b, vec![1.0, 0.0], "beta text"),
            ])
            .await
            .unwrap();

        let hits = store.search(&a, &[1.0, 0.0], 10).await.unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].payload.get("text").unwrap(), "alpha text");
    }

    #[tokio::test]
    async fn test_search_orders_by_similarity() {
        let store = InMemoryVectorStore::new();
        let t = tenant("acme");

        store
            .upsert(&[
                record(&t, vec![0.0, 1.0], "far"),
                record(&t, vec![1.0, 0.0], "near"),
                record(&t, vec![0.7, 0.7], "middle"),
            ])
            .await
            .unwrap();

        let hits = store.search(&t, &[1.0, 0.0], 2).await.unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].payload.get("text").unwrap(), "near");
        assert_eq!(hits[1].payload.get("text").unwrap(), "middle");
        assert!(hits[0].score >= hits[1].score);
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_id() {
        let store = InMemoryVectorStore::new();
        let t = tenant("acme");

        let mut rec = record(&t, vec![1.0, 0.0], "first");
        store.upsert(std::slice::from_ref(&rec)).await.unwrap();

        rec.text = "second".to_string();
        store.upsert(&[rec]).await.unwrap();

        assert_eq!(store.count().await, 1);
        assert_eq!(store.texts_for(&t).await, vec!["second"]);
    }

    #[tokio::test]
    async fn test_delete_by_tenant_leaves_others() {
        let store = InMemoryVectorStore::new();
        let a = tenant("a");
        let b = tenant("b");

        store
            .upsert(&[
                record(&a, vec![1.0, 0.0], "a1"),
                record(&a, vec![0.0, 1.0], "a2"),
                record(&b, vec![1.0, 0.0], "b1"),
            ])
            .await
            .unwrap();

        store.delete_by_tenant(&a).await.unwrap();

        assert_eq!(store.count().await, 1);
        assert!(store.search(&a, &[1.0, 0.0], 10).await.unwrap().is_empty());
        assert_eq!(store.search(&b, &[1.0, 0.0], 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_sample_payloads_respects_limit() {
        let store = InMemoryVectorStore::new();
        let t = tenant("acme");

        store
            .upsert(&[
                record(&t, vec![1.0, 0.0], "one"),
                record(&t, vec![0.0, 1.0], "two"),
                record(&t, vec![0.5, 0.5], "three"),
            ])
            .await
            .unwrap();

        let samples = store.sample_payloads(&t, 2).await.unwrap();
        assert_eq!(samples.len(), 2);
    }
}
