//! Training service - rebuilds a tenant's vector index from its knowledge

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{
    ChunkRecord, Chunker, DomainError, EmbeddingClient, KnowledgeStore, TenantId, VectorStore,
};

/// Texts per embedding request
const EMBED_BATCH_SIZE: usize = 64;

/// Outcome of a training run
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub chunks_indexed: usize,
    pub message: String,
}

impl TrainingOutcome {
    fn nothing_to_train() -> Self {
        Self {
            chunks_indexed: 0,
            message: "No documents or Q/A found for this tenant.".to_string(),
        }
    }

    fn completed(chunks_indexed: usize) -> Self {
        Self {
            chunks_indexed,
            message: format!("Training completed for {} chunks.", chunks_indexed),
        }
    }
}

/// Rebuilds a tenant's chunk index from its documents and manual Q/A pairs.
///
/// A run replaces everything the tenant had indexed before: all embeddings are
/// buffered in memory first, and only once every batch succeeded are the old
/// points deleted and the new ones upserted. An embedding failure therefore
/// leaves the previous index intact.
pub struct TrainingService {
    knowledge_store: Arc<dyn KnowledgeStore>,
    embedding: Arc<dyn EmbeddingClient>,
    vector_store: Arc<dyn VectorStore>,
    chunker: Chunker,
    tenant_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl std::fmt::Debug for TrainingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrainingService").finish()
    }
}

impl TrainingService {
    pub fn new(
        knowledge_store: Arc<dyn KnowledgeStore>,
        embedding: Arc<dyn EmbeddingClient>,
        vector_store: Arc<dyn VectorStore>,
        chunker: Chunker,
    ) -> Self {
        Self {
            knowledge_store,
            embedding,
            vector_store,
            chunker,
            tenant_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Retrains the tenant's index from its current documents and Q/A pairs.
    ///
    /// Concurrent calls for the same tenant are serialized; different tenants
    /// train independently.
    pub async fn train(&self, tenant_id: &TenantId) -> Result<TrainingOutcome, DomainError> {
        let lock = self.lock_for(tenant_id).await;
        let _guard = lock.lock().await;

        let documents = self.knowledge_store.list_documents(tenant_id).await?;
        let pairs = self.knowledge_store.list_manual_qa(tenant_id).await?;

        if documents.is_empty() && pairs.is_empty() {
            tracing::debug!(tenant_id = %tenant_id, "no knowledge to train");
            return Ok(TrainingOutcome::nothing_to_train());
        }

        let mut parts: Vec<String> = documents.iter().map(|d| d.raw_text.clone()).collect();
        parts.extend(pairs.iter().map(|qa| qa.as_training_text()));
        let corpus = parts.join(" ");

        let chunks = self.chunker.split(&corpus);
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();

        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(texts.len());
        for batch in texts.chunks(EMBED_BATCH_SIZE) {
            vectors.extend(self.embedding.embed(batch).await?);
        }

        let records: Vec<ChunkRecord> = texts
            .into_iter()
            .zip(vectors)
            .map(|(text, vector)| ChunkRecord::new(tenant_id.clone(), vector, text))
            .collect();

        self.vector_store.delete_by_tenant(tenant_id).await?;
        self.vector_store.upsert(&records).await?;

        tracing::info!(
            tenant_id = %tenant_id,
            documents = documents.len(),
            manual_qa = pairs.len(),
            chunks = records.len(),
            "training completed"
        );

        Ok(TrainingOutcome::completed(records.len()))
    }

    async fn lock_for(&self, tenant_id: &TenantId) -> Arc<Mutex<()>> {
        let mut locks = self.tenant_locks.lock().await;
        locks
            .entry(tenant_id.as_str().to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::embedding::mock::MockEmbeddingClient;
    use crate::domain::{Document, InMemoryKnowledgeStore, ManualQa};
    use crate::infrastructure::vector_store::InMemoryVectorStore;

    fn tenant(id: &str) -> TenantId {
        TenantId::new(id).unwrap()
    }

    fn service(
        store: Arc<dyn KnowledgeStore>,
        vectors: Arc<InMemoryVectorStore>,
    ) -> TrainingService {
        TrainingService::new(
            store,
            Arc::new(MockEmbeddingClient::new(8)),
            vectors,
            Chunker::new(Default::default()).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_empty_tenant_is_nothing_to_train() {
        let vectors = Arc::new(InMemoryVectorStore::new());
        let svc = service(Arc::new(InMemoryKnowledgeStore::new()), vectors.clone());

        let outcome = svc.train(&tenant("acme")).await.unwrap();

        assert_eq!(outcome.chunks_indexed, 0);
        assert!(outcome.message.contains("No documents or Q/A"));
        assert_eq!(vectors.count().await, 0);
    }

    #[tokio::test]
    async fn test_train_indexes_document_chunks() {
        let t = tenant("acme");
        let store = InMemoryKnowledgeStore::new()
            .with_document(Document::new(t.clone(), "hours.pdf", "We open at nine."));
        let vectors = Arc::new(InMemoryVectorStore::new());
        let svc = service(Arc::new(store), vectors.clone());

        let outcome = svc.train(&t).await.unwrap();

        assert_eq!(outcome.chunks_indexed, 1);
        assert!(outcome.message.contains("1 chunks"));
        let texts = vectors.texts_for(&t).await;
        assert_eq!(texts, vec!["We open at nine.".to_string()]);
    }

    #[tokio::test]
    async fn test_train_includes_manual_qa_in_corpus() {
        let t = tenant("acme");
        let store = InMemoryKnowledgeStore::new().with_manual_qa(ManualQa::new(
            t.clone(),
            "What are your hours?",
            "Nine to five.",
        ));
        let vectors = Arc::new(InMemoryVectorStore::new());
        let svc = service(Arc::new(store), vectors.clone());

        let outcome = svc.train(&t).await.unwrap();

        assert_eq!(outcome.chunks_indexed, 1);
        let texts = vectors.texts_for(&t).await;
        assert!(texts[0].contains("Q: What are your hours?"));
        assert!(texts[0].contains("A: Nine to five."));
    }

    #[tokio::test]
    async fn test_retrain_replaces_previous_chunks() {
        let t = tenant("acme");
        let store = Arc::new(InMemoryKnowledgeStore::new());
        let vectors = Arc::new(InMemoryVectorStore::new());
        let svc = service(store.clone(), vectors.clone());

        let first = store
            .insert_document(Document::new(t.clone(), "old.pdf", "The old opening hours."))
            .await
            .unwrap();
        svc.train(&t).await.unwrap();
        assert_eq!(vectors.texts_for(&t).await, vec!["The old opening hours.".to_string()]);

        store.delete_document(first.id).await.unwrap();
        store
            .insert_document(Document::new(t.clone(), "new.pdf", "The new opening hours."))
            .await
            .unwrap();
        svc.train(&t).await.unwrap();

        assert_eq!(vectors.texts_for(&t).await, vec!["The new opening hours.".to_string()]);
    }

    #[tokio::test]
    async fn test_embedding_failure_leaves_index_untouched() {
        let t = tenant("acme");
        let store = InMemoryKnowledgeStore::new()
            .with_document(Document::new(t.clone(), "doc.pdf", "Some knowledge."));
        let vectors = Arc::new(InMemoryVectorStore::new());
        vectors
            .insert_raw(
                "existing",
                vec![0.0; 8],
                serde_json::json!({"tenant_id": "acme", "text": "previous chunk"})
                    .as_object()
                    .unwrap()
                    .clone(),
            )
            .await;

        let svc = TrainingService::new(
            Arc::new(store),
            Arc::new(MockEmbeddingClient::new(8).with_error("quota exceeded")),
            vectors.clone(),
            Chunker::new(Default::default()).unwrap(),
        );

        let err = svc.train(&t).await.unwrap_err();

        assert!(matches!(err, DomainError::EmbeddingService { .. }));
        assert_eq!(vectors.count().await, 1);
        assert_eq!(vectors.texts_for(&t).await, vec!["previous chunk".to_string()]);
    }

    #[tokio::test]
    async fn test_training_one_tenant_leaves_others_alone() {
        let a = tenant("acme");
        let b = tenant("globex");
        let store = Arc::new(
            InMemoryKnowledgeStore::new()
                .with_document(Document::new(a.clone(), "a.pdf", "Acme facts."))
                .with_document(Document::new(b.clone(), "b.pdf", "Globex facts.")),
        );
        let vectors = Arc::new(InMemoryVectorStore::new());
        let svc = service(store, vectors.clone());

        svc.train(&a).await.unwrap();
        svc.train(&b).await.unwrap();
        svc.train(&a).await.unwrap();

        assert_eq!(vectors.texts_for(&a).await, vec!["Acme facts.".to_string()]);
        assert_eq!(vectors.texts_for(&b).await, vec!["Globex facts.".to_string()]);
    }
}
