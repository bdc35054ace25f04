//! Knowledge service - document upload and manual Q/A curation

use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{
    Document, DocumentFormat, DocumentSummary, DomainError, KnowledgeStore, ManualQa, TenantId,
    VectorStore,
};
use crate::infrastructure::ingestion::extract_text;

/// Result of deleting a document or Q/A pair
#[derive(Debug, Clone)]
pub struct DeletionOutcome {
    pub message: String,
}

/// Manages a tenant's uploaded documents and curated Q/A pairs.
///
/// Deleting either kind of record wipes all of the tenant's vectors, so the
/// index never serves chunks derived from removed knowledge. The wipe is
/// best-effort; the caller is told to retrain either way.
pub struct KnowledgeService {
    knowledge_store: Arc<dyn KnowledgeStore>,
    vector_store: Arc<dyn VectorStore>,
}

impl std::fmt::Debug for KnowledgeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeService").finish()
    }
}

impl KnowledgeService {
    pub fn new(knowledge_store: Arc<dyn KnowledgeStore>, vector_store: Arc<dyn VectorStore>) -> Self {
        Self {
            knowledge_store,
            vector_store,
        }
    }

    /// Extracts text from an uploaded file and stores it as a document.
    ///
    /// The format is decided by file extension before any bytes are parsed;
    /// unsupported extensions fail fast.
    pub async fn upload_document(
        &self,
        tenant_id: TenantId,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<Document, DomainError> {
        let format = DocumentFormat::from_file_name(file_name)?;
        let text = extract_text(bytes, format)?;

        let document = Document::new(tenant_id, file_name, text);
        let stored = self.knowledge_store.insert_document(document).await?;

        tracing::info!(
            tenant_id = %stored.tenant_id,
            document_id = %stored.id,
            file_name = %stored.file_name,
            chars = stored.raw_text.chars().count(),
            "document uploaded"
        );

        Ok(stored)
    }

    pub async fn list_documents(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Vec<DocumentSummary>, DomainError> {
        let documents = self.knowledge_store.list_documents(tenant_id).await?;
        Ok(documents.iter().map(DocumentSummary::from).collect())
    }

    /// Deletes a document and wipes the owning tenant's vectors.
    pub async fn delete_document(&self, id: Uuid) -> Result<DeletionOutcome, DomainError> {
        let document = self
            .knowledge_store
            .get_document(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Knowledge file '{}' not found", id)))?;

        self.knowledge_store.delete_document(id).await?;
        self.wipe_tenant_vectors(&document.tenant_id).await;

        Ok(DeletionOutcome {
            message: format!(
                "Deleted knowledge file '{}'. All vectors for this tenant were removed; train again to rebuild the index.",
                document.file_name
            ),
        })
    }

    /// Stores a curated question/answer pair for the tenant.
    pub async fn add_manual_qa(
        &self,
        tenant_id: TenantId,
        question: &str,
        answer: &str,
    ) -> Result<ManualQa, DomainError> {
        if question.trim().is_empty() {
            return Err(DomainError::validation("Question must not be empty"));
        }
        if answer.trim().is_empty() {
            return Err(DomainError::validation("Answer must not be empty"));
        }

        let qa = ManualQa::new(tenant_id, question.trim(), answer.trim());
        self.knowledge_store.insert_manual_qa(qa).await
    }

    /// The tenant's pairs, most recent first.
    pub async fn list_manual_qa(&self, tenant_id: &TenantId) -> Result<Vec<ManualQa>, DomainError> {
        self.knowledge_store.list_manual_qa(tenant_id).await
    }

    /// Deletes a Q/A pair and wipes the owning tenant's vectors.
    pub async fn delete_manual_qa(&self, id: Uuid) -> Result<DeletionOutcome, DomainError> {
        let qa = self
            .knowledge_store
            .get_manual_qa(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Q/A entry '{}' not found", id)))?;

        self.knowledge_store.delete_manual_qa(id).await?;
        self.wipe_tenant_vectors(&qa.tenant_id).await;

        Ok(DeletionOutcome {
            message: "Deleted Q/A pair. All vectors for this tenant were removed; train again to rebuild the index.".to_string(),
        })
    }

    /// Best-effort removal of every vector the tenant has indexed. The
    /// durable delete has already happened, so a vector-store failure is
    /// logged rather than propagated.
    async fn wipe_tenant_vectors(&self, tenant_id: &TenantId) {
        if let Err(e) = self.vector_store.delete_by_tenant(tenant_id).await {
            tracing::warn!(tenant_id = %tenant_id, error = %e, "failed to wipe tenant vectors");
        }
    }
}
