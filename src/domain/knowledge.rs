//! Knowledge entities and the persistence trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::tenant::TenantId;

/// An uploaded document with its extracted text.
///
/// Immutable after upload. The raw text is the source material for training;
/// derived vector points are regenerated on every training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub file_name: String,
    pub raw_text: String,
    pub created_at: DateTime<Utc>,
}

impl Document {
    /// Create a new document with a fresh id and timestamp
    pub fn new(tenant_id: TenantId, file_name: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            file_name: file_name.into(),
            raw_text: raw_text.into(),
            created_at: Utc::now(),
        }
    }
}

/// Listing view of a document without its text body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: Uuid,
    pub file_name: String,
    pub text_chars: usize,
    pub created_at: DateTime<Utc>,
}

impl From<&Document> for DocumentSummary {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id,
            file_name: doc.file_name.clone(),
            text_chars: doc.raw_text.chars().count(),
            created_at: doc.created_at,
        }
    }
}

/// A curated question/answer pair.
///
/// Consulted before any retrieval at query time and folded into the training
/// corpus as `Q: ...\nA: ...` text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualQa {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub question: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

impl ManualQa {
    /// Create a new pair with a fresh id and timestamp
    pub fn new(
        tenant_id: TenantId,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            question: question.into(),
            answer: answer.into(),
            created_at: Utc::now(),
        }
    }

    /// Training-corpus rendering of this pair
    pub fn as_training_text(&self) -> String {
        format!("Q: {}\nA: {}", self.question, self.answer)
    }
}

/// Repository trait for documents and manual Q/A pairs
#[async_trait]
pub trait KnowledgeStore: Send + Sync + std::fmt::Debug {
    /// Persist a document
    async fn insert_document(&self, document: Document) -> Result<Document, DomainError>;

    /// Get a document by id
    async fn get_document(&self, id: Uuid) -> Result<Option<Document>, DomainError>;

    /// All documents for a tenant, most recent first
    async fn list_documents(&self, tenant_id: &TenantId) -> Result<Vec<Document>, DomainError>;

    /// Delete a document by id, returning whether it existed
    async fn delete_document(&self, id: Uuid) -> Result<bool, DomainError>;

    /// Persist a manual Q/A pair
    async fn insert_manual_qa(&self, qa: ManualQa) -> Result<ManualQa, DomainError>;

    /// Get a manual Q/A pair by id
    async fn get_manual_qa(&self, id: Uuid) -> Result<Option<ManualQa>, DomainError>;

    /// All manual pairs for a tenant, most recent first
    async fn list_manual_qa(&self, tenant_id: &TenantId) -> Result<Vec<ManualQa>, DomainError>;

    /// Delete a manual pair by id, returning whether it existed
    async fn delete_manual_qa(&self, id: Uuid) -> Result<bool, DomainError>;
}

/// In-memory implementation of KnowledgeStore
pub mod in_memory {
    use super::*;
    use std::sync::Mutex;

    /// In-memory implementation of KnowledgeStore for testing and development
    #[derive(Debug, Default)]
    pub struct InMemoryKnowledgeStore {
        documents: Mutex<Vec<Document>>,
        manual_qa: Mutex<Vec<ManualQa>>,
    }

    impl InMemoryKnowledgeStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_document(self, document: Document) -> Self {
            self.documents.lock().unwrap().push(document);
            self
        }

        pub fn with_manual_qa(self, qa: ManualQa) -> Self {
            self.manual_qa.lock().unwrap().push(qa);
            self
        }
    }

    #[async_trait]
    impl KnowledgeStore for InMemoryKnowledgeStore {
        async fn insert_document(&self, document: Document) -> Result<Document, DomainError> {
            self.documents.lock().unwrap().push(document.clone());
            Ok(document)
        }

        async fn get_document(&self, id: Uuid) -> Result<Option<Document>, DomainError> {
            let docs = self.documents.lock().unwrap();
            Ok(docs.iter().find(|d| d.id == id).cloned())
        }

        async fn list_documents(&self, tenant_id: &TenantId) -> Result<Vec<Document>, DomainError> {
            let docs = self.documents.lock().unwrap();
            let mut result: Vec<Document> = docs
                .iter()
                .rev()
                .filter(|d| &d.tenant_id == tenant_id)
                .cloned()
                .collect();
            result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(result)
        }

        async fn delete_document(&self, id: Uuid) -> Result<bool, DomainError> {
            let mut docs = self.documents.lock().unwrap();
            let before = docs.len();
            docs.retain(|d| d.id != id);
            Ok(docs.len() < before)
        }

        async fn insert_manual_qa(&self, qa: ManualQa) -> Result<ManualQa, DomainError> {
            self.manual_qa.lock().unwrap().push(qa.clone());
            Ok(qa)
        }

        async fn get_manual_qa(&self, id: Uuid) -> Result<Option<ManualQa>, DomainError> {
            let pairs = self.manual_qa.lock().unwrap();
            Ok(pairs.iter().find(|q| q.id == id).cloned())
        }

        async fn list_manual_qa(&self, tenant_id: &TenantId) -> Result<Vec<ManualQa>, DomainError> {
            let pairs = self.manual_qa.lock().unwrap();
            // Reverse insertion order, then stable-sort on the timestamp so
            // equal timestamps still come back most recent first.
            let mut result: Vec<ManualQa> = pairs
                .iter()
                .rev()
                .filter(|q| &q.tenant_id == tenant_id)
                .cloned()
                .collect();
            result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(result)
        }

        async fn delete_manual_qa(&self, id: Uuid) -> Result<bool, DomainError> {
            let mut pairs = self.manual_qa.lock().unwrap();
            let before = pairs.len();
            pairs.retain(|q| q.id != id);
            Ok(pairs.len() < before)
        }
    }
}
