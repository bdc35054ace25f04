//! Domain layer - Core business logic and entities

pub mod answer;
pub mod embedding;
pub mod error;
pub mod ingestion;
pub mod knowledge;
pub mod llm;
pub mod tenant;
pub mod vector_store;

pub use answer::{Provenance, ResolvedAnswer, NO_CONTEXT_FALLBACK};
pub use embedding::{cosine_similarity, EmbeddingClient};
pub use error::DomainError;
pub use ingestion::{Chunk, Chunker, ChunkingConfig, ChunkMetadata, DocumentFormat};
pub use knowledge::{Document, DocumentSummary, KnowledgeStore, ManualQa};
pub use llm::{ChatMessage, ChatRole, LanguageModel};
pub use tenant::TenantId;
pub use vector_store::{
    ChunkRecord, Payload, ScoredRecord, VectorStore, TENANT_PAYLOAD_KEY, TEXT_PAYLOAD_KEY,
};

pub use knowledge::in_memory::InMemoryKnowledgeStore;
