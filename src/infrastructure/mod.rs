//! Infrastructure layer - external service implementations

pub mod embedding;
pub mod http_client;
pub mod ingestion;
pub mod knowledge_store;
pub mod llm;
pub mod logging;
pub mod services;
pub mod vector_store;
