//! Embedding client implementations

mod openai;

pub use openai::OpenAiEmbeddingClient;
