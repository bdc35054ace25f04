//! Document ingestion domain types
//!
//! This module provides:
//! - `DocumentFormat` for gating accepted uploads
//! - `Chunker` for splitting extracted text into overlapping segments

pub mod chunker;
pub mod format;

// Re-export main types
pub use chunker::{Chunk, Chunker, ChunkingConfig, ChunkMetadata};
pub use format::DocumentFormat;
