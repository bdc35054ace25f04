//! Document ingestion infrastructure

mod extract;

pub use extract::extract_text;
