//! Knowledge store implementations

mod postgres;

pub use postgres::{PostgresConfig, PostgresKnowledgeStore};
