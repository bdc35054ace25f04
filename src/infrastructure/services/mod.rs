//! Orchestration services built on the domain traits

mod knowledge;
mod resolver;
mod training;

pub use knowledge::{DeletionOutcome, KnowledgeService};
pub use resolver::AnswerResolver;
pub use training::{TrainingOutcome, TrainingService};
