//! Application state for shared services

use std::sync::Arc;

use crate::infrastructure::services::{AnswerResolver, KnowledgeService, TrainingService};

/// Shared services handed to every handler.
///
/// Built once at startup; the services hold their collaborators as trait
/// objects, so tests assemble the same state over in-memory implementations.
#[derive(Clone)]
pub struct AppState {
    pub knowledge_service: Arc<KnowledgeService>,
    pub training_service: Arc<TrainingService>,
    pub resolver: Arc<AnswerResolver>,
}

impl AppState {
    pub fn new(
        knowledge_service: Arc<KnowledgeService>,
        training_service: Arc<TrainingService>,
        resolver: Arc<AnswerResolver>,
    ) -> Self {
        Self {
            knowledge_service,
            training_service,
            resolver,
        }
    }
}
