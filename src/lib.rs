//! Chatlane
//!
//! Multi-tenant chatbot backend with retrieval-augmented answers:
//! - Document uploads with PDF and DOCX text extraction
//! - Per-tenant training into a Qdrant collection
//! - Manual Q/A pairs that short-circuit retrieval
//! - Layered query resolution backed by OpenAI models

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use api::state::AppState;
use domain::{Chunker, ChunkingConfig, EmbeddingClient, KnowledgeStore, LanguageModel, VectorStore};
use infrastructure::embedding::OpenAiEmbeddingClient;
use infrastructure::http_client::HttpClient;
use infrastructure::knowledge_store::{PostgresConfig, PostgresKnowledgeStore};
use infrastructure::llm::OpenAiChatClient;
use infrastructure::services::{AnswerResolver, KnowledgeService, TrainingService};
use infrastructure::vector_store::QdrantVectorStore;

/// Timeout applied to every outbound HTTP call (OpenAI and Qdrant).
const OUTBOUND_TIMEOUT: Duration = Duration::from_secs(20);

/// Create the application state with all services initialized
pub async fn create_app_state() -> anyhow::Result<AppState> {
    create_app_state_with_config(&AppConfig::default()).await
}

/// Create the application state with custom configuration
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let http_client = HttpClient::with_timeout(OUTBOUND_TIMEOUT)
        .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

    // PostgreSQL holds documents and manual Q/A pairs
    info!("Connecting to PostgreSQL...");
    let postgres = PostgresKnowledgeStore::connect(&PostgresConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        min_connections: config.database.min_connections,
        connect_timeout_secs: config.database.connect_timeout_secs,
        idle_timeout_secs: config.database.idle_timeout_secs,
    })
    .await?;
    postgres.ensure_schema().await?;
    info!("PostgreSQL connection established");
    let knowledge_store: Arc<dyn KnowledgeStore> = Arc::new(postgres);

    // Embeddings and chat completions share one HTTP client
    let embedding_client = OpenAiEmbeddingClient::with_base_url(
        http_client.clone(),
        &config.openai.api_key,
        &config.openai.embedding_model,
        &config.openai.base_url,
    )?;
    let dimensions = embedding_client.dimensions();
    let embedding: Arc<dyn EmbeddingClient> = Arc::new(embedding_client);

    let llm: Arc<dyn LanguageModel> = Arc::new(
        OpenAiChatClient::with_base_url(
            http_client.clone(),
            &config.openai.api_key,
            &config.openai.chat_model,
            &config.openai.base_url,
        )
        .with_temperature(config.openai.temperature),
    );

    // Qdrant collection is created up front so training and queries never race it
    let mut qdrant = QdrantVectorStore::new(
        http_client,
        &config.vector_store.url,
        &config.vector_store.collection,
        dimensions,
    );
    if let Some(api_key) = &config.vector_store.api_key {
        qdrant = qdrant.with_api_key(api_key);
    }
    qdrant.ensure_collection().await?;
    info!(
        collection = %config.vector_store.collection,
        dimensions, "Vector collection ready"
    );
    let vector_store: Arc<dyn VectorStore> = Arc::new(qdrant);

    let chunker = Chunker::new(ChunkingConfig::new(
        config.ingestion.chunk_size,
        config.ingestion.chunk_overlap,
    ))?;

    let knowledge_service = Arc::new(KnowledgeService::new(
        knowledge_store.clone(),
        vector_store.clone(),
    ));
    let training_service = Arc::new(TrainingService::new(
        knowledge_store.clone(),
        embedding.clone(),
        vector_store.clone(),
        chunker,
    ));
    let resolver = Arc::new(AnswerResolver::new(
        knowledge_store,
        embedding,
        vector_store,
        llm,
    ));

    info!("Application state created");

    Ok(AppState::new(knowledge_service, training_service, resolver))
}
