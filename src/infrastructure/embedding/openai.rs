//! OpenAI embedding client implementation

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::embedding::EmbeddingClient;
use crate::domain::DomainError;
use crate::infrastructure::http_client::HttpClientTrait;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

/// Known OpenAI embedding models and their dimensions
const EMBEDDING_MODELS: &[(&str, usize)] = &[
    ("text-embedding-3-small", 1536),
    ("text-embedding-3-large", 3072),
    ("text-embedding-ada-002", 1536),
];

/// OpenAI embedding client
#[derive(Debug)]
pub struct OpenAiEmbeddingClient<C: HttpClientTrait> {
    client: C,
    auth_header: String,
    base_url: String,
    model: String,
    dimensions: usize,
}

impl<C: HttpClientTrait> OpenAiEmbeddingClient<C> {
    /// Create a new client for a known embedding model
    pub fn new(
        client: C,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, DomainError> {
        Self::with_base_url(client, api_key, model, DEFAULT_OPENAI_BASE_URL)
    }

    /// Create a new client with a custom base URL
    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let model = model.into();
        let dimensions = EMBEDDING_MODELS
            .iter()
            .find(|(name, _)| *name == model)
            .map(|(_, dims)| *dims)
            .ok_or_else(|| {
                DomainError::configuration(format!("unknown embedding model '{model}'"))
            })?;

        let auth_header = format!("Bearer {}", api_key.into());
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            auth_header,
            base_url,
            model,
            dimensions,
        })
    }

    fn embeddings_url(&self) -> String {
        format!("{}/v1/embeddings", self.base_url)
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("Authorization", self.auth_header.as_str()),
            ("Content-Type", "application/json"),
        ]
    }

    fn parse_response(
        &self,
        json: serde_json::Value,
        expected: usize,
    ) -> Result<Vec<Vec<f32>>, DomainError> {
        let response: OpenAiEmbeddingResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::embedding_service(format!("failed to parse embedding response: {e}"))
        })?;

        if response.data.len() != expected {
            return Err(DomainError::embedding_service(format!(
                "expected {expected} embeddings, got {}",
                response.data.len()
            )));
        }

        let mut data = response.data;
        data.sort_by_key(|d| d.index);

        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl<C: HttpClientTrait> EmbeddingClient for OpenAiEmbeddingClient<C> {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.embeddings_url();
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let response = self
            .client
            .post_json(&url, self.headers(), &body)
            .await
            .map_err(|e| DomainError::embedding_service(e.to_string()))?;

        self.parse_response(response, texts.len())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

// OpenAI API response types

#[derive(Debug, Deserialize)]
struct OpenAiEmbeddingResponse {
    data: Vec<OpenAiEmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::http_client::mock::MockHttpClient;

    const TEST_URL: &str = "https://api.openai.com/v1/embeddings";

    fn create_mock_response(num_embeddings: usize, dimensions: usize) -> serde_json::Value {
        let data: Vec<serde_json::Value> = (0..num_embeddings)
            .map(|i| {
                let embedding: Vec<f32> = (0..dimensions).map(|j| (i + j) as f32 * 0.001).collect();
                serde_json::json!({
                    "index": i,
                    "embedding": embedding,
                    "object": "embedding"
                })
            })
            .collect();

        serde_json::json!({
            "model": "text-embedding-3-small",
            "data": data,
            "usage": {
                "prompt_tokens": 10,
                "total_tokens": 10
            }
        })
    }

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_embed_single_text() {
        let client = MockHttpClient::new().with_response(TEST_URL, create_mock_response(1, 1536));
        let embedder =
            OpenAiEmbeddingClient::new(client, "test-api-key", "text-embedding-3-small").unwrap();

        let vectors = embedder.embed(&texts(&["Hello world"])).await.unwrap();

        assert_eq!(vectors.len(), 1);
        assert_eq!(vectors[0].len(), 1536);
    }

    #[tokio::test]
    async fn test_embed_batch_preserves_order() {
        let response = serde_json::json!({
            "model": "text-embedding-3-small",
            "data": [
                {"index": 1, "embedding": [1.0]},
                {"index": 0, "embedding": [0.0]},
                {"index": 2, "embedding": [2.0]}
            ],
            "usage": {"prompt_tokens": 3, "total_tokens": 3}
        });
        let client = MockHttpClient::new().with_response(TEST_URL, response);
        let embedder =
            OpenAiEmbeddingClient::new(client, "test-api-key", "text-embedding-3-small").unwrap();

        let vectors = embedder.embed(&texts(&["a", "b", "c"])).await.unwrap();

        assert_eq!(vectors, vec![vec![0.0], vec![1.0], vec![2.0]]);
    }

    #[tokio::test]
    async fn test_embed_count_mismatch_is_error() {
        let client = MockHttpClient::new().with_response(TEST_URL, create_mock_response(1, 4));
        let embedder =
            OpenAiEmbeddingClient::new(client, "test-api-key", "text-embedding-3-small").unwrap();

        let result = embedder.embed(&texts(&["a", "b"])).await;
        assert!(matches!(result, Err(DomainError::EmbeddingService { .. })));
    }

    #[tokio::test]
    async fn test_embed_empty_batch_skips_request() {
        let client = MockHttpClient::new();
        let embedder =
            OpenAiEmbeddingClient::new(client, "test-api-key", "text-embedding-3-small").unwrap();

        let vectors = embedder.embed(&[]).await.unwrap();
        assert!(vectors.is_empty());
    }

    #[tokio::test]
    async fn test_embed_error_maps_to_embedding_service() {
        let client = MockHttpClient::new().with_error(TEST_URL, "Rate limit exceeded");
        let embedder =
            OpenAiEmbeddingClient::new(client, "test-api-key", "text-embedding-3-small").unwrap();

        let err = embedder.embed(&texts(&["Hello"])).await.unwrap_err();
        assert!(matches!(err, DomainError::EmbeddingService { .. }));
    }

    #[tokio::test]
    async fn test_custom_base_url() {
        let custom_url = "http://localhost:8080/v1/embeddings";
        let client = MockHttpClient::new().with_response(custom_url, create_mock_response(1, 1536));
        let embedder = OpenAiEmbeddingClient::with_base_url(
            client,
            "test-key",
            "text-embedding-3-small",
            "http://localhost:8080/",
        )
        .unwrap();

        let vectors = embedder.embed(&texts(&["Test"])).await.unwrap();
        assert_eq!(vectors.len(), 1);
    }

    #[test]
    fn test_unknown_model_rejected() {
        let client = MockHttpClient::new();
        let result = OpenAiEmbeddingClient::new(client, "key", "not-a-model");
        assert!(matches!(result, Err(DomainError::Configuration { .. })));
    }

    #[test]
    fn test_model_dimensions() {
        let client = MockHttpClient::new();
        let embedder = OpenAiEmbeddingClient::new(client, "key", "text-embedding-3-large").unwrap();
        assert_eq!(embedder.dimensions(), 3072);
    }
}
