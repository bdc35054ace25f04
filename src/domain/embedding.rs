//! Embedding client trait

use async_trait::async_trait;
use std::fmt::Debug;

use crate::domain::error::DomainError;

/// Trait for embedding providers.
///
/// One call embeds a batch of texts; the output preserves input order and
/// every vector has `dimensions()` components.
#[async_trait]
pub trait EmbeddingClient: Send + Sync + Debug {
    /// Embed a batch of texts
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError>;

    /// Vector width produced by this client
    fn dimensions(&self) -> usize;
}

/// Calculate cosine similarity between two vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}


#[cfg(test)]
mod tests {
    use super::mock::MockEmbeddingClient;
    use super::*;

    #[test]
    fn test_cosine_similarity_identical() {
        let v = vec![0.5, 0.2, -0.3];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_cosine_similarity_mismatched_lengths() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_mock_is_deterministic() {
        let client = MockEmbeddingClient::new(64);
        let a = client.embed(&["hello".to_string()]).await.unwrap();
        let b = client.embed(&["hello".to_string()]).await.unwrap();

        assert_eq!(a, b);
        assert_eq!(a[0].len(), 64);
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn test_mock_error_surfaces_as_embedding_error() {
        let client = MockEmbeddingClient::new(8).with_error("quota exceeded");
        let err = client.embed(&["x".to_string()]).await.unwrap_err();
        assert!(matches!(err, DomainError::EmbeddingService { .. }));
    }
}
