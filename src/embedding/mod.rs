//! Text-to-vector embedding.
//!
//! Provides the [`EmbeddingProvider`] trait, an HTTP implementation for
//! OpenAI-compatible and Ollama endpoints, and the vector helpers used by
//! retrieval. The provider is created via [`create_provider`] from configuration.

pub mod remote;

use async_trait::async_trait;

use crate::error::{ServiceError, ServiceResult};

/// Trait for embedding text into vectors.
///
/// Vectors from one provider share a fixed dimensionality and are compared with
/// [`cosine_similarity`].
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text string. Empty or whitespace-only text is rejected
    /// with [`ServiceError::EmptyInput`].
    async fn embed(&self, text: &str) -> ServiceResult<Vec<f32>>;

    /// Identifier of the model producing the vectors, recorded in `schema_meta`.
    fn model(&self) -> &str;
}

/// Create an embedding provider from config. Requests give up after
/// `timeout_secs`.
pub fn create_provider(
    config: &crate::config::EmbeddingConfig,
    api_key: Option<&str>,
    timeout_secs: u64,
) -> ServiceResult<Box<dyn EmbeddingProvider>> {
    let provider = remote::RemoteEmbeddingProvider::from_config(
        config,
        api_key,
        std::time::Duration::from_secs(timeout_secs),
    )?;
    Ok(Box::new(provider))
}

/// Cosine similarity of two vectors.
///
/// Returns 0.0 when either vector is empty, when they differ in length, or when
/// either has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}

/// Encode an embedding as little-endian f32 bytes for BLOB storage.
pub fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|x| x.to_le_bytes()).collect()
}

/// Decode a BLOB written by [`embedding_to_bytes`]. Trailing partial floats are ignored.
pub fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

pub(crate) fn ensure_not_blank(text: &str) -> ServiceResult<()> {
    if text.trim().is_empty() {
        return Err(ServiceError::EmptyInput);
    }
    Ok(())
}
