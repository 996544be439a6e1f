//! Embedder boundary: maps text to fixed-length vectors.
//!
//! Implementations must be deterministic for a fixed model: the same text always
//! produces the same vector, otherwise rankings are not reproducible.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{Config, EmbeddingBackend};

#[cfg(feature = "local-embeddings")]
pub mod local;
pub mod openai;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("malformed embedding response: {0}")]
    Malformed(String),

    #[error("embedding model error: {0}")]
    Model(String),
}

/// The embedder trait. Passed explicitly into the ranker so tests can swap in a stub.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Embeds many texts at once. The default falls back to one call per text;
    /// backends with a batch endpoint override it. Results must match `embed`.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }
}

/// Builds the embedder selected by `EMBEDDING_BACKEND`.
pub async fn build_embedder(config: &Config) -> anyhow::Result<Arc<dyn Embedder>> {
    match config.embedding_backend {
        EmbeddingBackend::OpenAi => {
            let api_key = config.embedding_api_key.clone().ok_or_else(|| {
                anyhow::anyhow!("EMBEDDING_API_KEY must be set for the openai embedding backend")
            })?;
            let embedder = openai::OpenAiEmbedder::new(
                api_key,
                &config.embedding_base_url,
                config.embedding_model.clone(),
            )?;
            Ok(Arc::new(embedder))
        }
        #[cfg(feature = "local-embeddings")]
        EmbeddingBackend::Local => Ok(Arc::new(local::LocalEmbedder::new().await?)),
        #[cfg(not(feature = "local-embeddings"))]
        EmbeddingBackend::Local => anyhow::bail!(
            "EMBEDDING_BACKEND=local requires building with the `local-embeddings` feature"
        ),
    }
}
