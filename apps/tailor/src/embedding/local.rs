//! In-process embeddings via fastembed (all-MiniLM-L6-v2).
//!
//! `TextEmbedding` is synchronous and CPU-bound, so every call goes through
//! `tokio::task::spawn_blocking`.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::{Embedder, EmbeddingError};

pub struct LocalEmbedder {
    model: Arc<fastembed::TextEmbedding>,
}

impl LocalEmbedder {
    /// Loads the model, downloading it on first use.
    pub async fn new() -> Result<Self, EmbeddingError> {
        let model = tokio::task::spawn_blocking(|| {
            let options = fastembed::InitOptions::new(fastembed::EmbeddingModel::AllMiniLML6V2)
                .with_show_download_progress(false);
            fastembed::TextEmbedding::try_new(options)
        })
        .await
        .map_err(|e| EmbeddingError::Model(format!("spawn_blocking join error: {e}")))?
        .map_err(|e| EmbeddingError::Model(format!("model initialization failed: {e}")))?;

        info!("Local embedding model loaded (all-MiniLM-L6-v2)");
        Ok(Self {
            model: Arc::new(model),
        })
    }
}

#[async_trait]
impl Embedder for LocalEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| EmbeddingError::Malformed("empty embedding result".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let inputs = texts.to_vec();
        let model = Arc::clone(&self.model);
        tokio::task::spawn_blocking(move || model.embed(inputs, None))
            .await
            .map_err(|e| EmbeddingError::Model(format!("spawn_blocking join error: {e}")))?
            .map_err(|e| EmbeddingError::Model(format!("embedding failed: {e}")))
    }
}
