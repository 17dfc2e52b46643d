use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::sync::Arc;

use crate::embedding::{Embedder, EmbedderFactory};
use crate::error::{MatchError, Result};

/// Local ONNX sentence encoder (mean pooled, normalized).
pub struct FastEmbedder {
    model: Arc<TextEmbedding>,
    name: String,
    dimensions: usize,
}

/// Supported model names and their widths
fn resolve_model(name: &str) -> Result<(EmbeddingModel, usize)> {
    match name.to_lowercase().as_str() {
        "all-minilm-l6-v2" | "sentence-transformers/all-minilm-l6-v2" => {
            Ok((EmbeddingModel::AllMiniLML6V2, 384))
        }
        "bge-small-en-v1.5" => Ok((EmbeddingModel::BGESmallENV15, 384)),
        "bge-base-en-v1.5" => Ok((EmbeddingModel::BGEBaseENV15, 768)),
        other => Err(MatchError::Config(format!("unsupported fastembed model '{}'", other))),
    }
}

#[async_trait]
impl Embedder for FastEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let model = self.model.clone();
        let text = text.to_string();

        let mut vectors = tokio::task::spawn_blocking(move || model.embed(vec![text], None))
            .await
            .map_err(|e| MatchError::Embedding(format!("encoder task failed: {}", e)))?
            .map_err(|e| MatchError::Embedding(e.to_string()))?;

        vectors
            .pop()
            .ok_or_else(|| MatchError::Embedding("encoder returned no vector".to_string()))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

pub struct FastEmbedderFactory {
    name: String,
    model: EmbeddingModel,
    dimensions: usize,
}

impl FastEmbedderFactory {
    pub fn new(name: &str) -> Result<Self> {
        let (model, dimensions) = resolve_model(name)?;
        Ok(Self {
            name: name.to_string(),
            model,
            dimensions,
        })
    }
}

#[async_trait]
impl EmbedderFactory for FastEmbedderFactory {
    async fn load(&self) -> Result<Arc<dyn Embedder>> {
        let options = InitOptions::new(self.model.clone()).with_show_download_progress(false);

        let model = tokio::task::spawn_blocking(move || TextEmbedding::try_new(options))
            .await
            .map_err(|e| MatchError::Embedding(format!("model load task failed: {}", e)))?
            .map_err(|e| MatchError::Embedding(e.to_string()))?;

        Ok(Arc::new(FastEmbedder {
            model: Arc::new(model),
            name: self.name.clone(),
            dimensions: self.dimensions,
        }))
    }

    fn name(&self) -> &str {
        "fastembed"
    }
}
