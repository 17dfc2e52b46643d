//! Sentence embedding backends and the process-wide model slot.

pub mod hash;
pub mod http;

#[cfg(feature = "fastembed")]
pub mod local;

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::EmbeddingBackend;
use crate::error::{MatchError, Result};

pub use hash::{HashEmbedder, HashEmbedderFactory};
pub use http::{HttpEmbedder, HttpEmbedderFactory};

#[cfg(feature = "fastembed")]
pub use local::{FastEmbedder, FastEmbedderFactory};

/// Frozen text encoder producing mean-pooled, L2-normalized vectors
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Encode one text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Get model name for logging
    fn name(&self) -> &str;

    /// Vector width
    fn dimensions(&self) -> usize;
}

/// Constructs an embedder; may be slow (model download, health checks).
#[async_trait]
pub trait EmbedderFactory: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn Embedder>>;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Factory for a disabled backend; every load fails.
pub struct DisabledEmbedderFactory;

#[async_trait]
impl EmbedderFactory for DisabledEmbedderFactory {
    async fn load(&self) -> Result<Arc<dyn Embedder>> {
        Err(MatchError::Embedding(
            "no embedding backend configured".to_string(),
        ))
    }

    fn name(&self) -> &str {
        "disabled"
    }
}

/// Build the factory for a configured backend
pub fn factory_for(backend: &EmbeddingBackend) -> Result<Arc<dyn EmbedderFactory>> {
    let factory: Arc<dyn EmbedderFactory> = match backend {
        EmbeddingBackend::Http {
            base_url,
            timeout_ms,
        } => Arc::new(HttpEmbedderFactory::new(
            base_url.clone(),
            std::time::Duration::from_millis(*timeout_ms),
        )),
        EmbeddingBackend::Hash { dimensions } => Arc::new(HashEmbedderFactory::new(*dimensions)),
        #[cfg(feature = "fastembed")]
        EmbeddingBackend::Fastembed { model } => Arc::new(FastEmbedderFactory::new(model)?),
        #[cfg(not(feature = "fastembed"))]
        EmbeddingBackend::Fastembed { .. } => {
            return Err(MatchError::Config(
                "embedding backend 'fastembed' requires the `fastembed` feature".to_string(),
            ))
        }
        EmbeddingBackend::Disabled => Arc::new(DisabledEmbedderFactory),
    };
    Ok(factory)
}

/// Lazily initialized, shared embedding model.
///
/// The first `get` loads the model; concurrent first callers wait on the
/// same write lock and all observe the one instance. A failed load is not
/// remembered, so a later `get` tries again. `shutdown` releases the model.
pub struct ModelSlot {
    factory: Arc<dyn EmbedderFactory>,
    model: RwLock<Option<Arc<dyn Embedder>>>,
    loads: AtomicUsize,
}

impl ModelSlot {
    pub fn new(factory: Arc<dyn EmbedderFactory>) -> Self {
        Self {
            factory,
            model: RwLock::new(None),
            loads: AtomicUsize::new(0),
        }
    }

    /// The loaded model, loading it on first use
    pub async fn get(&self) -> Result<Arc<dyn Embedder>> {
        if let Some(model) = self.model.read().await.as_ref() {
            return Ok(model.clone());
        }

        let mut slot = self.model.write().await;
        if let Some(model) = slot.as_ref() {
            return Ok(model.clone());
        }

        let model = self.factory.load().await.map_err(|e| {
            tracing::warn!("⚠️ Embedding backend {} failed to load: {}", self.factory.name(), e);
            e
        })?;
        self.loads.fetch_add(1, Ordering::SeqCst);
        tracing::info!(
            "✅ Loaded embedding model {} ({} dims) via {}",
            model.name(),
            model.dimensions(),
            self.factory.name()
        );

        *slot = Some(model.clone());
        Ok(model)
    }

    pub async fn is_loaded(&self) -> bool {
        self.model.read().await.is_some()
    }

    /// Number of successful loads so far
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Release the model. Returns whether one was loaded.
    pub async fn shutdown(&self) -> bool {
        let released = self.model.write().await.take().is_some();
        if released {
            tracing::info!("Released embedding model ({})", self.factory.name());
        }
        released
    }

    pub fn backend(&self) -> &str {
        self.factory.name()
    }
}
