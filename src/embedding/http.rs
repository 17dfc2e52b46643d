use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::embedding::{Embedder, EmbedderFactory};
use crate::error::{MatchError, Result};

/// Client for a sentence-embedding inference service
pub struct HttpEmbedder {
    client: Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    text: &'a str,
    pooling: &'a str,
    normalize: bool,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    dimensions: Option<usize>,
}

impl HttpEmbedder {
    /// Connect and read model metadata from the health endpoint
    pub async fn connect(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = Client::builder().timeout(timeout).build()?;

        let health_url = format!("{}/health", base_url);
        let response = client
            .get(&health_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| MatchError::Embedding(format!("Health check failed: {}", e)))?;

        // Older services answer the health check with an empty body
        let health: HealthResponse = response.json().await.unwrap_or(HealthResponse {
            model: None,
            dimensions: None,
        });

        Ok(Self {
            client,
            base_url,
            model: health.model.unwrap_or_else(|| "remote".to_string()),
            dimensions: health.dimensions.unwrap_or(0),
        })
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/v1/embed", self.base_url);

        let request = EmbedRequest {
            text,
            pooling: "mean",
            normalize: true,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| MatchError::Embedding(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(MatchError::Embedding(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let body: EmbedResponse = response
            .json()
            .await
            .map_err(|e| MatchError::Embedding(format!("Invalid JSON: {}", e)))?;

        if self.dimensions > 0 && body.embedding.len() != self.dimensions {
            return Err(MatchError::Embedding(format!(
                "expected {} dimensions, got {}",
                self.dimensions,
                body.embedding.len()
            )));
        }

        Ok(body.embedding)
    }

    fn name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

pub struct HttpEmbedderFactory {
    base_url: String,
    timeout: Duration,
}

impl HttpEmbedderFactory {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            timeout,
        }
    }
}

#[async_trait]
impl EmbedderFactory for HttpEmbedderFactory {
    async fn load(&self) -> Result<Arc<dyn Embedder>> {
        let embedder = HttpEmbedder::connect(self.base_url.clone(), self.timeout).await?;
        Ok(Arc::new(embedder))
    }

    fn name(&self) -> &str {
        "http"
    }
}
