use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use crate::error::{MatchError, Result};
use crate::lexicon::{LexicalKnowledgeBase, LexiconEntry};

/// Client for a remote lexical knowledge-base service
pub struct HttpLexicon {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    entries: Vec<LexiconEntry>,
}

impl HttpLexicon {
    /// Connect to the service; fails if its health check does not answer.
    pub async fn connect(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = Client::builder().timeout(timeout).build()?;

        let health_url = format!("{}/health", base_url);
        client
            .get(&health_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Self::error(format!("Health check failed: {}", e)))?;

        Ok(Self { client, base_url })
    }

    fn error(message: String) -> MatchError {
        MatchError::Lexicon {
            backend: "http".to_string(),
            message,
        }
    }
}

#[async_trait]
impl LexicalKnowledgeBase for HttpLexicon {
    async fn lookup(&self, word: &str) -> Result<Vec<LexiconEntry>> {
        let url = format!(
            "{}/v1/lookup/{}",
            self.base_url,
            urlencoding::encode(&word.to_lowercase())
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Self::error(format!("Lookup request failed: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }

        if !response.status().is_success() {
            return Err(Self::error(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let body: LookupResponse = response
            .json()
            .await
            .map_err(|e| Self::error(format!("Invalid JSON: {}", e)))?;

        Ok(body.entries)
    }

    fn name(&self) -> &str {
        "http"
    }

    async fn is_available(&self) -> bool {
        let health_url = format!("{}/health", self.base_url);
        matches!(
            self.client.get(&health_url).send().await,
            Ok(response) if response.status().is_success()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_response_parsing() {
        let json = r#"{"entries": [{"synset_id": "1", "lemma": "engineer", "synonyms": ["applied_scientist", "technologist"]}]}"#;
        let parsed: LookupResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.entries.len(), 1);
        assert_eq!(parsed.entries[0].synonyms[1], "technologist");

        let parsed: LookupResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.entries.is_empty());
    }

    #[tokio::test]
    async fn test_connect_unreachable() {
        let result = HttpLexicon::connect("http://127.0.0.1:9", Duration::from_millis(200)).await;
        assert!(matches!(result, Err(MatchError::Lexicon { .. })));
    }

    #[tokio::test]
    #[ignore] // Requires a lexicon service running
    async fn test_http_lookup() {
        let lexicon = HttpLexicon::connect("http://127.0.0.1:8070", Duration::from_millis(500))
            .await
            .unwrap();
        let entries = lexicon.lookup("developer").await.unwrap();
        assert!(!entries.is_empty());
    }
}
