//! Engine configuration.
//!
//! Every field has a default, so a partial YAML/JSON document (or none at
//! all) yields a usable config:
//!
//! ```
//! use resume_match_engine::config::EngineConfig;
//!
//! let config = EngineConfig::from_yaml_str("lookup_concurrency: 4").unwrap();
//! assert_eq!(config.lookup_concurrency, 4);
//! assert_eq!(config.weights.word, 80.0);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{MatchError, Result};

/// Lexical score weights; must sum to 100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    /// Weight of the word-overlap ratio
    pub word: f64,
    /// Flat bonus when any phrase is shared
    pub phrase: f64,
    /// Flat bonus when any job number appears inside a résumé number
    pub number: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            word: 80.0,
            phrase: 15.0,
            number: 5.0,
        }
    }
}

impl ScoreWeights {
    pub fn validate(&self) -> Result<()> {
        if self.word < 0.0 || self.phrase < 0.0 || self.number < 0.0 {
            return Err(MatchError::Config(format!(
                "score weights must be non-negative: {}",
                self
            )));
        }
        let total = self.word + self.phrase + self.number;
        if (total - 100.0).abs() > 1e-9 {
            return Err(MatchError::Config(format!(
                "score weights must sum to 100, got {} ({})",
                total, self
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for ScoreWeights {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "word={}, phrase={}, number={}",
            self.word, self.phrase, self.number
        )
    }
}

/// Where synonym and lemma lookups go
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LexiconSource {
    /// No knowledge base; tokens only match themselves (and local synonyms)
    None,
    /// On-disk WordNet-style database
    Sqlite { path: String },
    /// Remote lexicon service
    Http {
        base_url: String,
        #[serde(default = "default_lexicon_timeout_ms")]
        timeout_ms: u64,
    },
}

impl Default for LexiconSource {
    fn default() -> Self {
        LexiconSource::None
    }
}

fn default_lexicon_timeout_ms() -> u64 {
    500
}

/// Which sentence encoder backs the semantic fallback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Remote inference service
    Http {
        base_url: String,
        #[serde(default = "default_embedding_timeout_ms")]
        timeout_ms: u64,
    },
    /// Deterministic feature hashing (offline/dev)
    Hash {
        #[serde(default = "default_hash_dimensions")]
        dimensions: usize,
    },
    /// Local ONNX model (requires the `fastembed` feature)
    Fastembed {
        #[serde(default = "default_fastembed_model")]
        model: String,
    },
    /// No semantic fallback; such documents are reported unscoreable
    Disabled,
}

impl Default for EmbeddingBackend {
    fn default() -> Self {
        EmbeddingBackend::Http {
            base_url: "http://127.0.0.1:8080".to_string(),
            timeout_ms: default_embedding_timeout_ms(),
        }
    }
}

fn default_embedding_timeout_ms() -> u64 {
    5_000
}

fn default_hash_dimensions() -> usize {
    256
}

fn default_fastembed_model() -> String {
    "all-MiniLM-L6-v2".to_string()
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub weights: ScoreWeights,

    /// Knowledge-base lookups in flight per scoring call
    pub lookup_concurrency: usize,

    /// Documents scored concurrently per `rank` call
    pub max_concurrent_documents: usize,

    /// Ask the knowledge base for lemmas of words the abbreviation table misses
    pub lemma_fallback: bool,

    /// Extra abbreviations, merged over the built-in table
    pub abbreviations: BTreeMap<String, String>,

    /// Local synonym groups (fast path before the knowledge base)
    pub synonyms: Vec<Vec<String>>,

    pub lexicon: LexiconSource,

    pub embedding: EmbeddingBackend,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            lookup_concurrency: 16,
            max_concurrent_documents: 8,
            lemma_fallback: true,
            abbreviations: BTreeMap::new(),
            synonyms: Vec::new(),
            lexicon: LexiconSource::default(),
            embedding: EmbeddingBackend::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.yaml`/`.yml` or `.json` file
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            other => Err(MatchError::Config(format!(
                "unsupported config extension {:?} for {}",
                other,
                path.display()
            ))),
        }
    }

    /// Apply `RESUME_MATCH_*` environment overrides
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key → value source
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        match (
            lookup("RESUME_MATCH_LEXICON_DB"),
            lookup("RESUME_MATCH_LEXICON_URL"),
        ) {
            (Some(_), Some(_)) => {
                return Err(MatchError::Config(
                    "RESUME_MATCH_LEXICON_DB and RESUME_MATCH_LEXICON_URL are mutually exclusive"
                        .to_string(),
                ));
            }
            (Some(path), None) => self.lexicon = LexiconSource::Sqlite { path },
            (None, Some(base_url)) => {
                self.lexicon = LexiconSource::Http {
                    base_url,
                    timeout_ms: default_lexicon_timeout_ms(),
                };
            }
            (None, None) => {}
        }

        if let Some(base_url) = lookup("RESUME_MATCH_EMBEDDING_URL") {
            self.embedding = EmbeddingBackend::Http {
                base_url,
                timeout_ms: default_embedding_timeout_ms(),
            };
        }

        if let Some(value) = lookup("RESUME_MATCH_LOOKUP_CONCURRENCY") {
            self.lookup_concurrency = parse_count("RESUME_MATCH_LOOKUP_CONCURRENCY", &value)?;
        }

        if let Some(value) = lookup("RESUME_MATCH_MAX_CONCURRENT_DOCUMENTS") {
            self.max_concurrent_documents =
                parse_count("RESUME_MATCH_MAX_CONCURRENT_DOCUMENTS", &value)?;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;
        if self.lookup_concurrency == 0 {
            return Err(MatchError::Config(
                "lookup_concurrency must be at least 1".to_string(),
            ));
        }
        if self.max_concurrent_documents == 0 {
            return Err(MatchError::Config(
                "max_concurrent_documents must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_count(key: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse::<usize>()
        .map_err(|_| MatchError::Config(format!("{} must be a positive integer, got '{}'", key, value)))
}
