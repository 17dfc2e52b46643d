//! # Resume Match Engine
//!
//! Scores résumé text against a job description:
//! - Text normalization (abbreviations, stopwords, Porter stemming)
//! - Synonym expansion against a lexical knowledge base (SQLite, HTTP, in-memory)
//! - Weighted word / phrase / number overlap with an all-keywords short-circuit
//! - Sentence-embedding fallback when nothing matches lexically
//! - Concurrent, cancellable batch ranking
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use resume_match_engine::{Document, EngineConfig, MatchEngine};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = EngineConfig::from_file("match.yaml").await?.with_env_overrides()?;
//!     let engine = MatchEngine::from_config(config).await?;
//!
//!     let ranking = engine
//!         .rank(
//!             vec![
//!                 Document::new("alice", "Senior Python engineer, 7 years of Django"),
//!                 Document::new("bob", "Frontend developer (JS, TS, React)"),
//!             ],
//!             "python developer",
//!         )
//!         .await?;
//!
//!     for (id, score) in ranking.scored() {
//!         println!("{} - {}%", id, score);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod lexicon;
pub mod scoring;
pub mod telemetry;
pub mod text;

// Re-export primary types
pub use crate::config::{EmbeddingBackend, EngineConfig, LexiconSource, ScoreWeights};
pub use crate::core::{Document, MatchMethod, MatchResult, Ranking, SynonymSet, TokenSequence};
pub use crate::embedding::{Embedder, EmbedderFactory, ModelSlot};
pub use crate::engine::{MatchEngine, MatchEngineBuilder};
pub use crate::error::{MatchError, Result};
pub use crate::lexicon::{LexicalKnowledgeBase, LexiconEntry, SynonymExpander};
pub use crate::scoring::{LexicalOutcome, LexicalScorer, SemanticScorer};
pub use crate::text::Normalizer;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
