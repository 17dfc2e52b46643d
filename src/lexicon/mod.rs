pub mod http;
pub mod memory;
pub mod sqlite;
pub mod synonyms;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use http::HttpLexicon;
pub use memory::StaticLexicon;
pub use sqlite::SqliteLexicon;
pub use synonyms::SynonymExpander;

/// Trait for lexical knowledge bases (WordNet-style synonym/lemma dictionaries)
#[async_trait]
pub trait LexicalKnowledgeBase: Send + Sync {
    /// All senses recorded for a lowercase word form
    async fn lookup(&self, word: &str) -> Result<Vec<LexiconEntry>>;

    /// Canonical lemma for a word, if the knowledge base knows it
    async fn lemma(&self, word: &str) -> Result<Option<String>> {
        let entries = self.lookup(word).await?;
        Ok(entries
            .into_iter()
            .map(|entry| normalize_lemma(&entry.lemma))
            .find(|lemma| !lemma.is_empty()))
    }

    /// Get knowledge-base name for logging
    fn name(&self) -> &str;

    /// Check if the knowledge base can currently answer lookups
    async fn is_available(&self) -> bool;
}

/// One sense of a word, as returned by a lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexiconEntry {
    /// Sense identifier (synset offset, group id, ...)
    #[serde(default)]
    pub synset_id: String,

    /// Canonical form of the word for this sense
    pub lemma: String,

    /// Words sharing this sense
    #[serde(default)]
    pub synonyms: Vec<String>,
}

impl LexiconEntry {
    pub fn new<I, S>(synset_id: impl Into<String>, lemma: impl Into<String>, synonyms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            synset_id: synset_id.into(),
            lemma: lemma.into(),
            synonyms: synonyms.into_iter().map(Into::into).collect(),
        }
    }
}

/// Lowercase and turn WordNet-style `multi_word` lemmas into `multi word`.
pub fn normalize_lemma(lemma: &str) -> String {
    lemma
        .split(|c: char| c == '_' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Knowledge base that knows nothing; every token expands to itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyLexicon;

#[async_trait]
impl LexicalKnowledgeBase for EmptyLexicon {
    async fn lookup(&self, _word: &str) -> Result<Vec<LexiconEntry>> {
        Ok(Vec::new())
    }

    fn name(&self) -> &str {
        "empty"
    }

    async fn is_available(&self) -> bool {
        true
    }
}
