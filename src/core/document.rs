use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// A résumé handed over by the parsing collaborator: an opaque id plus
/// its extracted plain-text body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    /// Caller-assigned identifier (database id, file name, ...)
    pub id: String,

    /// Extracted plain text
    #[serde(default)]
    pub text: String,
}

impl Document {
    /// Create a new document
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Ordered, normalized tokens (lowercased, abbreviations expanded,
/// stopwords removed, stemmed).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSequence(Vec<String>);

impl TokenSequence {
    pub fn new(tokens: Vec<String>) -> Self {
        Self(tokens)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.0.iter().any(|t| t == token)
    }

    /// Distinct tokens; duplicates within a document carry no extra weight.
    pub fn distinct(&self) -> HashSet<String> {
        self.0.iter().cloned().collect()
    }

    /// Space-joined form fed to the embedding model
    pub fn joined(&self) -> String {
        self.0.join(" ")
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for TokenSequence {
    fn from(tokens: Vec<String>) -> Self {
        Self(tokens)
    }
}

/// Contiguous 2- and 3-token windows over surface-form tokens.
pub type PhraseSet = HashSet<String>;

/// Tokens considered equivalent to a seed token. Never empty: the seed is
/// always a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynonymSet {
    seed: String,
    members: BTreeSet<String>,
}

impl SynonymSet {
    /// Reflexive singleton `{seed}`
    pub fn singleton(seed: impl Into<String>) -> Self {
        let seed = seed.into();
        let mut members = BTreeSet::new();
        members.insert(seed.clone());
        Self { seed, members }
    }

    /// Seed plus the given synonyms
    pub fn with_synonyms<I, S>(seed: impl Into<String>, synonyms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::singleton(seed);
        set.extend(synonyms);
        set
    }

    /// Add synonyms; blank entries are ignored.
    pub fn extend<I, S>(&mut self, synonyms: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for synonym in synonyms {
            let synonym = synonym.into();
            if !synonym.trim().is_empty() {
                self.members.insert(synonym);
            }
        }
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }

    pub fn contains(&self, token: &str) -> bool {
        self.members.contains(token)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.members.iter()
    }
}

impl IntoIterator for SynonymSet {
    type Item = String;
    type IntoIter = std::collections::btree_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_creation() {
        let doc = Document::new("r-1", "Rust engineer");
        assert_eq!(doc.id, "r-1");
        assert_eq!(doc.text, "Rust engineer");
    }

    #[test]
    fn test_synonym_set_is_reflexive() {
        let set = SynonymSet::singleton("develop");
        assert!(set.contains("develop"));
        assert_eq!(set.len(), 1);
        assert!(!set.is_empty());

        let set = SynonymSet::with_synonyms("develop", ["build", "", "create"]);
        assert!(set.contains("develop"));
        assert!(set.contains("build"));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_token_sequence_distinct() {
        let tokens = TokenSequence::from(vec![
            "rust".to_string(),
            "rust".to_string(),
            "tokio".to_string(),
        ]);
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens.distinct().len(), 2);
        assert_eq!(tokens.joined(), "rust rust tokio");
    }
}
