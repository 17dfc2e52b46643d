use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::Result;
use crate::lexicon::{LexicalKnowledgeBase, LexiconEntry};
use crate::text::stem;

/// In-memory lexicon.
///
/// Serves both as the local-dictionary fast path of the synonym expander
/// and as a standalone knowledge base. Single-word forms are indexed under
/// their lowercase surface form and under their stem, so already-normalized
/// tokens ("develop") find the entries of "developer".
#[derive(Debug, Clone, Default)]
pub struct StaticLexicon {
    entries: HashMap<String, Vec<LexiconEntry>>,
}

impl StaticLexicon {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from synonym groups; every member of a group is a synonym of
    /// every other member.
    pub fn from_groups<G, S>(groups: G) -> Self
    where
        G: IntoIterator,
        G::Item: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut lexicon = Self::new();
        for (index, group) in groups.into_iter().enumerate() {
            let members: Vec<String> = group
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect();
            let synset_id = format!("group-{}", index);
            for word in &members {
                lexicon.insert(word, LexiconEntry::new(&synset_id, word, members.clone()));
            }
        }
        lexicon
    }

    /// Build from a JSON object mapping words to entry lists
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: HashMap<String, Vec<LexiconEntry>> = serde_json::from_str(json)?;
        let mut lexicon = Self::new();
        for (word, entries) in raw {
            for entry in entries {
                lexicon.insert(&word, entry);
            }
        }
        Ok(lexicon)
    }

    /// Record one sense of `word`
    pub fn insert(&mut self, word: &str, entry: LexiconEntry) {
        let key = word.trim().to_lowercase();
        if key.is_empty() {
            return;
        }

        if !key.contains(char::is_whitespace) {
            let stemmed = stem(&key);
            if stemmed != key {
                self.push(stemmed, entry.clone());
            }
        }
        self.push(key, entry);
    }

    fn push(&mut self, key: String, entry: LexiconEntry) {
        let slot = self.entries.entry(key).or_default();
        if !slot.contains(&entry) {
            slot.push(entry);
        }
    }

    /// Synchronous lookup used by the fast path
    pub fn get(&self, word: &str) -> &[LexiconEntry] {
        self.entries
            .get(&word.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of indexed keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl LexicalKnowledgeBase for StaticLexicon {
    async fn lookup(&self, word: &str) -> Result<Vec<LexiconEntry>> {
        Ok(self.get(word).to_vec())
    }

    fn name(&self) -> &str {
        "static"
    }

    async fn is_available(&self) -> bool {
        true
    }
}
