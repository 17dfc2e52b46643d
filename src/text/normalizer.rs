use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::core::TokenSequence;
use crate::lexicon::{EmptyLexicon, LexicalKnowledgeBase};
use crate::text::{is_stopword, stem, word_units, AbbreviationTable};

/// Turns raw text into a canonical token sequence.
///
/// Pipeline:
/// 1. split on whitespace
/// 2. expand abbreviations (static table, then knowledge-base lemma, else verbatim)
/// 3. lowercase
/// 4. split into word units (punctuation is never part of a token)
/// 5. drop stopwords
/// 6. stem
pub struct Normalizer {
    abbreviations: AbbreviationTable,
    knowledge_base: Arc<dyn LexicalKnowledgeBase>,
    lemma_fallback: bool,
    concurrency: usize,
}

impl Normalizer {
    pub fn new(abbreviations: AbbreviationTable, knowledge_base: Arc<dyn LexicalKnowledgeBase>) -> Self {
        Self {
            abbreviations,
            knowledge_base,
            lemma_fallback: true,
            concurrency: 16,
        }
    }

    /// Consult the knowledge base for words missing from the abbreviation table
    pub fn with_lemma_fallback(mut self, enabled: bool) -> Self {
        self.lemma_fallback = enabled;
        self
    }

    /// Bound on lemma lookups in flight
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Normalize `text`. Empty input yields an empty sequence.
    pub async fn normalize(&self, text: &str) -> TokenSequence {
        if text.trim().is_empty() {
            return TokenSequence::default();
        }

        let lemmas = if self.lemma_fallback {
            self.lookup_lemmas(text).await
        } else {
            HashMap::new()
        };

        let expanded = self.expand_abbreviations(text, &lemmas);
        TokenSequence::new(analyze(&expanded))
    }

    /// Static-table-only normalization; never touches the knowledge base.
    pub fn normalize_offline(&self, text: &str) -> TokenSequence {
        let expanded = self.expand_abbreviations(text, &HashMap::new());
        TokenSequence::new(analyze(&expanded))
    }

    /// Step 2: rewrite each whitespace-delimited word. Surrounding
    /// punctuation is left in place; only the word core is compared.
    fn expand_abbreviations(&self, text: &str, lemmas: &HashMap<String, String>) -> String {
        text.split_whitespace()
            .map(|raw| {
                let (prefix, core, suffix) = split_core(raw);
                if core.is_empty() {
                    return raw.to_string();
                }
                let key = core.to_lowercase();
                let replacement = self
                    .abbreviations
                    .expand(&key)
                    .or_else(|| lemmas.get(&key).map(String::as_str));
                match replacement {
                    Some(expansion) => format!("{}{}{}", prefix, expansion, suffix),
                    None => raw.to_string(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Lemma lookups for every distinct word the static table misses.
    /// Lookup failures keep the word verbatim.
    async fn lookup_lemmas(&self, text: &str) -> HashMap<String, String> {
        let candidates: HashSet<String> = text
            .split_whitespace()
            .map(|raw| split_core(raw).1.to_lowercase())
            .filter(|key| key.chars().any(char::is_alphabetic))
            .filter(|key| self.abbreviations.expand(key).is_none())
            .collect();

        if candidates.is_empty() {
            return HashMap::new();
        }

        let knowledge_base = &self.knowledge_base;
        let results: Vec<(String, Option<String>)> = stream::iter(candidates)
            .map(|key| async move {
                match knowledge_base.lemma(&key).await {
                    Ok(lemma) => (key, lemma),
                    Err(e) => {
                        tracing::debug!("Lemma lookup failed for '{}': {}", key, e);
                        (key, None)
                    }
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        results
            .into_iter()
            .filter_map(|(key, lemma)| match lemma {
                Some(lemma) if lemma != key => Some((key, lemma)),
                _ => None,
            })
            .collect()
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(AbbreviationTable::default(), Arc::new(EmptyLexicon))
    }
}

/// Steps 3-6.
fn analyze(text: &str) -> Vec<String> {
    word_units(&text.to_lowercase())
        .into_iter()
        .filter(|token| !is_stopword(token))
        .map(|token| stem(&token))
        .collect()
}

/// Split a whitespace word into (leading punctuation, core, trailing punctuation).
fn split_core(raw: &str) -> (&str, &str, &str) {
    let start = raw
        .char_indices()
        .find(|(_, c)| c.is_alphanumeric())
        .map(|(i, _)| i)
        .unwrap_or(raw.len());
    let end = raw
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_alphanumeric())
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(start);
    let end = end.max(start);
    (&raw[..start], &raw[start..end], &raw[end..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::{LexiconEntry, StaticLexicon};

    #[tokio::test]
    async fn test_normalize_pipeline() {
        let normalizer = Normalizer::default();
        let tokens = normalizer.normalize("The developers are Developing APIs").await;
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens.as_slice()[0], "develop");
        assert_eq!(tokens.as_slice()[0], tokens.as_slice()[1]);
        assert_eq!(tokens.as_slice()[2], stem("apis"));
    }

    #[tokio::test]
    async fn test_empty_input() {
        let normalizer = Normalizer::default();
        assert!(normalizer.normalize("").await.is_empty());
        assert!(normalizer.normalize("   \n\t").await.is_empty());
        assert!(normalizer.normalize("the and of").await.is_empty());
    }

    #[tokio::test]
    async fn test_abbreviation_expansion() {
        let normalizer = Normalizer::default();
        let tokens = normalizer.normalize("Senior JS, TS and py dev").await;
        assert!(tokens.contains("javascript"));
        assert!(tokens.contains("typescript"));
        assert!(tokens.contains("python"));
        assert!(!tokens.contains("js"));
    }

    #[tokio::test]
    async fn test_abbreviation_requires_whole_word() {
        let normalizer = Normalizer::default();
        let tokens = normalizer.normalize("jsx nodejs").await;
        assert_eq!(tokens.len(), 2);
        assert!(tokens.contains("jsx"));
        assert!(!tokens.contains("javascript"));
    }

    #[tokio::test]
    async fn test_lemma_fallback() {
        let mut kb = StaticLexicon::new();
        kb.insert("k8s", LexiconEntry::new("1", "kubernetes", Vec::<String>::new()));
        let normalizer = Normalizer::new(AbbreviationTable::default(), Arc::new(kb));

        let tokens = normalizer.normalize("Deployed on K8s.").await;
        assert!(tokens.contains(&stem("kubernetes")));
        assert!(!tokens.contains("k8s"));

        let offline = normalizer.normalize_offline("Deployed on K8s.");
        assert!(offline.contains("k8s"));
    }

    #[tokio::test]
    async fn test_lemma_fallback_disabled() {
        let mut kb = StaticLexicon::new();
        kb.insert("k8s", LexiconEntry::new("1", "kubernetes", Vec::<String>::new()));
        let normalizer =
            Normalizer::new(AbbreviationTable::default(), Arc::new(kb)).with_lemma_fallback(false);

        let tokens = normalizer.normalize("k8s").await;
        assert_eq!(tokens.as_slice(), &["k8s"]);
    }

    #[tokio::test]
    async fn test_numbers_survive() {
        let normalizer = Normalizer::default();
        let tokens = normalizer.normalize("5 years experience").await;
        assert_eq!(tokens.as_slice(), &["5".to_string(), stem("years"), stem("experience")]);
    }

    #[test]
    fn test_offline_agrees_without_knowledge_base() {
        let normalizer = Normalizer::default();
        let text = "Built REST APIs in JS and Python";
        let online = tokio_test::block_on(normalizer.normalize(text));
        assert_eq!(online, normalizer.normalize_offline(text));
    }

    #[test]
    fn test_split_core() {
        assert_eq!(split_core("(JS),"), ("(", "JS", "),"));
        assert_eq!(split_core("rust"), ("", "rust", ""));
        assert_eq!(split_core("--"), ("--", "", ""));
        assert_eq!(split_core("c++"), ("", "c", "++"));
    }
}
