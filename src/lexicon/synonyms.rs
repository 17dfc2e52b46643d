use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;

use crate::core::SynonymSet;
use crate::lexicon::{normalize_lemma, LexicalKnowledgeBase, LexiconEntry, StaticLexicon};
use crate::text::stem;

/// Expands normalized tokens into synonym sets: local dictionary first,
/// knowledge base second, reflexive singleton when both come up empty.
pub struct SynonymExpander {
    local: StaticLexicon,
    knowledge_base: Arc<dyn LexicalKnowledgeBase>,
    concurrency: usize,
}

impl SynonymExpander {
    pub fn new(local: StaticLexicon, knowledge_base: Arc<dyn LexicalKnowledgeBase>) -> Self {
        Self {
            local,
            knowledge_base,
            concurrency: 16,
        }
    }

    /// Bound on lookups in flight during `expand_all`
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn knowledge_base(&self) -> &Arc<dyn LexicalKnowledgeBase> {
        &self.knowledge_base
    }

    /// Synonym set of one token. Never fails: knowledge-base errors
    /// degrade to `{token}`.
    pub async fn expand(&self, token: &str) -> SynonymSet {
        let key = token.to_lowercase();

        let local = self.local.get(&key);
        if !local.is_empty() {
            return SynonymSet::with_synonyms(token, collect_synonyms(local));
        }

        match self.knowledge_base.lookup(&key).await {
            Ok(entries) => SynonymSet::with_synonyms(token, collect_synonyms(&entries)),
            Err(e) => {
                tracing::warn!(
                    "Lexicon {} lookup failed for '{}': {}",
                    self.knowledge_base.name(),
                    key,
                    e
                );
                SynonymSet::singleton(token)
            }
        }
    }

    /// Expand every token concurrently and union the results, stemmed so
    /// they compare against normalized résumé tokens.
    pub async fn expand_all<I, S>(&self, tokens: I) -> HashSet<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(|t| t.as_ref().to_string()).collect();

        let sets: Vec<SynonymSet> = stream::iter(tokens)
            .map(|token| async move { self.expand(&token).await })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut vocabulary = HashSet::new();
        for set in sets {
            vocabulary.insert(set.seed().to_string());
            for synonym in set {
                vocabulary.insert(stem_synonym(&synonym));
            }
        }
        vocabulary
    }
}

fn collect_synonyms(entries: &[LexiconEntry]) -> Vec<String> {
    entries
        .iter()
        .flat_map(|entry| entry.synonyms.iter().chain(std::iter::once(&entry.lemma)))
        .map(|s| normalize_lemma(s))
        .filter(|s| !s.is_empty())
        .collect()
}

/// Multi-word synonyms are kept whole; they never equal a single token.
fn stem_synonym(synonym: &str) -> String {
    if synonym.contains(' ') {
        synonym.to_string()
    } else {
        stem(synonym)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{MatchError, Result};
    use crate::lexicon::EmptyLexicon;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingLexicon;

    #[async_trait]
    impl LexicalKnowledgeBase for FailingLexicon {
        async fn lookup(&self, _word: &str) -> Result<Vec<LexiconEntry>> {
            Err(MatchError::Lexicon {
                backend: "failing".to_string(),
                message: "service down".to_string(),
            })
        }

        fn name(&self) -> &str {
            "failing"
        }

        async fn is_available(&self) -> bool {
            false
        }
    }

    struct CountingLexicon {
        inner: StaticLexicon,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LexicalKnowledgeBase for CountingLexicon {
        async fn lookup(&self, word: &str) -> Result<Vec<LexiconEntry>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.lookup(word).await
        }

        fn name(&self) -> &str {
            "counting"
        }

        async fn is_available(&self) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn test_expand_is_reflexive() {
        let expander = SynonymExpander::new(StaticLexicon::new(), Arc::new(EmptyLexicon));
        for token in ["python", "develop", "5", "Rust"] {
            let set = expander.expand(token).await;
            assert!(set.contains(token));
            assert_eq!(set.len(), 1);
        }
    }

    #[tokio::test]
    async fn test_knowledge_base_failure_degrades() {
        let expander = SynonymExpander::new(StaticLexicon::new(), Arc::new(FailingLexicon));
        let set = expander.expand("engineer").await;
        assert_eq!(set.len(), 1);
        assert!(set.contains("engineer"));
    }

    #[tokio::test]
    async fn test_local_fast_path_skips_knowledge_base() {
        let local = StaticLexicon::from_groups(vec![vec!["developer", "programmer"]]);
        let remote = Arc::new(CountingLexicon {
            inner: StaticLexicon::from_groups(vec![vec!["car", "automobile"]]),
            calls: AtomicUsize::new(0),
        });
        let expander = SynonymExpander::new(local, remote.clone());

        let set = expander.expand(&stem("developer")).await;
        assert!(set.contains("programmer"));
        assert_eq!(remote.calls.load(Ordering::SeqCst), 0);

        let set = expander.expand("car").await;
        assert!(set.contains("automobile"));
        assert_eq!(remote.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expand_all_stems_synonyms() {
        let kb = StaticLexicon::from_groups(vec![vec!["developer", "engineer", "software_engineer"]]);
        let expander = SynonymExpander::new(StaticLexicon::new(), Arc::new(kb)).with_concurrency(2);

        let vocabulary = expander.expand_all(["develop", "python"]).await;
        assert!(vocabulary.contains("develop"));
        assert!(vocabulary.contains(&stem("engineer")));
        assert!(vocabulary.contains("software engineer"));
        assert!(vocabulary.contains("python"));
    }

    #[tokio::test]
    async fn test_expand_all_empty() {
        let expander = SynonymExpander::new(StaticLexicon::new(), Arc::new(EmptyLexicon));
        let vocabulary = expander.expand_all(Vec::<String>::new()).await;
        assert!(vocabulary.is_empty());
    }
}
