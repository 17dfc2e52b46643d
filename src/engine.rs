use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::{EngineConfig, LexiconSource};
use crate::core::{Document, MatchResult, Ranking};
use crate::embedding::{factory_for, EmbedderFactory, ModelSlot};
use crate::error::{MatchError, Result};
use crate::lexicon::{
    EmptyLexicon, HttpLexicon, LexicalKnowledgeBase, SqliteLexicon, StaticLexicon,
    SynonymExpander,
};
use crate::scoring::{JobProfile, LexicalOutcome, LexicalScorer, SemanticScore, SemanticScorer};
use crate::text::{AbbreviationTable, Normalizer};

/// Résumé-to-job match orchestrator.
///
/// Cheap to clone; clones share the knowledge base and the embedding model.
#[derive(Clone)]
pub struct MatchEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    config: EngineConfig,
    knowledge_base: Arc<dyn LexicalKnowledgeBase>,
    lexical: LexicalScorer,
    semantic: SemanticScorer,
    model: Arc<ModelSlot>,
}

/// Assembles a `MatchEngine` from a config plus optional injected backends
pub struct MatchEngineBuilder {
    config: EngineConfig,
    knowledge_base: Option<Arc<dyn LexicalKnowledgeBase>>,
    embedder_factory: Option<Arc<dyn EmbedderFactory>>,
}

impl MatchEngineBuilder {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            knowledge_base: None,
            embedder_factory: None,
        }
    }

    /// Use this knowledge base instead of the configured `lexicon` source
    pub fn knowledge_base(mut self, knowledge_base: Arc<dyn LexicalKnowledgeBase>) -> Self {
        self.knowledge_base = Some(knowledge_base);
        self
    }

    /// Use this factory instead of the configured `embedding` backend
    pub fn embedder_factory(mut self, factory: Arc<dyn EmbedderFactory>) -> Self {
        self.embedder_factory = Some(factory);
        self
    }

    pub fn build(self) -> Result<MatchEngine> {
        let config = self.config;
        config.validate()?;

        let knowledge_base = self
            .knowledge_base
            .unwrap_or_else(|| Arc::new(EmptyLexicon));
        let factory = match self.embedder_factory {
            Some(factory) => factory,
            None => factory_for(&config.embedding)?,
        };

        let normalizer = Arc::new(
            Normalizer::new(
                AbbreviationTable::with_overrides(&config.abbreviations),
                knowledge_base.clone(),
            )
            .with_lemma_fallback(config.lemma_fallback)
            .with_concurrency(config.lookup_concurrency),
        );
        let expander = Arc::new(
            SynonymExpander::new(
                StaticLexicon::from_groups(config.synonyms.iter()),
                knowledge_base.clone(),
            )
            .with_concurrency(config.lookup_concurrency),
        );
        let model = Arc::new(ModelSlot::new(factory));

        tracing::info!(
            "✅ Match engine ready (lexicon: {}, embedding: {}, weights: {})",
            knowledge_base.name(),
            model.backend(),
            config.weights
        );

        Ok(MatchEngine {
            inner: Arc::new(EngineInner {
                lexical: LexicalScorer::new(normalizer.clone(), expander, config.weights),
                semantic: SemanticScorer::new(normalizer, model.clone()),
                knowledge_base,
                model,
                config,
            }),
        })
    }
}

impl MatchEngine {
    pub fn builder(config: EngineConfig) -> MatchEngineBuilder {
        MatchEngineBuilder::new(config)
    }

    /// Create an engine, opening the configured lexicon. A lexicon that
    /// cannot be opened degrades to no knowledge base.
    pub async fn from_config(config: EngineConfig) -> Result<Self> {
        let knowledge_base = open_lexicon(&config.lexicon).await;
        Self::builder(config).knowledge_base(knowledge_base).build()
    }

    /// Rank `documents` against one job description.
    ///
    /// Documents are scored concurrently (bounded by
    /// `max_concurrent_documents`). The result is sorted by score
    /// descending; equal scores keep input order and unscoreable documents
    /// come last. Dropping the returned future aborts in-flight scoring.
    pub async fn rank(&self, documents: Vec<Document>, job_text: &str) -> Result<Ranking> {
        let start = Instant::now();

        if documents.is_empty() {
            return Ok(Ranking::empty());
        }

        let profile = Arc::new(self.inner.lexical.prepare(job_text).await);
        let permits = Arc::new(Semaphore::new(self.inner.config.max_concurrent_documents));
        let count = documents.len();

        let mut tasks = JoinSet::new();
        for (index, document) in documents.into_iter().enumerate() {
            let inner = self.inner.clone();
            let profile = profile.clone();
            let permits = permits.clone();

            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await;
                let outcome = AssertUnwindSafe(inner.score_document(&document, &profile))
                    .catch_unwind()
                    .await;
                let result = outcome.unwrap_or_else(|_| {
                    tracing::warn!("Scoring task for {} panicked", document.id);
                    MatchResult::unscoreable(&document.id, "scoring task panicked")
                });
                (index, result)
            });
        }

        let mut slots: Vec<Option<MatchResult>> = vec![None; count];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(e) => tracing::warn!("Scoring task failed: {}", e),
            }
        }

        let results: Vec<MatchResult> = slots
            .into_iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                if slot.is_none() {
                    tracing::warn!("No result for document #{}", index);
                }
                slot
            })
            .collect();

        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
        let ranking = Ranking::from_results(results, profile.token_count(), latency_ms);

        tracing::debug!(
            "Ranked {} documents in {:.1}ms (top: {})",
            ranking.len(),
            latency_ms,
            ranking
                .top()
                .map(MatchResult::display)
                .unwrap_or_else(|| "none".to_string())
        );

        Ok(ranking)
    }

    /// `rank`, abandoned as soon as `cancel` completes. Partial results are
    /// discarded and in-flight tasks aborted.
    pub async fn rank_until<F>(
        &self,
        documents: Vec<Document>,
        job_text: &str,
        cancel: F,
    ) -> Result<Ranking>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            ranking = self.rank(documents, job_text) => ranking,
            _ = cancel => {
                tracing::info!("Batch rank cancelled");
                Err(MatchError::Cancelled)
            }
        }
    }

    /// `rank` with a deadline
    pub async fn rank_with_timeout(
        &self,
        documents: Vec<Document>,
        job_text: &str,
        timeout: Duration,
    ) -> Result<Ranking> {
        self.rank_until(documents, job_text, tokio::time::sleep(timeout))
            .await
    }

    /// Score a single document
    pub async fn score(&self, document: &Document, job_text: &str) -> MatchResult {
        let profile = self.inner.lexical.prepare(job_text).await;
        self.inner.score_document(document, &profile).await
    }

    /// Lexical pass only; `None` means nothing matched lexically
    pub async fn lexical_score(&self, resume_text: &str, job_text: &str) -> Option<f64> {
        self.inner.lexical.score(resume_text, job_text).await.score()
    }

    /// Semantic pass only
    pub async fn semantic_score(&self, resume_text: &str, job_text: &str) -> Result<f64> {
        let SemanticScore { score, .. } = self.inner.semantic.score(resume_text, job_text).await?;
        Ok(score)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn knowledge_base(&self) -> &Arc<dyn LexicalKnowledgeBase> {
        &self.inner.knowledge_base
    }

    pub fn model(&self) -> &Arc<ModelSlot> {
        &self.inner.model
    }

    /// Release the embedding model. The next semantic score reloads it.
    pub async fn shutdown(&self) -> bool {
        self.inner.model.shutdown().await
    }
}

impl EngineInner {
    async fn score_document(&self, document: &Document, profile: &JobProfile) -> MatchResult {
        match self.lexical.score_prepared(&document.text, profile).await {
            LexicalOutcome::Matched(breakdown) => {
                tracing::debug!(
                    "{}: lexical {} ({}/{} tokens, phrase: {}, number: {})",
                    document.id,
                    breakdown.score,
                    breakdown.matched_count,
                    breakdown.job_token_count,
                    breakdown.phrase_hit,
                    breakdown.number_hit
                );
                MatchResult::lexical(&document.id, breakdown)
            }
            LexicalOutcome::NoMatch { resume_tokens } => {
                match self.semantic.score_tokens(&resume_tokens, profile).await {
                    Ok(SemanticScore { score, method }) => {
                        tracing::debug!("{}: {:?} {:.1}", document.id, method, score);
                        MatchResult::scored(&document.id, score, method)
                    }
                    Err(e) => {
                        tracing::warn!("{}: semantic scoring failed: {}", document.id, e);
                        MatchResult::unscoreable(&document.id, e.to_string())
                    }
                }
            }
        }
    }
}

/// Open the configured knowledge base, falling back to none.
async fn open_lexicon(source: &LexiconSource) -> Arc<dyn LexicalKnowledgeBase> {
    let opened: Result<Arc<dyn LexicalKnowledgeBase>> = match source {
        LexiconSource::None => return Arc::new(EmptyLexicon),
        LexiconSource::Sqlite { path } => SqliteLexicon::open(path)
            .await
            .map(|lexicon| Arc::new(lexicon) as Arc<dyn LexicalKnowledgeBase>),
        LexiconSource::Http {
            base_url,
            timeout_ms,
        } => HttpLexicon::connect(base_url.clone(), Duration::from_millis(*timeout_ms))
            .await
            .map(|lexicon| Arc::new(lexicon) as Arc<dyn LexicalKnowledgeBase>),
    };

    match opened {
        Ok(lexicon) => {
            tracing::info!("✅ Lexicon {} opened", lexicon.name());
            lexicon
        }
        Err(e) => {
            tracing::warn!("⚠️ Lexicon unavailable, continuing without synonyms: {}", e);
            Arc::new(EmptyLexicon)
        }
    }
}
