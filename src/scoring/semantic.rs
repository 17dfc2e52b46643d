use std::sync::Arc;

use crate::core::{MatchMethod, TokenSequence};
use crate::embedding::ModelSlot;
use crate::error::{MatchError, Result};
use crate::scoring::JobProfile;
use crate::text::Normalizer;

/// Score produced by the semantic fallback
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SemanticScore {
    pub score: f64,
    /// `Keyword` for the single-token exact path, `Semantic` otherwise
    pub method: MatchMethod,
}

/// Embedding fallback used when lexical matching finds nothing.
pub struct SemanticScorer {
    normalizer: Arc<Normalizer>,
    model: Arc<ModelSlot>,
}

impl SemanticScorer {
    pub fn new(normalizer: Arc<Normalizer>, model: Arc<ModelSlot>) -> Self {
        Self { normalizer, model }
    }

    pub fn model(&self) -> &Arc<ModelSlot> {
        &self.model
    }

    /// Standalone two-text form
    pub async fn score(&self, resume_text: &str, job_text: &str) -> Result<SemanticScore> {
        let job_tokens = self.normalizer.normalize(job_text).await;
        let profile = JobProfile::without_synonyms(job_text, job_tokens);
        let resume_tokens = self.normalizer.normalize(resume_text).await;
        self.score_tokens(&resume_tokens, &profile).await
    }

    /// Score already normalized résumé tokens against a prepared job.
    /// The job embedding is computed once per profile.
    pub async fn score_tokens(
        &self,
        resume_tokens: &TokenSequence,
        profile: &JobProfile,
    ) -> Result<SemanticScore> {
        if profile.is_single_keyword() {
            let hit = profile
                .distinct
                .iter()
                .next()
                .map(|keyword| resume_tokens.contains(keyword))
                .unwrap_or(false);
            return Ok(SemanticScore {
                score: if hit { 100.0 } else { 0.0 },
                method: MatchMethod::Keyword,
            });
        }

        let model = profile
            .model_cell()
            .get_or_init(|| async { self.model.get().await.map_err(|e| e.to_string()) })
            .await
            .clone()
            .map_err(MatchError::Embedding)?;

        let job_text = profile.tokens.joined();
        let job_vector = profile
            .embedding_cell()
            .get_or_try_init(|| model.embed(&job_text))
            .await?;
        let resume_vector = model.embed(&resume_tokens.joined()).await?;

        let similarity = cosine_similarity(job_vector, &resume_vector)?;
        Ok(SemanticScore {
            score: ((similarity + 1.0) * 50.0).clamp(0.0, 100.0),
            method: MatchMethod::Semantic,
        })
    }
}

/// Cosine similarity in [-1, 1]; 0 when either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(MatchError::Embedding(format!(
            "dimension mismatch: {} vs {}",
            a.len(),
            b.len()
        )));
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok((dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::{
        DisabledEmbedderFactory, Embedder, EmbedderFactory, HashEmbedder, HashEmbedderFactory,
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingEmbedder {
        inner: HashEmbedder,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Embedder for CountingEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.embed(text).await
        }

        fn name(&self) -> &str {
            "counting"
        }

        fn dimensions(&self) -> usize {
            self.inner.dimensions()
        }
    }

    struct CountingFactory {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl EmbedderFactory for CountingFactory {
        async fn load(&self) -> Result<Arc<dyn Embedder>> {
            Ok(Arc::new(CountingEmbedder {
                inner: HashEmbedder::new(64),
                calls: self.calls.clone(),
            }))
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    fn counting_scorer() -> (SemanticScorer, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let slot = ModelSlot::new(Arc::new(CountingFactory {
            calls: calls.clone(),
        }));
        (
            SemanticScorer::new(Arc::new(Normalizer::default()), Arc::new(slot)),
            calls,
        )
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]).unwrap() - 1.0).abs() < 1e-9);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap().abs() < 1e-9);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]).unwrap() + 1.0).abs() < 1e-9);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).unwrap(), 0.0);
        assert!(cosine_similarity(&[1.0], &[1.0, 0.0]).is_err());
    }

    #[tokio::test]
    async fn test_single_keyword_skips_embedding() {
        let (scorer, calls) = counting_scorer();

        let hit = scorer.score("Our team uses SQL daily.", "sql").await.unwrap();
        assert_eq!(hit.score, 100.0);
        assert_eq!(hit.method, MatchMethod::Keyword);

        let miss = scorer.score("Our team uses Postgres.", "SQL").await.unwrap();
        assert_eq!(miss.score, 0.0);

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!scorer.model().is_loaded().await);
    }

    #[tokio::test]
    async fn test_empty_job_scores_zero() {
        let (scorer, calls) = counting_scorer();
        let result = scorer.score("Rust developer", "   ").await.unwrap();
        assert_eq!(result.score, 0.0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_job_embedding_reused_across_documents() {
        let (scorer, calls) = counting_scorer();
        let normalizer = Normalizer::default();
        let job = "distributed systems";
        let profile = JobProfile::without_synonyms(job, normalizer.normalize(job).await);

        for resume in ["gardening", "cooking", "painting"] {
            let tokens = normalizer.normalize(resume).await;
            let result = scorer.score_tokens(&tokens, &profile).await.unwrap();
            assert_eq!(result.method, MatchMethod::Semantic);
            assert!((0.0..=100.0).contains(&result.score));
        }

        // one job embedding plus one per résumé
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_identical_texts_score_100() {
        let slot = ModelSlot::new(Arc::new(HashEmbedderFactory::new(128)));
        let scorer = SemanticScorer::new(Arc::new(Normalizer::default()), Arc::new(slot));
        let result = scorer
            .score("distributed systems", "distributed systems")
            .await
            .unwrap();
        assert!((result.score - 100.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let slot = ModelSlot::new(Arc::new(DisabledEmbedderFactory));
        let scorer = SemanticScorer::new(Arc::new(Normalizer::default()), Arc::new(slot));
        let result = scorer.score("gardening", "distributed systems").await;
        assert!(matches!(result, Err(MatchError::Embedding(_))));
    }

    struct UnreachableFactory {
        loads: AtomicUsize,
    }

    #[async_trait]
    impl EmbedderFactory for UnreachableFactory {
        async fn load(&self) -> Result<Arc<dyn Embedder>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Err(MatchError::Embedding("connection refused".to_string()))
        }

        fn name(&self) -> &str {
            "unreachable"
        }
    }

    #[tokio::test]
    async fn test_load_failure_sticks_for_profile() {
        let factory = Arc::new(UnreachableFactory {
            loads: AtomicUsize::new(0),
        });
        let scorer = SemanticScorer::new(
            Arc::new(Normalizer::default()),
            Arc::new(ModelSlot::new(factory.clone())),
        );
        let normalizer = Normalizer::default();
        let job = "distributed systems";
        let profile = JobProfile::without_synonyms(job, normalizer.normalize(job).await);

        for resume in ["gardening", "cooking", "painting"] {
            let tokens = normalizer.normalize(resume).await;
            let result = scorer.score_tokens(&tokens, &profile).await;
            assert!(matches!(result, Err(MatchError::Embedding(_))));
        }
        assert_eq!(factory.loads.load(Ordering::SeqCst), 1);

        // a fresh profile tries again
        let profile = JobProfile::without_synonyms(job, normalizer.normalize(job).await);
        let tokens = normalizer.normalize("baking").await;
        assert!(scorer.score_tokens(&tokens, &profile).await.is_err());
        assert_eq!(factory.loads.load(Ordering::SeqCst), 2);
    }
}
