use std::sync::Arc;

use crate::config::ScoreWeights;
use crate::core::{LexicalBreakdown, TokenSequence};
use crate::lexicon::SynonymExpander;
use crate::scoring::JobProfile;
use crate::text::{extract_numbers, extract_phrases, number_hit, Normalizer};

/// Result of the lexical pass
#[derive(Debug, Clone, PartialEq)]
pub enum LexicalOutcome {
    /// Lexical matching produced a score
    Matched(LexicalBreakdown),
    /// Nothing matched; carries the normalized résumé tokens for the
    /// semantic fallback
    NoMatch { resume_tokens: TokenSequence },
}

impl LexicalOutcome {
    pub fn score(&self) -> Option<f64> {
        match self {
            LexicalOutcome::Matched(breakdown) => Some(breakdown.score),
            LexicalOutcome::NoMatch { .. } => None,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, LexicalOutcome::Matched(_))
    }
}

/// Weighted word / phrase / number overlap with the all-keywords short-circuit.
pub struct LexicalScorer {
    normalizer: Arc<Normalizer>,
    expander: Arc<SynonymExpander>,
    weights: ScoreWeights,
}

impl LexicalScorer {
    pub fn new(
        normalizer: Arc<Normalizer>,
        expander: Arc<SynonymExpander>,
        weights: ScoreWeights,
    ) -> Self {
        Self {
            normalizer,
            expander,
            weights,
        }
    }

    /// Normalize the job text and expand every distinct token (concurrently).
    pub async fn prepare(&self, job_text: &str) -> JobProfile {
        let tokens = self.normalizer.normalize(job_text).await;
        let vocabulary = self.expander.expand_all(tokens.distinct()).await;
        JobProfile::new(job_text, tokens, vocabulary)
    }

    /// Score a résumé against an already prepared job.
    pub async fn score_prepared(&self, resume_text: &str, profile: &JobProfile) -> LexicalOutcome {
        let resume_tokens = self.normalizer.normalize(resume_text).await;
        self.score_tokens(resume_text, resume_tokens, profile)
    }

    /// Standalone two-text form
    pub async fn score(&self, resume_text: &str, job_text: &str) -> LexicalOutcome {
        let profile = self.prepare(job_text).await;
        self.score_prepared(resume_text, &profile).await
    }

    fn score_tokens(
        &self,
        resume_text: &str,
        resume_tokens: TokenSequence,
        profile: &JobProfile,
    ) -> LexicalOutcome {
        let job_token_count = profile.token_count();
        if job_token_count == 0 {
            return LexicalOutcome::NoMatch { resume_tokens };
        }

        let matched_count = resume_tokens
            .distinct()
            .iter()
            .filter(|token| profile.vocabulary.contains(token.as_str()))
            .count();

        // Synonyms can let several résumé tokens cover one job token
        let match_ratio = (matched_count as f64 / job_token_count as f64).min(1.0);

        if match_ratio >= 1.0 {
            return LexicalOutcome::Matched(LexicalBreakdown {
                score: 100.0,
                matched_count,
                job_token_count,
                match_ratio,
                phrase_hit: false,
                number_hit: false,
                short_circuit: true,
            });
        }

        let phrase_hit = !profile.phrases.is_empty()
            && !extract_phrases(resume_text).is_disjoint(&profile.phrases);
        let number_hit = number_hit(&profile.numbers, &extract_numbers(resume_text));

        if matched_count == 0 && !phrase_hit && !number_hit {
            return LexicalOutcome::NoMatch { resume_tokens };
        }

        let raw = match_ratio * self.weights.word
            + flag(phrase_hit) * self.weights.phrase
            + flag(number_hit) * self.weights.number;

        LexicalOutcome::Matched(LexicalBreakdown {
            score: raw.round().clamp(0.0, 100.0),
            matched_count,
            job_token_count,
            match_ratio,
            phrase_hit,
            number_hit,
            short_circuit: false,
        })
    }
}

fn flag(hit: bool) -> f64 {
    if hit {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::{EmptyLexicon, StaticLexicon};

    fn scorer_with(groups: Vec<Vec<&str>>) -> LexicalScorer {
        let kb = Arc::new(StaticLexicon::from_groups(groups));
        LexicalScorer::new(
            Arc::new(Normalizer::default()),
            Arc::new(SynonymExpander::new(StaticLexicon::new(), kb)),
            ScoreWeights::default(),
        )
    }

    fn scorer() -> LexicalScorer {
        LexicalScorer::new(
            Arc::new(Normalizer::default()),
            Arc::new(SynonymExpander::new(StaticLexicon::new(), Arc::new(EmptyLexicon))),
            ScoreWeights::default(),
        )
    }

    fn breakdown(outcome: LexicalOutcome) -> LexicalBreakdown {
        match outcome {
            LexicalOutcome::Matched(breakdown) => breakdown,
            other => panic!("expected a lexical match, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_partial_match() {
        let result = breakdown(
            scorer()
                .score("Experienced Python engineer", "python developer")
                .await,
        );
        assert_eq!(result.matched_count, 1);
        assert_eq!(result.job_token_count, 2);
        assert!(!result.short_circuit);
        assert_eq!(result.score, 40.0);
    }

    #[tokio::test]
    async fn test_short_circuit_ignores_bonuses() {
        let result = breakdown(
            scorer()
                .score("Senior Rust developer, 10 years", "senior rust developer 10 years")
                .await,
        );
        assert!(result.short_circuit);
        assert_eq!(result.score, 100.0);
        assert!(!result.phrase_hit);
        assert!(!result.number_hit);
    }

    #[tokio::test]
    async fn test_synonyms_cover_job_tokens() {
        let scorer = scorer_with(vec![vec!["developer", "engineer", "programmer"]]);
        let result = breakdown(
            scorer
                .score("Experienced Python engineer", "python developer")
                .await,
        );
        assert!(result.short_circuit);
        assert_eq!(result.score, 100.0);
    }

    #[tokio::test]
    async fn test_ratio_capped_when_synonyms_overlap() {
        let scorer = scorer_with(vec![vec!["developer", "engineer", "programmer"]]);
        let result = breakdown(scorer.score("developer engineer programmer", "developer").await);
        assert_eq!(result.matched_count, 3);
        assert_eq!(result.match_ratio, 1.0);
        assert_eq!(result.score, 100.0);
    }

    #[tokio::test]
    async fn test_phrase_and_number_bonus() {
        // 2 of 4 job tokens, shared "machine learning" phrase, "3" inside "2023"
        let result = breakdown(
            scorer()
                .score("Machine learning since 2023", "machine learning 3 kubernetes")
                .await,
        );
        assert_eq!(result.job_token_count, 4);
        assert_eq!(result.matched_count, 2);
        assert!(result.phrase_hit);
        assert!(result.number_hit);
        assert_eq!(result.score, 60.0);
    }

    #[tokio::test]
    async fn test_years_experience() {
        let result = breakdown(
            scorer()
                .score("10+ years of hands-on experience", "5 years experience")
                .await,
        );
        assert_eq!(result.job_token_count, 3);
        assert_eq!(result.matched_count, 2);
        assert!(!result.number_hit);
        assert!(!result.phrase_hit);
        assert_eq!(result.score, 53.0);
    }

    #[tokio::test]
    async fn test_number_direction_is_asymmetric() {
        let hit = breakdown(scorer().score("call 555-0199", "rust 0199").await);
        assert!(hit.number_hit);

        let miss = scorer().score("rust 1", "cobol 2019").await;
        assert!(!miss.is_match());
    }

    #[tokio::test]
    async fn test_no_match() {
        let outcome = scorer().score("gardening and cooking", "kubernetes operator").await;
        assert!(!outcome.is_match());
        assert_eq!(outcome.score(), None);
        match outcome {
            LexicalOutcome::NoMatch { resume_tokens } => {
                assert!(resume_tokens.contains(&crate::text::stem("gardening")));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_job_defers() {
        let outcome = scorer().score("Rust developer", "").await;
        assert!(!outcome.is_match());
    }

    #[tokio::test]
    async fn test_custom_weights() {
        let scorer = LexicalScorer::new(
            Arc::new(Normalizer::default()),
            Arc::new(SynonymExpander::new(StaticLexicon::new(), Arc::new(EmptyLexicon))),
            ScoreWeights {
                word: 70.0,
                phrase: 30.0,
                number: 0.0,
            },
        );
        let result = breakdown(scorer.score("python", "python developer").await);
        assert_eq!(result.score, 35.0);
    }
}
