use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// How a document's score was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMethod {
    /// Every job token covered (100, no phrase/number terms)
    ShortCircuit,
    /// Weighted word/phrase/number overlap
    Lexical,
    /// Single-keyword exact membership (100 or 0)
    Keyword,
    /// Embedding cosine similarity
    Semantic,
    /// Semantic fallback failed for this document
    Unscoreable,
}

/// Breakdown of the lexical computation, kept for transparency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexicalBreakdown {
    /// Final lexical score (0 - 100)
    pub score: f64,
    /// Distinct résumé tokens found in the expanded job vocabulary
    pub matched_count: usize,
    /// Distinct normalized job tokens
    pub job_token_count: usize,
    /// matched_count / job_token_count, capped at 1.0
    pub match_ratio: f64,
    /// Any shared bigram/trigram
    pub phrase_hit: bool,
    /// Some job digit run is a substring of a résumé digit run
    pub number_hit: bool,
    /// Short-circuited to 100
    pub short_circuit: bool,
}

/// Score of one document against the job description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Identifier of the scored document
    pub document_id: String,

    /// Score in [0, 100]; `None` only when the document was unscoreable
    pub score: Option<f64>,

    /// Scoring path taken
    pub method: MatchMethod,

    /// Lexical breakdown when the lexical path produced the score
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lexical: Option<LexicalBreakdown>,

    /// Failure reason for unscoreable documents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MatchResult {
    pub fn lexical(document_id: impl Into<String>, breakdown: LexicalBreakdown) -> Self {
        let method = if breakdown.short_circuit {
            MatchMethod::ShortCircuit
        } else {
            MatchMethod::Lexical
        };
        Self {
            document_id: document_id.into(),
            score: Some(breakdown.score),
            method,
            lexical: Some(breakdown),
            error: None,
        }
    }

    pub fn scored(document_id: impl Into<String>, score: f64, method: MatchMethod) -> Self {
        Self {
            document_id: document_id.into(),
            score: Some(score.clamp(0.0, 100.0)),
            method,
            lexical: None,
            error: None,
        }
    }

    pub fn unscoreable(document_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            score: None,
            method: MatchMethod::Unscoreable,
            lexical: None,
            error: Some(error.into()),
        }
    }

    pub fn is_scored(&self) -> bool {
        self.score.is_some()
    }

    /// Descending by score, unscoreable last. Equal keys compare equal so a
    /// stable sort keeps input order.
    pub fn rank_order(a: &MatchResult, b: &MatchResult) -> Ordering {
        match (a.score, b.score) {
            (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }

    /// Get display string for logging
    pub fn display(&self) -> String {
        match self.score {
            Some(score) => format!("{} - {:.1}% [{:?}]", self.document_id, score, self.method),
            None => format!(
                "{} - unscoreable ({})",
                self.document_id,
                self.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}

/// Documents ordered by score descending, ties in input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ranking {
    pub results: Vec<MatchResult>,

    /// Distinct normalized tokens in the job description
    pub job_token_count: usize,

    /// Wall-clock time spent ranking
    pub latency_ms: f64,

    pub generated_at: DateTime<Utc>,
}

impl Ranking {
    /// Sort `results` (given in input order) into ranking order.
    pub fn from_results(mut results: Vec<MatchResult>, job_token_count: usize, latency_ms: f64) -> Self {
        // sort_by is stable
        results.sort_by(MatchResult::rank_order);
        Self {
            results,
            job_token_count,
            latency_ms,
            generated_at: Utc::now(),
        }
    }

    pub fn empty() -> Self {
        Self::from_results(Vec::new(), 0, 0.0)
    }

    /// Best match, if any document was scored
    pub fn top(&self) -> Option<&MatchResult> {
        self.results.first().filter(|r| r.is_scored())
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MatchResult> {
        self.results.iter()
    }

    /// Scored entries as `(id, score)` pairs, in ranking order
    pub fn scored(&self) -> Vec<(&str, f64)> {
        self.results
            .iter()
            .filter_map(|r| r.score.map(|s| (r.document_id.as_str(), s)))
            .collect()
    }
}

impl IntoIterator for Ranking {
    type Item = MatchResult;
    type IntoIter = std::vec::IntoIter<MatchResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}
