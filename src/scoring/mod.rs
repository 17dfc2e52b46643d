pub mod lexical;
pub mod semantic;

use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::core::{PhraseSet, TokenSequence};
use crate::embedding::Embedder;
use crate::text::{extract_numbers, extract_phrases};

pub use lexical::{LexicalOutcome, LexicalScorer};
pub use semantic::{cosine_similarity, SemanticScore, SemanticScorer};

/// Everything derived from one job description, computed once per batch
/// and shared read-only by every document's scoring task.
pub struct JobProfile {
    /// Normalized job tokens, in order
    pub tokens: TokenSequence,
    /// Distinct normalized job tokens
    pub distinct: HashSet<String>,
    /// Distinct tokens plus their stemmed synonyms
    pub vocabulary: HashSet<String>,
    /// Surface-form bigrams and trigrams of the raw job text
    pub phrases: PhraseSet,
    /// Digit runs of the raw job text
    pub numbers: Vec<String>,
    embedding: OnceCell<Vec<f32>>,
    /// Model resolved for this batch; a load error sticks until the batch ends
    model: OnceCell<Result<Arc<dyn Embedder>, String>>,
}

impl JobProfile {
    pub fn new(job_text: &str, tokens: TokenSequence, vocabulary: HashSet<String>) -> Self {
        let distinct = tokens.distinct();
        Self {
            tokens,
            distinct,
            vocabulary,
            phrases: extract_phrases(job_text),
            numbers: extract_numbers(job_text),
            embedding: OnceCell::new(),
            model: OnceCell::new(),
        }
    }

    /// Profile without synonym expansion; the vocabulary is the distinct tokens.
    pub fn without_synonyms(job_text: &str, tokens: TokenSequence) -> Self {
        let vocabulary = tokens.distinct();
        Self::new(job_text, tokens, vocabulary)
    }

    /// Distinct normalized tokens
    pub fn token_count(&self) -> usize {
        self.distinct.len()
    }

    /// The job normalizes to at most one distinct token
    pub fn is_single_keyword(&self) -> bool {
        self.distinct.len() <= 1
    }

    pub(crate) fn embedding_cell(&self) -> &OnceCell<Vec<f32>> {
        &self.embedding
    }

    pub(crate) fn model_cell(&self) -> &OnceCell<Result<Arc<dyn Embedder>, String>> {
        &self.model
    }
}
