//! Lexical preprocessing: word units, stemming, stopwords, abbreviations,
//! phrase windows and digit runs.

pub mod abbreviations;
pub mod normalizer;
pub mod phrases;
pub mod stopwords;

use rust_stemmers::{Algorithm, Stemmer};
use std::sync::OnceLock;
use unicode_normalization::UnicodeNormalization;

pub use abbreviations::AbbreviationTable;
pub use normalizer::Normalizer;
pub use phrases::{extract_numbers, extract_phrases, number_hit};
pub use stopwords::is_stopword;

/// Porter-style English stemmer
static STEMMER: OnceLock<Stemmer> = OnceLock::new();

fn stemmer() -> &'static Stemmer {
    STEMMER.get_or_init(|| Stemmer::create(Algorithm::English))
}

/// Stem a single lowercase word
#[inline]
pub fn stem(word: &str) -> String {
    stemmer().stem(word).into_owned()
}

/// Split text into word units. Punctuation and whitespace are boundaries
/// and never part of a token; case is preserved.
pub fn word_units(text: &str) -> Vec<String> {
    let composed: String = text.nfc().collect();
    composed
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}
