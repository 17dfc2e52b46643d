use crate::core::PhraseSet;
use crate::text::word_units;

/// Bigrams and trigrams over lowercase surface-form tokens. No stemming
/// and no stopword removal, so contiguity is preserved.
pub fn extract_phrases(text: &str) -> PhraseSet {
    let words: Vec<String> = word_units(&text.to_lowercase());
    let mut phrases = PhraseSet::new();

    for window in words.windows(2) {
        phrases.insert(window.join(" "));
    }
    for window in words.windows(3) {
        phrases.insert(window.join(" "));
    }

    phrases
}

/// Maximal runs of ASCII digits, in order of appearance.
pub fn extract_numbers(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_ascii_digit())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// True when some job number is a substring of some résumé number.
/// Containment is one-directional: the job number must sit inside the
/// résumé number.
pub fn number_hit(job_numbers: &[String], resume_numbers: &[String]) -> bool {
    job_numbers.iter().any(|job| {
        resume_numbers
            .iter()
            .any(|resume| resume.contains(job.as_str()))
    })
}
