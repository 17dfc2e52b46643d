pub mod document;
pub mod match_result;

pub use document::{Document, PhraseSet, SynonymSet, TokenSequence};
pub use match_result::{LexicalBreakdown, MatchMethod, MatchResult, Ranking};
