use thiserror::Error;

/// Main error type for the match engine
#[derive(Error, Debug)]
pub enum MatchError {
    /// On-disk lexicon errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// HTTP request errors
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML configuration errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Knowledge-base errors
    #[error("Lexicon '{backend}' error: {message}")]
    Lexicon { backend: String, message: String },

    /// Embedding model failed to load or encode
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Batch was cancelled before every document was scored
    #[error("Ranking cancelled")]
    Cancelled,

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<String> for MatchError {
    fn from(s: String) -> Self {
        MatchError::Other(s)
    }
}

impl From<&str> for MatchError {
    fn from(s: &str) -> Self {
        MatchError::Other(s.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, MatchError>;
