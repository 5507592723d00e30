use thiserror::Error;

/// Main error type for grist operations
#[derive(Error, Debug)]
pub enum GristError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Unknown analyzer type: {0}")]
    UnknownAnalyzer(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Term dictionary error: {0}")]
    TermDictionary(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Index error: {0}")]
    Index(String),
}

/// Result type alias for grist operations
pub type Result<T> = std::result::Result<T, GristError>;

impl From<fst::Error> for GristError {
    fn from(e: fst::Error) -> Self {
        GristError::TermDictionary(e.to_string())
    }
}
