use thiserror::Error;

/// Errors raised while decoding event records handed over by the engine.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CoreError {
    #[error("Event record must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("Report must be a JSON array of event records, got {0}")]
    NotAReport(&'static str),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
