// Typed errors with thiserror. Reducer errors are stored as state, never thrown to the host.

use thiserror::Error;

/// Panel engine error types.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PanelError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid message path: {0}")]
    PathParse(#[from] PathParseError),

    #[error("{0}")]
    PathGrammar(String),

    #[error("Extraction failed on topic {topic}: {message}")]
    Extraction { topic: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for PanelError {
    fn from(err: serde_json::Error) -> Self {
        PanelError::Serialization(err.to_string())
    }
}

/// Failure to parse a message path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathParseError {
    #[error("path is empty")]
    Empty,

    #[error("expected a topic name at {0:?}")]
    MissingTopic(String),

    #[error("unexpected input at {0:?}")]
    Trailing(String),
}
