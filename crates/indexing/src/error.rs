use crate::CommandType;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexingError>;

#[derive(Error, Debug)]
pub enum IndexingError {
    #[error("Indexing command requires a document id")]
    MissingDocumentId,

    #[error("Synchronous recursive {command_type} command is not allowed")]
    SyncRecursive { command_type: CommandType },

    #[error("Target mismatch: command is bound to {expected}, got {actual}")]
    TargetMismatch { expected: String, actual: String },

    #[error("Invalid wire payload: {0}")]
    Wire(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Hand-off failed: {0}")]
    HandOff(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}
