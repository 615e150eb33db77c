use thiserror::Error;

/// Errors that can occur around the recipe text engine.
///
/// The parsing, diffing and graph algorithms are total and never produce
/// these; only persistence, configuration and caller input can fail.
#[derive(Error, Debug)]
pub enum ForkError {
    /// Failed to read or write the grocery store
    #[error("Storage error: {0}")]
    StorageError(#[from] std::io::Error),

    /// Stored or supplied JSON could not be (de)serialized
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),

    /// Invalid input provided by the caller
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
