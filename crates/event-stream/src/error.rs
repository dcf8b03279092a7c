use thiserror::Error;

/// Errors that can occur when appending to or reading from a stream.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Streams do not accept entries without fields.
    #[error("Stream entry for '{0}' has no fields")]
    EmptyEntry(String),

    /// The sink refused the operation.
    #[error("Event sink unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for sink operations.
pub type Result<T> = std::result::Result<T, SinkError>;
