use thiserror::Error;

/// Errors that can occur when interacting with the persistence gateway.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No row exists for the identifier being updated.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// An update was attempted on a record without an identifier.
    #[error("{entity} has no identifier")]
    MissingIdentifier { entity: &'static str },

    /// A record with the same identifier already exists.
    #[error("{entity} already exists: {id}")]
    DuplicateId { entity: &'static str, id: String },

    /// A work order references a customer row that does not exist.
    #[error("Referenced customer does not exist: {0}")]
    UnknownCustomer(String),

    /// A stored value could not be decoded into a domain type.
    #[error("Invalid stored data: {0}")]
    InvalidData(String),

    /// The backing store refused the operation.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<common::ParseError> for StoreError {
    fn from(e: common::ParseError) -> Self {
        StoreError::InvalidData(e.to_string())
    }
}

/// Result type for gateway operations.
pub type Result<T> = std::result::Result<T, StoreError>;
