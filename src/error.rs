//! Error types for FileVault.

use thiserror::Error;

/// Common error type for FileVault.
#[derive(Error, Debug)]
pub enum VaultError {
    /// Database error.
    ///
    /// Database errors from sqlx are automatically converted.
    #[error("database error: {0}")]
    Database(String),

    /// Database connection error.
    #[error("database connection error: {0}")]
    DatabaseConnection(String),

    /// I/O error from a physical filesystem operation.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication error.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found, or not owned by the caller.
    #[error("{0} not found")]
    NotFound(String),

    /// A path would resolve outside of the user's storage root.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// A name sanitizes to nothing usable.
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// The target name is already taken.
    #[error("{0} already exists")]
    AlreadyExists(String),

    /// File extension is not on the allow-list.
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),

    /// Physical storage and metadata disagree after a partial failure.
    #[error("storage inconsistency: {0}")]
    Inconsistent(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl VaultError {
    /// Whether this error is a caller-correctable validation failure that
    /// was raised before any mutation took place.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            VaultError::NotFound(_)
                | VaultError::InvalidPath(_)
                | VaultError::InvalidName(_)
                | VaultError::AlreadyExists(_)
                | VaultError::UnsupportedType(_)
                | VaultError::Validation(_)
                | VaultError::Auth(_)
        )
    }
}

// Conversion from sqlx errors
impl From<sqlx::Error> for VaultError {
    fn from(e: sqlx::Error) -> Self {
        VaultError::Database(e.to_string())
    }
}

/// Result type alias for FileVault operations.
pub type Result<T> = std::result::Result<T, VaultError>;
