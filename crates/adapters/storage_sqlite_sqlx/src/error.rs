//! Storage-specific error type wrapping sqlx errors.

use daylight_domain::error::DaylightError;

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A query or connection failed.
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// Failed to (de)serialize a JSON column.
    #[error("JSON column error")]
    Json(#[from] serde_json::Error),

    /// Failed to run migrations.
    #[error("migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A record failed domain validation before being written.
    #[error("invalid record")]
    Invalid(#[source] DaylightError),
}

impl From<StorageError> for DaylightError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}
