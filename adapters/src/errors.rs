//! Custom error types specific to the `adapters` crate.
//!
//! Every store implementation reports failures through `StoreError`, so the
//! HTTP layer can tell a missing object apart from a broken backend.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} not found ({key})")]
    NotFound { entity: &'static str, key: String },

    #[error("page {number} out of range (last page is {last})")]
    PageOutOfRange { number: u32, last: u32 },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("corrupt column {column}: {reason}")]
    Decode { column: &'static str, reason: String },
}

impl StoreError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        StoreError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::NotFound { .. } | StoreError::PageOutOfRange { .. }
        )
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
