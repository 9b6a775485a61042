//! Error taxonomy for core operations.
//!
//! Validation errors never appear here: they are field-scoped data on the
//! form session and stay inside it. What propagates out of the core is the
//! boundary taxonomy — not-found, rejected transitions, and collaborator
//! failures — which the API layer reduces to status codes and a generic
//! retry message.

use crate::appointment::AppointmentStatus;
use carebook_store::{FileError, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("record not found: {0}")]
    NotFound(String),

    #[error("no transition from {from} to {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("persistence failure: {0}")]
    Persistence(StoreError),

    #[error("file storage failure: {0}")]
    FileStorage(#[from] FileError),

    #[error("record translation failed: {0}")]
    Translation(#[from] serde_json::Error),
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { collection, id } => {
                CoreError::NotFound(format!("{collection}/{id}"))
            }
            other => CoreError::Persistence(other),
        }
    }
}

/// Type alias for Results that can fail with a [`CoreError`].
pub type CoreResult<T> = Result<T, CoreError>;
