use thiserror::Error;

use crate::mutation::{DocKey, SetField};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(DocKey),

    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    #[error("{field:?} does not exist on {key}")]
    MissingField { key: DocKey, field: SetField },

    #[error("Corrupt document {key}: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Conflict(db.constraint().unwrap_or("unique index").to_string())
            }
            _ => StoreError::Unavailable(e.to_string()),
        }
    }
}

impl From<StoreError> for sideline_common::SidelineError {
    fn from(e: StoreError) -> Self {
        use sideline_common::SidelineError;
        match e {
            StoreError::NotFound(key) => SidelineError::NotFound(key.to_string()),
            StoreError::Conflict(constraint) => SidelineError::Conflict(constraint),
            StoreError::MissingField { .. } => SidelineError::Validation(e.to_string()),
            StoreError::Corrupt { .. } | StoreError::Unavailable(_) => {
                SidelineError::Upstream(e.to_string())
            }
        }
    }
}
