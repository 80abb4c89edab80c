// Ledger error taxonomy shared by both ledgers, the UI and the HTTP API

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// Input failed a declared constraint
    #[error("invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    /// Operation targeted an id that does not exist
    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: i64 },

    /// Underlying storage failure, propagated unchanged
    #[error("storage error: {0}")]
    Transport(#[from] rusqlite::Error),
}

impl LedgerError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        LedgerError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &'static str, id: i64) -> Self {
        LedgerError::NotFound { resource, id }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, LedgerError::Validation { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LedgerError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
