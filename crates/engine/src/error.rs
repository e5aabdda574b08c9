//! The module contains the error the engine can throw.
//!
//! Every engine operation returns [`EngineError`] on failure. The variants
//! partition failures the way the API reports them: bad input, domain
//! conflicts, missing rows, credential problems and storage errors.
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Input rejected before any storage access (out-of-range amount, bad
    /// page size, malformed field).
    #[error("invalid input: {0}")]
    Validation(String),
    /// A category/transaction kind combination that contradicts itself.
    #[error("kind mismatch: {0}")]
    KindMismatch(String),
    /// Row missing, or owned by someone else. The two cases are deliberately
    /// indistinguishable.
    #[error("\"{0}\" not found")]
    KeyNotFound(String),
    #[error("\"{0}\" already present")]
    ExistingKey(String),
    /// Unknown user, wrong password or deactivated account. One message for
    /// all three.
    #[error("invalid username or password")]
    Credentials,
    #[error("credential processing failed: {0}")]
    Hashing(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::KindMismatch(a), Self::KindMismatch(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::Credentials, Self::Credentials) => true,
            (Self::Hashing(a), Self::Hashing(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
