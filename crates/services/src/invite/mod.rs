pub mod outcome;
pub mod service;

pub use outcome::{JoinError, JoinOutcome, JoinStatus, Refusal, ReissueOutcome, RevokeOutcome, Role};
pub use service::InviteService;

use pairly_db::models::ModelError;
use thiserror::Error;

use crate::lock::LockError;
use crate::store::StoreError;

/// Infrastructure faults and rejected input. Domain results such as
/// `expired` or `forbidden` are outcomes, not errors.
#[derive(Debug, Error)]
pub enum InviteError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Lock error: {0}")]
    Lock(#[from] LockError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("Validation: {0}")]
    Validation(String),
}

pub type InviteResult<T> = Result<T, InviteError>;
