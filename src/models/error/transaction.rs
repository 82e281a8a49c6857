use crate::services::ledger::LedgerError;

use super::RepositoryError;
use crate::models::TransactionStatus;
use thiserror::Error;

/// Pass-level error for the relay passes. Anything surfacing here aborts the
/// current pass invocation; the scheduler logs it and retries on the next
/// tick.
#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("Pending quota exhausted: {sent} transactions in Sent against a limit of {max}")]
    QuotaExhausted { sent: usize, max: usize },

    #[error("Invalid status transition {from} -> {to} for transaction {id}")]
    InvalidStateTransition {
        id: String,
        from: TransactionStatus,
        to: TransactionStatus,
    },

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Underlying ledger error: {0}")]
    UnderlyingLedger(#[from] LedgerError),

    #[error("Unexpected error: {0}")]
    UnexpectedError(String),
}

impl TransactionError {
    /// Determines if this error is transient (can retry) or permanent.
    ///
    /// Every variant except an invalid transition resolves itself on a later
    /// tick: quota pressure drains, ledger calls are retried, and a stale
    /// repository read is re-derived from fresh state.
    pub fn is_transient(&self) -> bool {
        match self {
            TransactionError::QuotaExhausted { .. } => true,
            TransactionError::Repository(_) => true,
            TransactionError::UnderlyingLedger(err) => err.is_transient(),
            TransactionError::UnexpectedError(_) => true,
            TransactionError::InvalidStateTransition { .. } => false,
        }
    }
}
