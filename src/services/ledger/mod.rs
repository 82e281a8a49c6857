//! Ledger client abstraction for interacting with CKB nodes.
//!
//! The relay passes depend on the [`LedgerClient`] trait only; the concrete
//! [`HttpLedgerClient`] speaks the node's JSON-RPC interface. Submission
//! outcomes are a typed enum rather than an error taxonomy: only transport
//! and unclassifiable RPC failures travel on the `Err` branch.

use crate::models::OutPoint;
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

mod http;
pub use http::*;

#[cfg(test)]
use mockall::automock;

#[derive(Error, Debug, Serialize)]
pub enum LedgerError {
    #[error("Request timeout")]
    Timeout,
    #[error("Rate limited (HTTP 429)")]
    RateLimited,
    #[error("Request error (HTTP {status_code}): {error}")]
    RequestError { error: String, status_code: u16 },
    #[error("JSON-RPC error (code {code}): {message}")]
    RpcErrorCode { code: i64, message: String },
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Invalid transaction payload: {0}")]
    InvalidPayload(String),
    #[error("Liveness of output {0} could not be determined")]
    InconclusiveLiveness(String),
    #[error("Other ledger error: {0}")]
    Other(String),
}

impl LedgerError {
    /// Determines if this error is transient (can retry) or permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            LedgerError::Timeout => true,
            LedgerError::RateLimited => true,
            LedgerError::RequestError { status_code, .. } => *status_code >= 500,
            LedgerError::InconclusiveLiveness(_) => true,
            LedgerError::Other(_) => true,
            LedgerError::RpcErrorCode { .. } => false,
            LedgerError::InvalidResponse(_) => false,
            LedgerError::InvalidPayload(_) => false,
        }
    }
}

/// Categorizes a reqwest error into an appropriate `LedgerError` variant:
/// timeouts become `Timeout`, HTTP 429 becomes `RateLimited`, other HTTP
/// statuses become `RequestError`, and everything else becomes `Other`.
fn categorize_reqwest_error(err: &reqwest::Error) -> LedgerError {
    if err.is_timeout() {
        return LedgerError::Timeout;
    }

    if let Some(status) = err.status() {
        match status.as_u16() {
            429 => return LedgerError::RateLimited,
            _ => {
                return LedgerError::RequestError {
                    error: err.to_string(),
                    status_code: status.as_u16(),
                }
            }
        }
    }

    LedgerError::Other(err.to_string())
}

impl From<reqwest::Error> for LedgerError {
    fn from(err: reqwest::Error) -> Self {
        categorize_reqwest_error(&err)
    }
}

/// Classified result of a transaction submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The node accepted the transaction into its pool.
    Accepted { tx_hash: String },
    /// Hard rejection: verification failure or a refused replace-by-fee.
    /// Terminal for the submitted payload.
    Rejected { reason: String },
    /// The transaction consumes an output the node does not know about.
    UnknownOutput { out_point: OutPoint },
    /// A transaction with the same hash is already in the pool. Treated as
    /// success by callers.
    Duplicate,
}

/// Pool-side view of a tracked transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxStatusView {
    /// The node has no knowledge of the hash.
    NotFound,
    /// In the pool, not yet selected for a block.
    Pending,
    /// Selected for an upcoming block, no block association yet.
    Proposed,
    /// Included in a block. The height may be temporarily unresolvable
    /// (header not fetchable); callers treat `None` as "committed, depth
    /// unknown".
    Committed { block_number: Option<u64> },
    /// Rejected by the node after having been pooled.
    Rejected { reason: String },
}

/// Interface for CKB node interactions used by the relay passes.
///
/// One client type serves both networks; mainnet/testnet is a configuration
/// profile, not a subtype.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Submits a serialized transaction to the node, classifying the node's
    /// verdict. Transport failures and unclassifiable node errors are `Err`.
    async fn submit_transaction(&self, raw_tx: &str) -> Result<SubmitOutcome, LedgerError>;

    /// Queries the pool/chain status of a transaction by hash.
    async fn get_transaction_status(&self, tx_hash: &str) -> Result<TxStatusView, LedgerError>;

    /// Reports whether an output is still live.
    ///
    /// `Ok(false)` means definitively dead (the creating transaction is
    /// committed and the cell has been consumed). Anything inconclusive,
    /// including query failure, is an `Err` and must be treated by callers
    /// as "liveness unknown".
    async fn is_output_live(&self, out_point: &OutPoint) -> Result<bool, LedgerError>;

    /// Current tip block height.
    async fn get_tip_number(&self) -> Result<u64, LedgerError>;
}
