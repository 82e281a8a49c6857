//! Transaction lifecycle manager.
//!
//! Three cooperating passes over the transaction store, each driven by its
//! own scheduler timer and each a single full scan of one status bucket:
//!
//! - [`RelayService::process_prepared`] — the submission pipeline
//! - [`RelayService::process_sent`] — the mempool tracker
//! - [`RelayService::process_committed`] — the finality tracker
//!
//! Passes share no in-memory state across ticks. Every status write is a
//! compare-and-set against the status the pass observed, so passes that
//! overlap each other (the scheduler only serializes a pass against itself)
//! stay consistent: one racer lands the transition, the other surfaces a
//! stale-view error and the next tick re-derives fresh state.

mod submission;
mod tracker;

use std::sync::Arc;

use chrono::Duration;
use log::debug;

use crate::constants::{
    DEFAULT_BLOCK_STALE_MS, DEFAULT_CONFIRMATION_DEPTH, DEFAULT_MAX_PENDING_TXS,
    DEFAULT_MEMPOOL_STALE_MS,
};
use crate::models::{TransactionError, TransactionRepoModel, TransactionStatus};
use crate::repositories::TransactionRepository;
use crate::services::ledger::LedgerClient;

/// Policy knobs for the relay passes. Values are thresholds, not structure:
/// the order of checks inside each pass is fixed.
#[derive(Debug, Clone)]
pub struct RelayPolicy {
    /// Upper bound on `Sent` rows plus in-flight submissions.
    pub max_pending_txs: usize,
    /// Age at which a pool-invisible `Sent` row is considered evicted.
    pub mempool_stale: Duration,
    /// Age at which a `Sent` row without block association is re-queued.
    pub block_stale: Duration,
    /// Blocks on top of the including block required for finality.
    pub confirmation_depth: u64,
}

impl Default for RelayPolicy {
    fn default() -> Self {
        Self {
            max_pending_txs: DEFAULT_MAX_PENDING_TXS,
            mempool_stale: Duration::milliseconds(DEFAULT_MEMPOOL_STALE_MS),
            block_stale: Duration::milliseconds(DEFAULT_BLOCK_STALE_MS),
            confirmation_depth: DEFAULT_CONFIRMATION_DEPTH,
        }
    }
}

pub struct RelayService<L, T> {
    ledger: Arc<L>,
    transactions: Arc<T>,
    policy: RelayPolicy,
}

impl<L, T> RelayService<L, T>
where
    L: LedgerClient + 'static,
    T: TransactionRepository + 'static,
{
    pub fn new(ledger: Arc<L>, transactions: Arc<T>, policy: RelayPolicy) -> Self {
        Self {
            ledger,
            transactions,
            policy,
        }
    }

    /// Applies a status transition through the store's compare-and-set,
    /// validating the edge against the lifecycle graph first.
    pub(super) async fn transition(
        &self,
        tx: &TransactionRepoModel,
        new_status: TransactionStatus,
    ) -> Result<TransactionRepoModel, TransactionError> {
        if !tx.status.can_transition_to(new_status) {
            return Err(TransactionError::InvalidStateTransition {
                id: tx.id.clone(),
                from: tx.status,
                to: new_status,
            });
        }
        let updated = self
            .transactions
            .update_status(&tx.id, tx.status, new_status)
            .await?;
        debug!("Transaction {} moved {} -> {}", tx.id, tx.status, new_status);
        Ok(updated)
    }
}
