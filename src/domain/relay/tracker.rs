//! Mempool and finality trackers: reconcile `Sent` and `Committed` rows
//! against the node's view, reverting evicted or reorganized transactions to
//! `Prepared` and promoting sufficiently buried ones to `Confirmed`.

use log::{error, info};

use super::RelayService;
use crate::models::{TransactionError, TransactionStatus};
use crate::repositories::{TransactionRepository, TxField, TxOrdering};
use crate::services::ledger::{LedgerClient, TxStatusView};

impl<L, T> RelayService<L, T>
where
    L: LedgerClient + 'static,
    T: TransactionRepository + 'static,
{
    /// One mempool-tracking pass over the `Sent` bucket.
    ///
    /// The staleness reverts are timeouts of last resort and are checked
    /// only after a genuine rejection or acceptance has been ruled out for
    /// the row: a rejection always wins over an age-based revert.
    pub async fn process_sent(&self) -> Result<(), TransactionError> {
        let rows = self
            .transactions
            .list_by_status(
                TransactionStatus::Sent,
                TxOrdering::UpdatedAt,
                true,
                Some(vec![TxField::TxHash]),
            )
            .await?;
        if rows.is_empty() {
            return Ok(());
        }
        let tip = self.ledger.get_tip_number().await?;

        for tx in rows {
            let view = self.ledger.get_transaction_status(&tx.tx_hash).await?;
            match view {
                TxStatusView::NotFound | TxStatusView::Pending => {
                    if tx.age_since_update() >= self.policy.mempool_stale {
                        error!(
                            "Transaction {} hash {} rearranged, re-queueing",
                            tx.id, tx.tx_hash
                        );
                        self.transition(&tx, TransactionStatus::Prepared).await?;
                    }
                }
                TxStatusView::Proposed => {
                    if tx.age_since_update() >= self.policy.block_stale {
                        error!(
                            "Transaction {} hash {} proposed but never committed, re-queueing",
                            tx.id, tx.tx_hash
                        );
                        self.transition(&tx, TransactionStatus::Prepared).await?;
                    }
                }
                TxStatusView::Rejected { reason } => {
                    error!("Transaction {} hash {} failed: {reason}", tx.id, tx.tx_hash);
                    self.transition(&tx, TransactionStatus::Failed).await?;
                }
                TxStatusView::Committed { block_number } => {
                    // A single poll may already show sufficient depth; the
                    // lifecycle allows the direct Sent -> Confirmed edge for
                    // exactly this observation.
                    if self.is_confirmed(tip, block_number) {
                        self.transition(&tx, TransactionStatus::Confirmed).await?;
                        info!("Transaction {} hash {} confirmed", tx.id, tx.tx_hash);
                    } else {
                        self.transition(&tx, TransactionStatus::Committed).await?;
                        info!(
                            "Transaction {} hash {} committed, awaiting confirmations",
                            tx.id, tx.tx_hash
                        );
                    }
                }
            }
        }
        Ok(())
    }

    /// One finality-tracking pass over the `Committed` bucket.
    pub async fn process_committed(&self) -> Result<(), TransactionError> {
        let rows = self
            .transactions
            .list_by_status(
                TransactionStatus::Committed,
                TxOrdering::UpdatedAt,
                true,
                Some(vec![TxField::TxHash]),
            )
            .await?;
        if rows.is_empty() {
            return Ok(());
        }
        let tip = self.ledger.get_tip_number().await?;

        for tx in rows {
            let view = self.ledger.get_transaction_status(&tx.tx_hash).await?;
            match view {
                TxStatusView::NotFound | TxStatusView::Pending | TxStatusView::Proposed => {
                    // The including block is gone from the canonical chain.
                    error!(
                        "Transaction {} hash {} lost its block to a reorg, re-queueing",
                        tx.id, tx.tx_hash
                    );
                    self.transition(&tx, TransactionStatus::Prepared).await?;
                }
                TxStatusView::Rejected { reason } => {
                    error!("Transaction {} hash {} failed: {reason}", tx.id, tx.tx_hash);
                    self.transition(&tx, TransactionStatus::Failed).await?;
                }
                TxStatusView::Committed { block_number } => {
                    // An unresolvable height reads as not-yet-confirmed, not
                    // as a reorg: the node still attests block inclusion.
                    if self.is_confirmed(tip, block_number) {
                        self.transition(&tx, TransactionStatus::Confirmed).await?;
                        info!("Transaction {} hash {} confirmed", tx.id, tx.tx_hash);
                    }
                }
            }
        }
        Ok(())
    }

    fn is_confirmed(&self, tip: u64, block_number: Option<u64>) -> bool {
        match block_number {
            Some(height) => tip.saturating_sub(height) >= self.policy.confirmation_depth,
            None => false,
        }
    }
}
