//! Submission pipeline: broadcasts `Prepared` transactions under a bounded
//! pending quota and classifies each node verdict into a status transition.

use futures::stream::{FuturesUnordered, StreamExt};
use log::{error, info, warn};
use std::future::Future;
use std::sync::Arc;

use super::RelayService;
use crate::models::{OutPoint, TransactionError, TransactionRepoModel, TransactionStatus};
use crate::repositories::{TransactionRepository, TxOrdering};
use crate::services::ledger::{LedgerClient, LedgerError, SubmitOutcome};

type SubmitResult = (TransactionRepoModel, Result<SubmitOutcome, LedgerError>);

impl<L, T> RelayService<L, T>
where
    L: LedgerClient + 'static,
    T: TransactionRepository + 'static,
{
    /// One submission pass over the `Prepared` bucket.
    ///
    /// Intake is serial and oldest-first, preserving submission order for
    /// transactions that may consume each other's outputs. Dispatch is
    /// concurrent up to the pending quota: `Sent` rows plus in-flight
    /// submissions never exceed `max_pending_txs`. When the quota is hit,
    /// intake pauses, all in-flight submissions are joined, and the `Sent`
    /// count is re-read from the store — a previous pass or a concurrent
    /// process may have moved it — before either resuming or aborting the
    /// pass with a backpressure error.
    pub async fn process_prepared(&self) -> Result<(), TransactionError> {
        let rows = self
            .transactions
            .list_by_status(
                TransactionStatus::Prepared,
                TxOrdering::CreatedAt,
                true,
                None,
            )
            .await?;
        if rows.is_empty() {
            return Ok(());
        }
        info!("Submission pass over {} prepared transaction(s)", rows.len());

        let mut sent_count = self
            .transactions
            .count_by_status(TransactionStatus::Sent)
            .await?;
        let mut in_flight = FuturesUnordered::new();
        let mut deferred: Option<TransactionError> = None;

        for tx in rows {
            if sent_count + in_flight.len() >= self.policy.max_pending_txs {
                self.drain(&mut in_flight, &mut deferred).await?;
                sent_count = self
                    .transactions
                    .count_by_status(TransactionStatus::Sent)
                    .await?;
                if sent_count >= self.policy.max_pending_txs {
                    return Err(TransactionError::QuotaExhausted {
                        sent: sent_count,
                        max: self.policy.max_pending_txs,
                    });
                }
            }

            let ledger = Arc::clone(&self.ledger);
            in_flight.push(async move {
                let result = ledger.submit_transaction(&tx.raw_tx).await;
                (tx, result)
            });
        }

        self.drain(&mut in_flight, &mut deferred).await?;
        match deferred {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Joins every in-flight submission, applying each outcome as it
    /// completes. A transport or unclassifiable node error does not mark the
    /// row; it is held back so the remaining outcomes still land, then
    /// surfaced as the pass result.
    async fn drain<F>(
        &self,
        in_flight: &mut FuturesUnordered<F>,
        deferred: &mut Option<TransactionError>,
    ) -> Result<(), TransactionError>
    where
        F: Future<Output = SubmitResult>,
    {
        while let Some((tx, result)) = in_flight.next().await {
            match result {
                Ok(outcome) => self.apply_submit_outcome(tx, outcome).await?,
                Err(err) => {
                    error!("Submission of transaction {} failed: {err}", tx.id);
                    if deferred.is_none() {
                        *deferred = Some(TransactionError::UnderlyingLedger(err));
                    }
                }
            }
        }
        Ok(())
    }

    async fn apply_submit_outcome(
        &self,
        tx: TransactionRepoModel,
        outcome: SubmitOutcome,
    ) -> Result<(), TransactionError> {
        match outcome {
            SubmitOutcome::Accepted { .. } => {
                self.transition(&tx, TransactionStatus::Sent).await?;
                info!("Transaction {} hash {} has been sent", tx.id, tx.tx_hash);
            }
            SubmitOutcome::Duplicate => {
                self.transition(&tx, TransactionStatus::Sent).await?;
                info!(
                    "Transaction {} hash {} was already in the pool",
                    tx.id, tx.tx_hash
                );
            }
            SubmitOutcome::Rejected { reason } => {
                error!(
                    "Transaction {} hash {} failed to pass verification: {reason}",
                    tx.id, tx.tx_hash
                );
                self.transition(&tx, TransactionStatus::Failed).await?;
            }
            SubmitOutcome::UnknownOutput { out_point } => {
                self.resolve_missing_dependency(tx, out_point).await?;
            }
        }
        Ok(())
    }

    /// Three-way decision for a transaction whose input the node cannot
    /// resolve: fail fast when the dependency can never materialize, wait
    /// when it is still moving through the pipeline, and fail on staleness
    /// when the referenced output was consumed elsewhere.
    async fn resolve_missing_dependency(
        &self,
        tx: TransactionRepoModel,
        out_point: OutPoint,
    ) -> Result<(), TransactionError> {
        let dependency = self.transactions.find_by_hash(&out_point.tx_hash).await?;
        match dependency {
            None => {
                error!(
                    "Transaction {} hash {} references out point {out_point} with no local record",
                    tx.id, tx.tx_hash
                );
                self.transition(&tx, TransactionStatus::Failed).await?;
            }
            Some(dep) if dep.status == TransactionStatus::Failed => {
                error!(
                    "Transaction {} hash {} depends on failed transaction {}",
                    tx.id, tx.tx_hash, dep.id
                );
                self.transition(&tx, TransactionStatus::Failed).await?;
            }
            Some(dep)
                if matches!(
                    dep.status,
                    TransactionStatus::Prepared | TransactionStatus::Sent
                ) =>
            {
                info!(
                    "Transaction {} hash {} is waiting for {} hash {}",
                    tx.id, tx.tx_hash, dep.id, dep.tx_hash
                );
            }
            Some(dep) => {
                // Dependency already made it into a block, so its output
                // exists; the reference can only be unresolvable because
                // something else consumed it.
                let dead = match self.ledger.is_output_live(&out_point).await {
                    Ok(live) => !live,
                    Err(err) => {
                        warn!("Liveness of out point {out_point} unknown: {err}");
                        false
                    }
                };
                if dead {
                    error!(
                        "Transaction {} hash {} consumes dead out point {out_point}",
                        tx.id, tx.tx_hash
                    );
                    self.transition(&tx, TransactionStatus::Failed).await?;
                } else {
                    info!(
                        "Transaction {} hash {} is waiting for out point {out_point} of {}",
                        tx.id, tx.tx_hash, dep.id
                    );
                }
            }
        }
        Ok(())
    }
}
