//! End-to-end lifecycle tests: the three relay passes against the in-memory
//! repository and a scripted in-test ledger.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};

use ckb_tx_relayer::domain::{RelayPolicy, RelayService};
use ckb_tx_relayer::models::{OutPoint, TransactionRepoModel, TransactionStatus};
use ckb_tx_relayer::repositories::{InMemoryTransactionRepository, Repository};
use ckb_tx_relayer::services::ledger::{LedgerClient, LedgerError, SubmitOutcome, TxStatusView};

/// Ledger stub: accepts every submission and serves statuses from a mutable
/// script the test rewrites between passes.
struct ScriptedLedger {
    statuses: Mutex<HashMap<String, TxStatusView>>,
    tip: AtomicU64,
}

impl ScriptedLedger {
    fn new() -> Self {
        Self {
            statuses: Mutex::new(HashMap::new()),
            tip: AtomicU64::new(0),
        }
    }

    fn set_status(&self, tx_hash: &str, view: TxStatusView) {
        self.statuses
            .lock()
            .unwrap()
            .insert(tx_hash.to_string(), view);
    }

    fn set_tip(&self, tip: u64) {
        self.tip.store(tip, Ordering::SeqCst);
    }
}

#[async_trait]
impl LedgerClient for ScriptedLedger {
    async fn submit_transaction(&self, raw_tx: &str) -> Result<SubmitOutcome, LedgerError> {
        let tx: serde_json::Value =
            serde_json::from_str(raw_tx).map_err(|e| LedgerError::InvalidPayload(e.to_string()))?;
        let tx_hash = tx["hash"].as_str().unwrap_or_default().to_string();
        Ok(SubmitOutcome::Accepted { tx_hash })
    }

    async fn get_transaction_status(&self, tx_hash: &str) -> Result<TxStatusView, LedgerError> {
        Ok(self
            .statuses
            .lock()
            .unwrap()
            .get(tx_hash)
            .cloned()
            .unwrap_or(TxStatusView::NotFound))
    }

    async fn is_output_live(&self, _out_point: &OutPoint) -> Result<bool, LedgerError> {
        Ok(true)
    }

    async fn get_tip_number(&self) -> Result<u64, LedgerError> {
        Ok(self.tip.load(Ordering::SeqCst))
    }
}

fn tracked_tx(hash: &str) -> TransactionRepoModel {
    TransactionRepoModel::new(hash, format!("{{\"hash\":\"{hash}\"}}"))
}

fn relay_setup() -> (
    Arc<ScriptedLedger>,
    Arc<InMemoryTransactionRepository>,
    RelayService<ScriptedLedger, InMemoryTransactionRepository>,
) {
    let ledger = Arc::new(ScriptedLedger::new());
    let repo = Arc::new(InMemoryTransactionRepository::new());
    let service = RelayService::new(
        Arc::clone(&ledger),
        Arc::clone(&repo),
        RelayPolicy::default(),
    );
    (ledger, repo, service)
}

#[tokio::test]
async fn test_full_lifecycle_to_confirmation() {
    let (ledger, repo, service) = relay_setup();
    let tx = tracked_tx("0x01");
    let id = tx.id.clone();
    repo.create(tx).await.unwrap();

    // Broadcast.
    service.process_prepared().await.unwrap();
    let row = repo.get_by_id(id.clone()).await.unwrap();
    assert_eq!(row.status, TransactionStatus::Sent);

    // Pooled but fresh: the mempool tracker leaves it alone.
    ledger.set_status("0x01", TxStatusView::Pending);
    service.process_sent().await.unwrap();
    assert_eq!(
        repo.get_by_id(id.clone()).await.unwrap().status,
        TransactionStatus::Sent
    );

    // Mined at height 100, tip at 110: committed, not yet deep enough.
    ledger.set_status(
        "0x01",
        TxStatusView::Committed {
            block_number: Some(100),
        },
    );
    ledger.set_tip(110);
    service.process_sent().await.unwrap();
    assert_eq!(
        repo.get_by_id(id.clone()).await.unwrap().status,
        TransactionStatus::Committed
    );

    // Tip one block short of the confirmation depth: still committed.
    ledger.set_tip(123);
    service.process_committed().await.unwrap();
    assert_eq!(
        repo.get_by_id(id.clone()).await.unwrap().status,
        TransactionStatus::Committed
    );

    // Depth reached.
    ledger.set_tip(124);
    service.process_committed().await.unwrap();
    assert_eq!(
        repo.get_by_id(id.clone()).await.unwrap().status,
        TransactionStatus::Confirmed
    );

    // Terminal: further passes see empty buckets and change nothing.
    service.process_prepared().await.unwrap();
    service.process_sent().await.unwrap();
    service.process_committed().await.unwrap();
    assert_eq!(
        repo.get_by_id(id).await.unwrap().status,
        TransactionStatus::Confirmed
    );
}

#[tokio::test]
async fn test_evicted_transaction_cycles_back_through_submission() {
    let (_ledger, repo, service) = relay_setup();

    // A row that has sat in Sent past the mempool staleness threshold while
    // the pool lost track of it.
    let mut tx = tracked_tx("0x02");
    tx.status = TransactionStatus::Sent;
    tx.updated_at = Utc::now() - Duration::seconds(130);
    let id = tx.id.clone();
    repo.create(tx).await.unwrap();

    service.process_sent().await.unwrap();
    assert_eq!(
        repo.get_by_id(id.clone()).await.unwrap().status,
        TransactionStatus::Prepared
    );

    // The next submission pass re-broadcasts it.
    service.process_prepared().await.unwrap();
    assert_eq!(
        repo.get_by_id(id).await.unwrap().status,
        TransactionStatus::Sent
    );
}

#[tokio::test]
async fn test_reorged_transaction_cycles_back_through_submission() {
    let (ledger, repo, service) = relay_setup();

    let mut tx = tracked_tx("0x03");
    tx.status = TransactionStatus::Committed;
    let id = tx.id.clone();
    repo.create(tx).await.unwrap();

    // The node no longer knows the hash: its block was reorganized away.
    ledger.set_tip(500);
    service.process_committed().await.unwrap();
    assert_eq!(
        repo.get_by_id(id.clone()).await.unwrap().status,
        TransactionStatus::Prepared
    );

    service.process_prepared().await.unwrap();
    assert_eq!(
        repo.get_by_id(id).await.unwrap().status,
        TransactionStatus::Sent
    );
}

#[tokio::test]
async fn test_submission_preserves_creation_order() {
    let (_ledger, repo, service) = relay_setup();

    let mut first = tracked_tx("0x0a");
    first.created_at = Utc::now() - Duration::seconds(60);
    first.updated_at = first.created_at;
    let second = tracked_tx("0x0b");

    // Inserted newest-first; the pass must still submit all of them.
    repo.create(second.clone()).await.unwrap();
    repo.create(first.clone()).await.unwrap();

    service.process_prepared().await.unwrap();
    assert_eq!(
        repo.get_by_id(first.id).await.unwrap().status,
        TransactionStatus::Sent
    );
    assert_eq!(
        repo.get_by_id(second.id).await.unwrap().status,
        TransactionStatus::Sent
    );
}
