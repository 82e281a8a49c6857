//! Tracked-transaction store: bucket scans, hash lookup, and the
//! compare-and-set status update every relay pass goes through.

use crate::models::{RepositoryError, TransactionRepoModel, TransactionStatus};
use crate::repositories::Repository;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;

#[cfg(test)]
use mockall::automock;

/// Ordering key for bucket scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxOrdering {
    CreatedAt,
    UpdatedAt,
}

/// Optional payload fields of a scan. `id`, `status`, and both timestamps
/// are always populated (they drive selection and staleness decisions);
/// projecting away `RawTx` spares the store from shipping the heavy payload
/// column on scans that never submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxField {
    TxHash,
    RawTx,
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Scans one status bucket in the given order. `projection` limits which
    /// payload fields are populated; `None` returns full rows.
    async fn list_by_status(
        &self,
        status: TransactionStatus,
        ordering: TxOrdering,
        ascending: bool,
        projection: Option<Vec<TxField>>,
    ) -> Result<Vec<TransactionRepoModel>, RepositoryError>;

    async fn count_by_status(&self, status: TransactionStatus)
        -> Result<usize, RepositoryError>;

    async fn find_by_hash(
        &self,
        tx_hash: &str,
    ) -> Result<Option<TransactionRepoModel>, RepositoryError>;

    /// Conditional status update: matches on id AND the expected prior
    /// status, refreshing `updated_at` atomically with the change. A miss
    /// (row gone or status moved underneath the caller) is
    /// [`RepositoryError::StaleStatus`] — the caller's in-memory view was
    /// stale and the operation must not proceed on it.
    async fn update_status(
        &self,
        id: &str,
        expected: TransactionStatus,
        new_status: TransactionStatus,
    ) -> Result<TransactionRepoModel, RepositoryError>;
}

pub struct InMemoryTransactionRepository {
    store: Mutex<HashMap<String, TransactionRepoModel>>,
}

impl InMemoryTransactionRepository {
    pub fn new() -> Self {
        Self {
            store: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryTransactionRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_projection(mut tx: TransactionRepoModel, projection: &[TxField]) -> TransactionRepoModel {
    if !projection.contains(&TxField::TxHash) {
        tx.tx_hash = String::new();
    }
    if !projection.contains(&TxField::RawTx) {
        tx.raw_tx = String::new();
    }
    tx
}

#[async_trait]
impl TransactionRepository for InMemoryTransactionRepository {
    async fn list_by_status(
        &self,
        status: TransactionStatus,
        ordering: TxOrdering,
        ascending: bool,
        projection: Option<Vec<TxField>>,
    ) -> Result<Vec<TransactionRepoModel>, RepositoryError> {
        let store = self.store.lock().unwrap();
        let mut rows: Vec<TransactionRepoModel> = store
            .values()
            .filter(|tx| tx.status == status)
            .cloned()
            .collect();
        rows.sort_by_key(|tx| match ordering {
            TxOrdering::CreatedAt => tx.created_at,
            TxOrdering::UpdatedAt => tx.updated_at,
        });
        if !ascending {
            rows.reverse();
        }
        if let Some(fields) = projection {
            rows = rows
                .into_iter()
                .map(|tx| apply_projection(tx, &fields))
                .collect();
        }
        Ok(rows)
    }

    async fn count_by_status(
        &self,
        status: TransactionStatus,
    ) -> Result<usize, RepositoryError> {
        let store = self.store.lock().unwrap();
        Ok(store.values().filter(|tx| tx.status == status).count())
    }

    async fn find_by_hash(
        &self,
        tx_hash: &str,
    ) -> Result<Option<TransactionRepoModel>, RepositoryError> {
        let store = self.store.lock().unwrap();
        Ok(store.values().find(|tx| tx.tx_hash == tx_hash).cloned())
    }

    async fn update_status(
        &self,
        id: &str,
        expected: TransactionStatus,
        new_status: TransactionStatus,
    ) -> Result<TransactionRepoModel, RepositoryError> {
        let mut store = self.store.lock().unwrap();
        match store.get_mut(id) {
            Some(tx) if tx.status == expected => {
                tx.status = new_status;
                tx.updated_at = Utc::now();
                Ok(tx.clone())
            }
            _ => Err(RepositoryError::StaleStatus(format!(
                "Transaction {id} not in expected status {expected}"
            ))),
        }
    }
}

#[async_trait]
impl Repository<TransactionRepoModel, String> for InMemoryTransactionRepository {
    async fn create(
        &self,
        tx: TransactionRepoModel,
    ) -> Result<TransactionRepoModel, RepositoryError> {
        let mut store = self.store.lock().unwrap();
        if store.contains_key(&tx.id) {
            return Err(RepositoryError::ConstraintViolation(format!(
                "Transaction with ID {} already exists",
                tx.id
            )));
        }
        store.insert(tx.id.clone(), tx.clone());
        Ok(tx)
    }

    async fn get_by_id(&self, id: String) -> Result<TransactionRepoModel, RepositoryError> {
        let store = self.store.lock().unwrap();
        store.get(&id).cloned().ok_or_else(|| {
            RepositoryError::NotFound(format!("Transaction with ID {id} not found"))
        })
    }

    async fn list_all(&self) -> Result<Vec<TransactionRepoModel>, RepositoryError> {
        let store = self.store.lock().unwrap();
        Ok(store.values().cloned().collect())
    }

    async fn count(&self) -> Result<usize, RepositoryError> {
        let store = self.store.lock().unwrap();
        Ok(store.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn create_test_transaction(hash: &str) -> TransactionRepoModel {
        TransactionRepoModel::new(hash, format!("{{\"hash\":\"{hash}\"}}"))
    }

    #[tokio::test]
    async fn test_create_and_get_transaction() {
        let repo = InMemoryTransactionRepository::new();
        let tx = create_test_transaction("0x01");

        let created = repo.create(tx.clone()).await.unwrap();
        assert_eq!(created.id, tx.id);
        assert_eq!(repo.count().await.unwrap(), 1);
        assert_eq!(repo.list_all().await.unwrap().len(), 1);

        let stored = repo.get_by_id(tx.id.clone()).await.unwrap();
        assert_eq!(stored.tx_hash, "0x01");
    }

    #[tokio::test]
    async fn test_create_duplicate_id_rejected() {
        let repo = InMemoryTransactionRepository::new();
        let tx = create_test_transaction("0x01");
        repo.create(tx.clone()).await.unwrap();

        let err = repo.create(tx).await.unwrap_err();
        assert!(matches!(err, RepositoryError::ConstraintViolation(_)));
    }

    #[tokio::test]
    async fn test_list_by_status_orders_oldest_first() {
        let repo = InMemoryTransactionRepository::new();
        let mut older = create_test_transaction("0x01");
        older.created_at = Utc::now() - Duration::seconds(60);
        older.updated_at = older.created_at;
        let newer = create_test_transaction("0x02");

        repo.create(newer).await.unwrap();
        repo.create(older).await.unwrap();

        let rows = repo
            .list_by_status(TransactionStatus::Prepared, TxOrdering::CreatedAt, true, None)
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].tx_hash, "0x01");
        assert_eq!(rows[1].tx_hash, "0x02");

        let rows = repo
            .list_by_status(
                TransactionStatus::Prepared,
                TxOrdering::CreatedAt,
                false,
                None,
            )
            .await
            .unwrap();
        assert_eq!(rows[0].tx_hash, "0x02");
    }

    #[tokio::test]
    async fn test_list_by_status_filters_bucket() {
        let repo = InMemoryTransactionRepository::new();
        let tx = create_test_transaction("0x01");
        let id = tx.id.clone();
        repo.create(tx).await.unwrap();
        repo.create(create_test_transaction("0x02")).await.unwrap();
        repo.update_status(&id, TransactionStatus::Prepared, TransactionStatus::Sent)
            .await
            .unwrap();

        let sent = repo
            .list_by_status(TransactionStatus::Sent, TxOrdering::UpdatedAt, true, None)
            .await
            .unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].tx_hash, "0x01");
    }

    #[tokio::test]
    async fn test_projection_strips_unselected_fields() {
        let repo = InMemoryTransactionRepository::new();
        repo.create(create_test_transaction("0x01")).await.unwrap();

        let rows = repo
            .list_by_status(
                TransactionStatus::Prepared,
                TxOrdering::UpdatedAt,
                true,
                Some(vec![TxField::TxHash]),
            )
            .await
            .unwrap();
        assert_eq!(rows[0].tx_hash, "0x01");
        assert!(rows[0].raw_tx.is_empty());
        assert!(!rows[0].id.is_empty());
    }

    #[tokio::test]
    async fn test_count_by_status() {
        let repo = InMemoryTransactionRepository::new();
        let tx = create_test_transaction("0x01");
        let id = tx.id.clone();
        repo.create(tx).await.unwrap();
        repo.create(create_test_transaction("0x02")).await.unwrap();

        assert_eq!(
            repo.count_by_status(TransactionStatus::Prepared).await.unwrap(),
            2
        );
        repo.update_status(&id, TransactionStatus::Prepared, TransactionStatus::Sent)
            .await
            .unwrap();
        assert_eq!(
            repo.count_by_status(TransactionStatus::Prepared).await.unwrap(),
            1
        );
        assert_eq!(
            repo.count_by_status(TransactionStatus::Sent).await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_find_by_hash() {
        let repo = InMemoryTransactionRepository::new();
        repo.create(create_test_transaction("0x01")).await.unwrap();

        assert!(repo.find_by_hash("0x01").await.unwrap().is_some());
        assert!(repo.find_by_hash("0xff").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_status_refreshes_updated_at() {
        let repo = InMemoryTransactionRepository::new();
        let mut tx = create_test_transaction("0x01");
        tx.updated_at = Utc::now() - Duration::seconds(300);
        let id = tx.id.clone();
        repo.create(tx).await.unwrap();

        let updated = repo
            .update_status(&id, TransactionStatus::Prepared, TransactionStatus::Sent)
            .await
            .unwrap();
        assert_eq!(updated.status, TransactionStatus::Sent);
        assert!(updated.age_since_update() < Duration::seconds(5));
    }

    #[tokio::test]
    async fn test_conditional_update_exactly_one_winner() {
        let repo = InMemoryTransactionRepository::new();
        let tx = create_test_transaction("0x01");
        let id = tx.id.clone();
        repo.create(tx).await.unwrap();
        repo.update_status(&id, TransactionStatus::Prepared, TransactionStatus::Sent)
            .await
            .unwrap();

        // Two racers observed the row in Sent; only the first compare-and-set
        // lands, the second must surface a stale-view error.
        let first = repo
            .update_status(&id, TransactionStatus::Sent, TransactionStatus::Committed)
            .await;
        let second = repo
            .update_status(&id, TransactionStatus::Sent, TransactionStatus::Committed)
            .await;

        assert!(first.is_ok());
        assert!(matches!(
            second.unwrap_err(),
            RepositoryError::StaleStatus(_)
        ));
    }

    #[tokio::test]
    async fn test_update_status_unknown_id_is_stale() {
        let repo = InMemoryTransactionRepository::new();
        let err = repo
            .update_status("missing", TransactionStatus::Sent, TransactionStatus::Committed)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::StaleStatus(_)));
    }
}
