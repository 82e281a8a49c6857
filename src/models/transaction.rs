//! Tracked-transaction model and status state machine.
//!
//! A row is created externally in `Prepared` state with its hash and raw
//! payload already fixed; from there every mutation is a status transition
//! applied by the relay passes through conditional repository updates.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{Display, EnumString};
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString,
)]
pub enum TransactionStatus {
    Prepared,
    Sent,
    Committed,
    Failed,
    Confirmed,
}

impl TransactionStatus {
    /// Terminal states are never mutated again.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Failed | TransactionStatus::Confirmed
        )
    }

    /// Valid edges of the lifecycle graph.
    ///
    /// Forward edges never skip a state, with one exception: `Sent ->
    /// Confirmed` is allowed when a single status poll already reports the
    /// transaction committed at sufficient depth. The backward edges
    /// `Sent -> Prepared` and `Committed -> Prepared` are the
    /// eviction/reorg recovery path.
    pub fn can_transition_to(&self, next: TransactionStatus) -> bool {
        use TransactionStatus::*;
        matches!(
            (self, next),
            (Prepared, Sent)
                | (Prepared, Failed)
                | (Sent, Committed)
                | (Sent, Confirmed)
                | (Sent, Failed)
                | (Sent, Prepared)
                | (Committed, Confirmed)
                | (Committed, Failed)
                | (Committed, Prepared)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionRepoModel {
    pub id: String,
    /// Content hash of the serialized transaction, 0x-prefixed hex.
    /// Immutable; the network-visible identifier.
    pub tx_hash: String,
    /// Serialized transaction payload (JSON text). Opaque to the relay
    /// beyond being re-parsed for submission.
    pub raw_tx: String,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    /// Refreshed atomically with every status change; the only clock basis
    /// for staleness decisions.
    pub updated_at: DateTime<Utc>,
}

impl TransactionRepoModel {
    pub fn new(tx_hash: impl Into<String>, raw_tx: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            tx_hash: tx_hash.into(),
            raw_tx: raw_tx.into(),
            status: TransactionStatus::Prepared,
            created_at: now,
            updated_at: now,
        }
    }

    /// Time spent in the current status.
    pub fn age_since_update(&self) -> Duration {
        Utc::now().signed_duration_since(self.updated_at)
    }
}

/// Reference to a specific output of a prior transaction, consumed as an
/// input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutPoint {
    pub tx_hash: String,
    pub index: u32,
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tx_hash, self.index)
    }
}
