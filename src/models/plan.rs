//! Plan model: a simple record of an intended on-chain action, advanced
//! through `Saved -> TxCreated -> Finished` by its callers. Unlike the
//! tracked transaction, a plan carries no temporal state machine; the relay
//! never touches it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString,
)]
pub enum PlanStatus {
    Saved,
    TxCreated,
    Finished,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanRepoModel {
    pub id: String,
    pub address: String,
    /// Serialized type script of the target cell.
    pub raw_type: String,
    /// Decimal string; amounts are never arithmetic inputs here.
    pub amount: String,
    pub block_number: u64,
    pub tx_hash: Option<String>,
    pub status: PlanStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PlanRepoModel {
    pub fn new(
        address: impl Into<String>,
        raw_type: impl Into<String>,
        amount: impl Into<String>,
        block_number: u64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            address: address.into(),
            raw_type: raw_type.into(),
            amount: amount.into(),
            block_number,
            tx_hash: None,
            status: PlanStatus::Saved,
            created_at: now,
            updated_at: now,
        }
    }
}
