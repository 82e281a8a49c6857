//! HTTP JSON-RPC implementation of [`LedgerClient`] for CKB nodes.
//!
//! Wire-level concerns live here: request shaping, node error-message
//! classification, and the header lookup that resolves a committed
//! transaction's block height.

use std::time::Duration;

use async_trait::async_trait;
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};

use super::{LedgerClient, LedgerError, SubmitOutcome, TxStatusView};
use crate::constants::{DEFAULT_RPC_TIMEOUT_SECS, MAINNET_RPC_URL, TESTNET_RPC_URL};
use crate::models::OutPoint;

/// Matches the out point the node names in a "failed to resolve" rejection,
/// e.g. `Resolve(Unknown(OutPoint(0x<hash>, 0)))`.
static UNKNOWN_OUT_POINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"OutPoint\s*\(\s*(0x[0-9a-fA-F]{64})\s*,\s*(\d+)\s*\)")
        .expect("out point pattern is valid")
});

/// Network selection for the client. One client type serves both; the
/// profile only picks chain parameters and a default endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkProfile {
    Mainnet,
    Testnet,
}

impl NetworkProfile {
    pub fn from_is_mainnet(is_mainnet: bool) -> Self {
        if is_mainnet {
            NetworkProfile::Mainnet
        } else {
            NetworkProfile::Testnet
        }
    }

    pub fn default_rpc_url(&self) -> &'static str {
        match self {
            NetworkProfile::Mainnet => MAINNET_RPC_URL,
            NetworkProfile::Testnet => TESTNET_RPC_URL,
        }
    }
}

/// JSON-RPC client for a CKB node.
#[derive(Debug, Clone)]
pub struct HttpLedgerClient {
    http: reqwest::Client,
    rpc_url: String,
}

impl HttpLedgerClient {
    /// Builds a client for the given profile. An explicit `rpc_url`
    /// overrides the profile's public default endpoint.
    pub fn new(profile: NetworkProfile, rpc_url: Option<String>) -> Result<Self, LedgerError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_RPC_TIMEOUT_SECS))
            .build()
            .map_err(|e| LedgerError::Other(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            rpc_url: rpc_url.unwrap_or_else(|| profile.default_rpc_url().to_string()),
        })
    }

    async fn rpc_call(&self, method: &str, params: Value) -> Result<Value, LedgerError> {
        let body = json!({
            "id": 1,
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
        });
        let response = self
            .http
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let envelope: Value = response
            .json()
            .await
            .map_err(|e| LedgerError::InvalidResponse(format!("{method}: {e}")))?;

        if let Some(error) = envelope.get("error").filter(|e| !e.is_null()) {
            return Err(LedgerError::RpcErrorCode {
                code: error.get("code").and_then(Value::as_i64).unwrap_or(0),
                message: error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            });
        }

        Ok(envelope.get("result").cloned().unwrap_or(Value::Null))
    }

    /// Resolves a block hash to its height. Failures degrade to `None`
    /// rather than failing the surrounding status query; a missing height
    /// reads as "committed, depth unknown" to the trackers.
    async fn block_number_of(&self, block_hash: &str) -> Option<u64> {
        match self.rpc_call("get_header", json!([block_hash])).await {
            Ok(header) => match header.get("number").and_then(Value::as_str) {
                Some(number) => parse_hex_u64(number).ok(),
                None => None,
            },
            Err(e) => {
                warn!("Failed to fetch header {block_hash}: {e}");
                None
            }
        }
    }
}

#[async_trait]
impl LedgerClient for HttpLedgerClient {
    async fn submit_transaction(&self, raw_tx: &str) -> Result<SubmitOutcome, LedgerError> {
        let tx: Value = serde_json::from_str(raw_tx)
            .map_err(|e| LedgerError::InvalidPayload(e.to_string()))?;

        match self
            .rpc_call("send_transaction", json!([tx, "passthrough"]))
            .await
        {
            Ok(result) => {
                let tx_hash = result
                    .as_str()
                    .ok_or_else(|| {
                        LedgerError::InvalidResponse(
                            "send_transaction returned a non-string hash".to_string(),
                        )
                    })?
                    .to_string();
                Ok(SubmitOutcome::Accepted { tx_hash })
            }
            Err(LedgerError::RpcErrorCode { code, message }) => {
                classify_rejection(code, message)
            }
            Err(e) => Err(e),
        }
    }

    async fn get_transaction_status(&self, tx_hash: &str) -> Result<TxStatusView, LedgerError> {
        let result = self.rpc_call("get_transaction", json!([tx_hash])).await?;
        if result.is_null() {
            return Ok(TxStatusView::NotFound);
        }

        let tx_status = &result["tx_status"];
        let status = tx_status
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or("unknown");

        let view = match status {
            "pending" => TxStatusView::Pending,
            "proposed" => TxStatusView::Proposed,
            "committed" => {
                let block_number = match tx_status.get("block_hash").and_then(Value::as_str) {
                    Some(block_hash) => self.block_number_of(block_hash).await,
                    None => None,
                };
                TxStatusView::Committed { block_number }
            }
            "rejected" => TxStatusView::Rejected {
                reason: tx_status
                    .get("reason")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            },
            _ => TxStatusView::NotFound,
        };
        Ok(view)
    }

    async fn is_output_live(&self, out_point: &OutPoint) -> Result<bool, LedgerError> {
        let params = json!([
            {
                "tx_hash": out_point.tx_hash,
                "index": format!("{:#x}", out_point.index),
            },
            false,
        ]);
        let result = self.rpc_call("get_live_cell", params).await?;
        let status = result
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or("unknown");

        match status {
            "live" => Ok(true),
            "dead" => Ok(false),
            _ => {
                // The node does not index spent cells: "unknown" covers both
                // never-existed and already-consumed. The output is known
                // dead only if its creating transaction is committed.
                match self.get_transaction_status(&out_point.tx_hash).await? {
                    TxStatusView::Committed { .. } => Ok(false),
                    _ => Err(LedgerError::InconclusiveLiveness(out_point.to_string())),
                }
            }
        }
    }

    async fn get_tip_number(&self) -> Result<u64, LedgerError> {
        let result = self.rpc_call("get_tip_block_number", json!([])).await?;
        let tip = result.as_str().ok_or_else(|| {
            LedgerError::InvalidResponse("get_tip_block_number returned a non-string".to_string())
        })?;
        parse_hex_u64(tip)
    }
}

/// Maps a `send_transaction` node error onto the typed outcome. Messages the
/// classifier does not recognize stay on the `Err` branch and abort the
/// submission pass for the tick.
fn classify_rejection(code: i64, message: String) -> Result<SubmitOutcome, LedgerError> {
    if message.contains("PoolRejectedDuplicatedTransaction") {
        return Ok(SubmitOutcome::Duplicate);
    }

    if message.contains("TransactionFailedToVerify") || message.contains("RBFRejected") {
        return Ok(SubmitOutcome::Rejected { reason: message });
    }

    if message.contains("TransactionFailedToResolve") && message.contains("Unknown") {
        if let Some(captures) = UNKNOWN_OUT_POINT.captures(&message) {
            let index = captures[2]
                .parse::<u32>()
                .map_err(|e| LedgerError::InvalidResponse(format!("out point index: {e}")))?;
            return Ok(SubmitOutcome::UnknownOutput {
                out_point: OutPoint {
                    tx_hash: captures[1].to_string(),
                    index,
                },
            });
        }
    }

    Err(LedgerError::RpcErrorCode { code, message })
}

fn parse_hex_u64(value: &str) -> Result<u64, LedgerError> {
    u64::from_str_radix(value.trim_start_matches("0x"), 16)
        .map_err(|e| LedgerError::InvalidResponse(format!("hex number {value}: {e}")))
}
