//! Runtime configuration, read from the environment (a `.env` file is
//! loaded by `main` before this runs). Every knob has a default from
//! `constants`; none is required.

use std::env;
use std::str::FromStr;

use crate::constants::{
    DEFAULT_BLOCK_STALE_MS, DEFAULT_CONFIRMATION_DEPTH, DEFAULT_MAX_PENDING_TXS,
    DEFAULT_MEMPOOL_STALE_MS, DEFAULT_SEND_INTERVAL_MS,
};

#[derive(Debug, Clone)]
pub struct RelayerConfig {
    /// Cadence of the three relay passes.
    pub send_interval_ms: u64,
    pub max_pending_txs: usize,
    /// Explicit node endpoint; the network profile's public default is used
    /// when unset.
    pub rpc_url: Option<String>,
    pub is_mainnet: bool,
    pub mempool_stale_ms: i64,
    pub block_stale_ms: i64,
    pub confirmation_depth: u64,
}

impl RelayerConfig {
    pub fn from_env() -> Self {
        Self {
            send_interval_ms: env_parsed("SEND_INTERVAL_MS", DEFAULT_SEND_INTERVAL_MS),
            max_pending_txs: env_parsed("MAX_PENDING_TXS", DEFAULT_MAX_PENDING_TXS),
            rpc_url: env::var("CKB_RPC_URL").ok().filter(|url| !url.is_empty()),
            is_mainnet: env_flag("IS_MAINNET"),
            mempool_stale_ms: env_parsed("MEMPOOL_STALE_MS", DEFAULT_MEMPOOL_STALE_MS),
            block_stale_ms: env_parsed("BLOCK_STALE_MS", DEFAULT_BLOCK_STALE_MS),
            confirmation_depth: env_parsed("CONFIRMATION_DEPTH", DEFAULT_CONFIRMATION_DEPTH),
        }
    }
}

fn env_parsed<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

fn env_flag(key: &str) -> bool {
    env::var(key)
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
