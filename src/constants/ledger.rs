//! Ledger RPC endpoint defaults.

pub const MAINNET_RPC_URL: &str = "https://mainnet.ckb.dev/rpc";
pub const TESTNET_RPC_URL: &str = "https://testnet.ckb.dev/rpc";

/// Request timeout for node RPC calls. A timeout is surfaced as a transient
/// ledger error and never as a terminal transaction state.
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 30;
