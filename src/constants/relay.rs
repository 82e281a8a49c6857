//! Default policy knobs for the relay passes. All of these are overridable
//! through the environment (see `config`); the values here mirror the
//! behavior the network tolerates in practice.

/// Cadence of the three relay passes.
pub const DEFAULT_SEND_INTERVAL_MS: u64 = 10_000;

/// Upper bound on transactions outstanding in the network's acceptance pool:
/// rows in `Sent` plus submissions in flight never exceed this.
pub const DEFAULT_MAX_PENDING_TXS: usize = 100;

/// How long a `Sent` transaction may stay invisible to the pool before it is
/// considered evicted and re-queued for submission.
pub const DEFAULT_MEMPOOL_STALE_MS: i64 = 120_000;

/// How long a `Sent` transaction may stay without a block association
/// (pooled or proposed) before it is re-queued for submission.
pub const DEFAULT_BLOCK_STALE_MS: i64 = 600_000;

/// Blocks that must be built on top of an including block before a
/// transaction is declared final.
pub const DEFAULT_CONFIRMATION_DEPTH: u64 = 24;
