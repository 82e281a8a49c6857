//! # CKB Transaction Relayer
//!
//! A relay daemon for pre-built CKB transactions: broadcasts `Prepared`
//! payloads to the network under a bounded pending quota and tracks each one
//! through mempool acceptance, block inclusion, and final confirmation,
//! recovering automatically from rejection, eviction, and chain
//! reorganization.
//!
//! The lifecycle logic lives in [`domain::relay`]; persistence is behind the
//! traits in [`repositories`]; node access is behind
//! [`services::ledger::LedgerClient`].

pub mod config;
pub mod constants;
pub mod domain;
pub mod logging;
pub mod models;
pub mod repositories;
pub mod services;
pub mod utils;
