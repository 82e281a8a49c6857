//! External service façades consumed by the relay passes.

pub mod ledger;
pub use ledger::*;
