//! Core domain logic: the transaction lifecycle manager.

pub mod relay;
pub use relay::*;
