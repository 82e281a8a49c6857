//! Domain models for the relayer: the tracked transaction and its status
//! state machine, the plan record, and the layered error types.

mod transaction;
pub use transaction::*;

mod plan;
pub use plan::*;

mod error;
pub use error::*;
