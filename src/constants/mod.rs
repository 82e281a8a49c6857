mod relay;
pub use relay::*;

mod ledger;
pub use ledger::*;
