mod repository;
pub use repository::*;

mod transaction;
pub use transaction::*;
