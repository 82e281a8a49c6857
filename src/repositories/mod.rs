//! # Repository Module
//!
//! Implements the persistence layer for the relayer using the Repository
//! pattern. The relay passes depend on the capability traits; the in-memory
//! implementations back tests and single-process deployments.

use crate::models::RepositoryError;
use async_trait::async_trait;

pub mod transaction;
pub use transaction::*;

pub mod plan;
pub use plan::*;

#[cfg(test)]
use mockall::automock;

#[allow(dead_code)]
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Repository<T: Send + Sync, ID: Send + Sync> {
    async fn create(&self, entity: T) -> Result<T, RepositoryError>;
    async fn get_by_id(&self, id: ID) -> Result<T, RepositoryError>;
    async fn list_all(&self) -> Result<Vec<T>, RepositoryError>;
    async fn count(&self) -> Result<usize, RepositoryError>;
}
