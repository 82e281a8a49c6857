//! Plan store. Plain CRUD with two conditional mutators; the relay passes
//! never read this table.

use crate::models::{PlanRepoModel, PlanStatus, RepositoryError};
use crate::repositories::Repository;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;

#[cfg(test)]
use mockall::automock;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait PlanRepository: Send + Sync {
    async fn list_by_status(
        &self,
        status: PlanStatus,
    ) -> Result<Vec<PlanRepoModel>, RepositoryError>;

    /// Conditional status update keyed on id and expected prior status; a
    /// miss is [`RepositoryError::StaleStatus`].
    async fn update_status(
        &self,
        id: &str,
        expected: PlanStatus,
        new_status: PlanStatus,
    ) -> Result<PlanRepoModel, RepositoryError>;

    /// Records the transaction built for this plan and advances it to
    /// `TxCreated` in the same write.
    async fn update_tx_hash(&self, id: &str, tx_hash: &str)
        -> Result<PlanRepoModel, RepositoryError>;
}

pub struct InMemoryPlanRepository {
    store: Mutex<HashMap<String, PlanRepoModel>>,
}

impl InMemoryPlanRepository {
    pub fn new() -> Self {
        Self {
            store: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryPlanRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlanRepository for InMemoryPlanRepository {
    async fn list_by_status(
        &self,
        status: PlanStatus,
    ) -> Result<Vec<PlanRepoModel>, RepositoryError> {
        let store = self.store.lock().unwrap();
        let mut rows: Vec<PlanRepoModel> = store
            .values()
            .filter(|plan| plan.status == status)
            .cloned()
            .collect();
        rows.sort_by_key(|plan| plan.created_at);
        Ok(rows)
    }

    async fn update_status(
        &self,
        id: &str,
        expected: PlanStatus,
        new_status: PlanStatus,
    ) -> Result<PlanRepoModel, RepositoryError> {
        let mut store = self.store.lock().unwrap();
        match store.get_mut(id) {
            Some(plan) if plan.status == expected => {
                plan.status = new_status;
                plan.updated_at = Utc::now();
                Ok(plan.clone())
            }
            _ => Err(RepositoryError::StaleStatus(format!(
                "Plan {id} not in expected status {expected}"
            ))),
        }
    }

    async fn update_tx_hash(
        &self,
        id: &str,
        tx_hash: &str,
    ) -> Result<PlanRepoModel, RepositoryError> {
        let mut store = self.store.lock().unwrap();
        match store.get_mut(id) {
            Some(plan) => {
                plan.tx_hash = Some(tx_hash.to_string());
                plan.status = PlanStatus::TxCreated;
                plan.updated_at = Utc::now();
                Ok(plan.clone())
            }
            None => Err(RepositoryError::NotFound(format!(
                "Plan with ID {id} not found"
            ))),
        }
    }
}

#[async_trait]
impl Repository<PlanRepoModel, String> for InMemoryPlanRepository {
    async fn create(&self, plan: PlanRepoModel) -> Result<PlanRepoModel, RepositoryError> {
        let mut store = self.store.lock().unwrap();
        if store.contains_key(&plan.id) {
            return Err(RepositoryError::ConstraintViolation(format!(
                "Plan with ID {} already exists",
                plan.id
            )));
        }
        store.insert(plan.id.clone(), plan.clone());
        Ok(plan)
    }

    async fn get_by_id(&self, id: String) -> Result<PlanRepoModel, RepositoryError> {
        let store = self.store.lock().unwrap();
        store
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("Plan with ID {id} not found")))
    }

    async fn list_all(&self) -> Result<Vec<PlanRepoModel>, RepositoryError> {
        let store = self.store.lock().unwrap();
        Ok(store.values().cloned().collect())
    }

    async fn count(&self) -> Result<usize, RepositoryError> {
        let store = self.store.lock().unwrap();
        Ok(store.len())
    }
}
