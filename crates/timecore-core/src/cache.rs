//! Per-customer project cache
//!
//! Edit forms ask for a customer's projects every time a row is opened; the
//! list rarely changes, so it is fetched once per customer.

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::api::TimeCoreApi;
use crate::error::Result;
use crate::models::Project;

#[derive(Debug, Default)]
pub struct ProjectCache {
    entries: Mutex<HashMap<i64, Vec<Project>>>,
}

impl ProjectCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached projects for `customer_id`, loading them through `api` on a miss.
    ///
    /// Failed loads are not cached.
    pub async fn get_or_load<A: TimeCoreApi>(&self, api: &A, customer_id: i64) -> Result<Vec<Project>> {
        if let Some(projects) = self.entries.lock().await.get(&customer_id) {
            return Ok(projects.clone());
        }

        tracing::debug!(customer_id, "Loading projects");
        let projects = api.list_projects(customer_id).await?;
        self.entries
            .lock()
            .await
            .insert(customer_id, projects.clone());
        Ok(projects)
    }

    pub async fn invalidate(&self, customer_id: i64) {
        self.entries.lock().await.remove(&customer_id);
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}
