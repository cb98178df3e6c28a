//! Dashboard view cache
//!
//! Per-restaurant aggregates, computed on first read and invalidated by every
//! order write. Each invalidation bumps the restaurant's epoch; a computation
//! that raced with an invalidation is returned but not cached.

use std::sync::Arc;

use dashmap::DashMap;
use shared::order::DashboardStats;
use shared::util::now_millis;

use crate::repo::{OrderRepository, RepoResult};

#[derive(Clone, Default)]
pub struct DashboardCache {
    entries: Arc<DashMap<String, DashboardStats>>,
    epochs: Arc<DashMap<String, u64>>,
}

impl DashboardCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn epoch(&self, restaurant_id: &str) -> u64 {
        self.epochs.get(restaurant_id).map(|e| *e).unwrap_or(0)
    }

    pub fn cached(&self, restaurant_id: &str) -> Option<DashboardStats> {
        self.entries.get(restaurant_id).map(|s| s.clone())
    }

    pub fn invalidate(&self, restaurant_id: &str) {
        *self.epochs.entry(restaurant_id.to_string()).or_insert(0) += 1;
        self.entries.remove(restaurant_id);
        tracing::debug!(restaurant_id = %restaurant_id, "Dashboard cache invalidated");
    }

    pub async fn get_or_compute(
        &self,
        restaurant_id: &str,
        orders: &dyn OrderRepository,
    ) -> RepoResult<DashboardStats> {
        if let Some(stats) = self.cached(restaurant_id) {
            return Ok(stats);
        }

        let epoch = self.epoch(restaurant_id);
        let all = orders.list_all(restaurant_id).await?;
        let stats = DashboardStats::from_orders(restaurant_id, &all, now_millis());

        if self.epoch(restaurant_id) == epoch {
            self.entries.insert(restaurant_id.to_string(), stats.clone());
        }
        Ok(stats)
    }
}
