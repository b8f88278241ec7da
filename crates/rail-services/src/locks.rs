//! In-process serialisation of allocations per inventory
//!
//! Two bookings for the same (train, class, date) must not both read the
//! same snapshot. Bookings for different inventories never contend.

use parking_lot::Mutex;
use rail_core::models::InventoryKey;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

#[derive(Debug, Default)]
pub struct InventoryLocks {
    locks: Mutex<HashMap<InventoryKey, Arc<AsyncMutex<()>>>>,
}

impl InventoryLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to one inventory
    pub async fn acquire(&self, key: &InventoryKey) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock();
            // Drop entries nobody holds or waits on
            locks.retain(|_, l| Arc::strong_count(l) > 1);
            locks.entry(key.clone()).or_default().clone()
        };

        let guard = lock.lock_owned().await;
        debug!("Acquired inventory lock {}", key);
        guard
    }

    /// Number of inventories currently tracked
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.lock().is_empty()
    }
}
