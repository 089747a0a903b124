use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// One async mutex per aggregate root (a forum for counter updates, an
/// event for roster changes). Writers that touch several documents of the
/// same aggregate hold its guard for the whole read-modify-write.
#[derive(Clone, Default)]
pub struct AggregateLocks {
    inner: Arc<DashMap<Uuid, Arc<Mutex<()>>>>,
}

impl AggregateLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, id: Uuid) -> OwnedMutexGuard<()> {
        // Clone the Arc out before awaiting so no shard lock is held.
        let mutex = self.inner.entry(id).or_default().clone();
        mutex.lock_owned().await
    }
}
