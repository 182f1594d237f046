//! Keyed async lock table for per-match and per-participant exclusion
//!
//! Operations that touch several records (kick touches the admin and the
//! target) acquire all their keys in ascending order, so two operations can
//! never hold locks in a cycle.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Map of string key to a shared async mutex.
///
/// Entries are created on first use and pruned once no operation holds or
/// awaits them, so the table stays bounded by the number of in-flight
/// operations rather than the number of matches ever created.
#[derive(Default)]
pub struct LockTable {
    inner: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl LockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire every key in `keys`, sorted ascending and deduplicated.
    ///
    /// The returned guards release on drop; hold them for the duration of
    /// the store mutation they protect.
    pub async fn acquire(&self, keys: &[&str]) -> Vec<OwnedMutexGuard<()>> {
        let mut sorted: Vec<&str> = keys.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let mut guards = Vec::with_capacity(sorted.len());
        for key in sorted {
            let lock = {
                let mut table = self.inner.lock().await;
                table.retain(|_, l| Arc::strong_count(l) > 1);
                table
                    .entry(key.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(())))
                    .clone()
            };
            guards.push(lock.lock_owned().await);
        }
        guards
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}
