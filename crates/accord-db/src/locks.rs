//! Party-scoped mutual exclusion.
//!
//! `submit_decision` and `terminate` hold the locks of every party they touch
//! for the whole read-check-write sequence. Locks are keyed by actor id,
//! acquired in sorted order so two calls over the same parties can never
//! deadlock, and dropped from the registry once nobody holds or waits on them.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

type Registry = DashMap<String, Arc<Mutex<()>>>;

/// Registry of per-actor async mutexes.
#[derive(Clone, Default)]
pub struct PartyLocks {
    registry: Arc<Registry>,
}

impl PartyLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock every party in `parties`. Duplicates are locked once.
    pub async fn acquire(&self, parties: &[&str]) -> PartyGuard {
        let mut keys: Vec<String> = parties.iter().map(ToString::to_string).collect();
        keys.sort_unstable();
        keys.dedup();

        let mut guards = Vec::with_capacity(keys.len());
        for key in &keys {
            let lock = Arc::clone(
                &*self
                    .registry
                    .entry(key.clone())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            );
            guards.push(lock.lock_owned().await);
        }

        PartyGuard {
            guards,
            keys,
            registry: Arc::clone(&self.registry),
        }
    }

    /// Number of parties with a live lock entry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }
}

/// Held party locks. Released on drop.
pub struct PartyGuard {
    guards: Vec<OwnedMutexGuard<()>>,
    keys: Vec<String>,
    registry: Arc<Registry>,
}

impl PartyGuard {
    /// The parties this guard holds, sorted.
    #[must_use]
    pub fn parties(&self) -> &[String] {
        &self.keys
    }
}

impl Drop for PartyGuard {
    fn drop(&mut self) {
        self.guards.clear();
        // Only the registry itself still references an idle lock.
        for key in &self.keys {
            self.registry
                .remove_if(key, |_, lock| Arc::strong_count(lock) == 1);
        }
    }
}
