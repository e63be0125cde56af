//! Keyed lock registries.
//!
//! Mutations of one event are serialized behind that event's mutex; match
//! updates share a round's read lock while completing the round takes it
//! exclusively. Entries are created on first use and kept for the life of the
//! process.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use super::models::{EventId, RoundId};

/// Lazily populated map from key to a shared lock
pub struct LockRegistry<K, L> {
    locks: Mutex<HashMap<K, Arc<L>>>,
}

impl<K, L> Default for LockRegistry<K, L> {
    fn default() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, L> LockRegistry<K, L>
where
    K: Eq + Hash + Copy,
    L: Default,
{
    /// Lock for `key`, created on first request
    pub fn get(&self, key: K) -> Arc<L> {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key)
            .or_default()
            .clone()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Per-event exclusive locks
pub type EventLocks = LockRegistry<EventId, tokio::sync::Mutex<()>>;

/// Per-round transition locks
pub type RoundLocks = LockRegistry<RoundId, tokio::sync::RwLock<()>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_key_shares_lock() {
        let locks = EventLocks::default();
        let a = locks.get(1);
        let b = locks.get(1);
        let c = locks.get(2);

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn test_event_lock_excludes() {
        let locks = EventLocks::default();
        let lock = locks.get(7);
        let _guard = lock.lock().await;
        assert!(locks.get(7).try_lock().is_err());
        assert!(locks.get(8).try_lock().is_ok());
    }
}
