use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use ti_types::IdentityAddress;

/// Per-address lock for trust transitions.
/// Transitions on different addresses run concurrently.
/// Transitions on the same address are serialized, since the engine's evidence
/// lookups are read-then-decide.
#[derive(Default)]
pub struct AddressLocks {
    locks: Mutex<HashMap<IdentityAddress, Arc<Mutex<()>>>>,
}

impl AddressLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the lock for a specific address.
    fn lock_for(&self, address: &IdentityAddress) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks
            .entry(address.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Run `f` while holding the lock for `address`.
    pub fn with_lock<F, R>(&self, address: &IdentityAddress, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let lock = self.lock_for(address);
        let result = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };
        drop(lock);
        self.cleanup();
        result
    }

    /// Number of addresses that currently have a lock entry.
    pub fn active_addresses(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Drop lock entries that nobody is holding or waiting on.
    pub fn cleanup(&self) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }
}
