//! In-memory result store

use crate::models::{ContributionSnapshot, UserYear};
use crate::{Result, StoreError};
use std::collections::HashMap;
use tracing::debug;

/// Write-once mapping of (user, year) to the snapshot collected for it.
///
/// One store lives for the duration of a run. Entries are added, never
/// replaced or removed.
#[derive(Debug, Default)]
pub struct ResultStore {
    snapshots: HashMap<UserYear, ContributionSnapshot>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a snapshot under `key`
    pub fn insert(&mut self, key: UserYear, snapshot: ContributionSnapshot) -> Result<()> {
        if !snapshot.is_resolved() {
            return Err(StoreError::EmptyLogin(key));
        }
        if self.snapshots.contains_key(&key) {
            return Err(StoreError::DuplicateKey(key));
        }

        debug!(key = %key, "Stored snapshot");
        self.snapshots.insert(key, snapshot);
        Ok(())
    }

    pub fn get(&self, key: &UserYear) -> Option<&ContributionSnapshot> {
        self.snapshots.get(key)
    }

    pub fn contains(&self, key: &UserYear) -> bool {
        self.snapshots.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&UserYear, &ContributionSnapshot)> {
        self.snapshots.iter()
    }

    /// Keys in (user, year) order
    pub fn keys_sorted(&self) -> Vec<&UserYear> {
        let mut keys: Vec<_> = self.snapshots.keys().collect();
        keys.sort();
        keys
    }
}
