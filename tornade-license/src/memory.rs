//! In-memory activation store for tests and local development.

use crate::error::LicenseResult;
use crate::store::{ActivationRecord, ActivationStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

/// Process-local store. Records are lost on drop.
#[derive(Debug, Default)]
pub struct MemoryActivationStore {
    records: RwLock<HashMap<String, ActivationRecord>>,
    writes: AtomicUsize,
}

impl MemoryActivationStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `set` calls served so far.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if nothing has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ActivationStore for MemoryActivationStore {
    async fn get(&self, key: &str) -> LicenseResult<Option<ActivationRecord>> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        Ok(records.get(key).cloned())
    }

    async fn set(&self, key: &str, record: &ActivationRecord) -> LicenseResult<()> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        records.insert(key.to_string(), record.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
