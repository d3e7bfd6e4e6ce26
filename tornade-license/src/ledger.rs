//! Device activation ledger.
//!
//! Validates keys, enforces the per-key device cap and records activations
//! idempotently. The read-check-write sequence for a key runs under a per-key
//! async mutex, so two new devices racing for the last slot can never both
//! be written. A key stays locked until its write has finished, even when the
//! caller gave up waiting. Different keys never share a lock.

use crate::config::LicenseConfig;
use crate::device::DeviceId;
use crate::error::{LicenseError, LicenseResult};
use crate::key::{self, LicenseKey};
use crate::store::{ActivationRecord, ActivationStore, record_key};
use crate::token::ActivationToken;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, Weak};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

/// Minimum map size before dead lock entries are swept.
const LOCK_PRUNE_THRESHOLD: usize = 1024;

#[derive(Debug)]
struct LockMap {
    entries: HashMap<String, Weak<Mutex<()>>>,
    /// Next sweep runs once the map reaches this size.
    sweep_at: usize,
}

impl Default for LockMap {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            sweep_at: LOCK_PRUNE_THRESHOLD,
        }
    }
}

/// Per-key mutual exclusion.
///
/// Entries are weak so a key's mutex is freed as soon as no request holds or
/// waits on it. After a sweep the threshold moves to twice the surviving
/// size, keeping sweeps amortized O(1) per insert.
#[derive(Debug, Default)]
struct KeyLocks {
    locks: std::sync::Mutex<LockMap>,
}

impl KeyLocks {
    async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        self.entry(key).lock_owned().await
    }

    fn entry(&self, key: &str) -> Arc<Mutex<()>> {
        let mut map = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = map.entries.get(key).and_then(Weak::upgrade) {
            return existing;
        }
        if map.entries.len() >= map.sweep_at {
            map.entries.retain(|_, lock| lock.strong_count() > 0);
            map.sweep_at = (map.entries.len() * 2).max(LOCK_PRUNE_THRESHOLD);
        }
        let lock = Arc::new(Mutex::new(()));
        map.entries.insert(key.to_string(), Arc::downgrade(&lock));
        lock
    }

    #[cfg(test)]
    fn live_entries(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .values()
            .filter(|lock| lock.strong_count() > 0)
            .count()
    }

    #[cfg(test)]
    fn stats(&self) -> (usize, usize) {
        let map = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        (map.entries.len(), map.sweep_at)
    }
}

/// Validates keys and registers devices against a store.
pub struct ActivationLedger<S: ActivationStore + ?Sized = dyn ActivationStore> {
    config: Arc<LicenseConfig>,
    store: Arc<S>,
    locks: KeyLocks,
}

impl<S: ActivationStore + ?Sized + 'static> ActivationLedger<S> {
    /// Creates a ledger over `store`.
    pub fn new(config: Arc<LicenseConfig>, store: Arc<S>) -> Self {
        Self {
            config,
            store,
            locks: KeyLocks::default(),
        }
    }

    /// Returns the shared configuration.
    pub fn config(&self) -> &LicenseConfig {
        &self.config
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Checks a key's structure and checksum. No issuance record is consulted.
    pub fn validate_format(&self, raw_key: &str) -> bool {
        key::validate_format(raw_key, self.config.secret())
    }

    /// Registers `device_id` against `raw_key` and returns its token.
    ///
    /// Re-activating an already registered device returns the same token
    /// without writing. A new device is refused once the key holds
    /// `max_activations` devices.
    ///
    /// # Errors
    ///
    /// - [`LicenseError::InvalidRequest`] if either input is empty
    /// - [`LicenseError::InvalidKey`] if the key fails validation
    /// - [`LicenseError::MaxActivationsReached`] if a new device exceeds the cap
    /// - [`LicenseError::StoreUnavailable`] if the store fails or times out
    pub async fn activate(&self, raw_key: &str, device_id: &str) -> LicenseResult<ActivationToken> {
        let device = DeviceId::new(device_id)?;
        let key = LicenseKey::parse(raw_key, &self.config).inspect_err(|e| {
            debug!("Rejected activation for device {}: {}", device.redacted(), e);
        })?;
        let store_key = record_key(&key);

        let guard = self.locks.lock(&store_key).await;

        let mut record = self.load(&store_key).await?.unwrap_or_default();
        if record.contains(&device) {
            debug!(
                "Key {} already activated for device {}",
                key.redacted(),
                device.redacted()
            );
            return Ok(ActivationToken::derive(&self.config, &key, &device));
        }

        let max = self.config.max_activations();
        if record.len() >= max as usize {
            warn!("Max activations reached for key {}", key.redacted());
            return Err(LicenseError::MaxActivationsReached(max));
        }

        let token = ActivationToken::derive(&self.config, &key, &device);
        let redacted_device = device.redacted();
        record.insert(device);
        self.save(store_key, record.clone(), guard).await?;

        info!(
            "Activated key {} for device {} ({}/{})",
            key.redacted(),
            redacted_device,
            record.len(),
            max
        );
        Ok(token)
    }

    /// Returns the devices registered for a key (empty if none).
    ///
    /// # Errors
    ///
    /// Fails like [`activate`](Self::activate) for an invalid key or store error.
    pub async fn activations(&self, raw_key: &str) -> LicenseResult<ActivationRecord> {
        let key = LicenseKey::parse(raw_key, &self.config)?;
        Ok(self.load(&record_key(&key)).await?.unwrap_or_default())
    }

    async fn load(&self, store_key: &str) -> LicenseResult<Option<ActivationRecord>> {
        self.with_timeout("read", self.store.get(store_key)).await
    }

    /// Writes `record` on a spawned task that owns the key's guard.
    ///
    /// The key stays locked until the store call has actually finished, even
    /// if this request times out or is cancelled first. A late write can
    /// therefore never overwrite a newer record for the same key.
    async fn save(
        &self,
        store_key: String,
        record: ActivationRecord,
        guard: OwnedMutexGuard<()>,
    ) -> LicenseResult<()> {
        let store = Arc::clone(&self.store);
        let write = tokio::spawn(async move {
            let result = store.set(&store_key, &record).await;
            drop(guard);
            result
        });
        self.with_timeout("write", async move {
            write
                .await
                .map_err(|e| LicenseError::StoreUnavailable(format!("write task failed: {e}")))?
        })
        .await
    }

    async fn with_timeout<T>(
        &self,
        op: &str,
        call: impl Future<Output = LicenseResult<T>>,
    ) -> LicenseResult<T> {
        let limit = self.config.store_timeout();
        match tokio::time::timeout(limit, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(LicenseError::StoreUnavailable(msg))) => {
                warn!("Activation store {} failed: {}", op, msg);
                Err(LicenseError::StoreUnavailable(msg))
            }
            Ok(Err(e)) => {
                warn!("Activation store {} failed: {}", op, e);
                Err(LicenseError::StoreUnavailable(e.to_string()))
            }
            Err(_) => {
                warn!("Activation store {} timed out after {:?}", op, limit);
                Err(LicenseError::StoreUnavailable(format!(
                    "{op} timed out after {limit:?}"
                )))
            }
        }
    }

    #[cfg(test)]
    fn live_locks(&self) -> usize {
        self.locks.live_entries()
    }
}
