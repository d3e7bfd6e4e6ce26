//! Shared test helpers for license tests.

#![allow(dead_code)]

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;
use std::time::Duration;
use tornade_license::{
    ActivationLedger, ActivationRecord, ActivationStore, LicenseConfig, LicenseError,
    LicenseResult, LicenseSecret, MemoryActivationStore,
};

pub const SECRET: &str = "s3cret";

/// Fixed key for payload `AAAAAAAA-BBBBBBBB-CCCCCCCC` under [`SECRET`].
pub const FIXED_KEY: &str = "TORNADE-AAAAAAAA-BBBBBBBB-CCCCCCCC-1038";

/// Returns a config over [`SECRET`] with the given device cap.
pub fn test_config(max_activations: u32) -> Arc<LicenseConfig> {
    let config = LicenseConfig::new(LicenseSecret::new(SECRET).unwrap())
        .with_max_activations(max_activations)
        .unwrap()
        .with_store_timeout(Duration::from_millis(200));
    Arc::new(config)
}

/// Ledger over a fresh in-memory store. Returns the store for inspection.
pub fn memory_ledger(
    max_activations: u32,
) -> (ActivationLedger<MemoryActivationStore>, Arc<MemoryActivationStore>) {
    let store = Arc::new(MemoryActivationStore::new());
    let ledger = ActivationLedger::new(test_config(max_activations), Arc::clone(&store));
    (ledger, store)
}

/// Reference HMAC-SHA256, uppercase hex, computed independently of the crate.
pub fn reference_hmac(secret: &str, message: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(message.as_bytes());
    hex::encode_upper(mac.finalize().into_bytes())
}

/// Builds a checksum-consistent key for an arbitrary payload.
pub fn make_key(payload: &str) -> String {
    let checksum = &reference_hmac(SECRET, payload)[..4];
    format!("TORNADE-{payload}-{checksum}")
}

/// Store whose every call fails.
pub struct FailingStore;

#[async_trait]
impl ActivationStore for FailingStore {
    async fn get(&self, _key: &str) -> LicenseResult<Option<ActivationRecord>> {
        Err(LicenseError::StoreUnavailable("connection refused".into()))
    }

    async fn set(&self, _key: &str, _record: &ActivationRecord) -> LicenseResult<()> {
        Err(LicenseError::StoreUnavailable("connection refused".into()))
    }
}

/// Store that reads normally but never finishes a write.
#[derive(Default)]
pub struct HangingWriteStore {
    pub inner: MemoryActivationStore,
}

#[async_trait]
impl ActivationStore for HangingWriteStore {
    async fn get(&self, key: &str) -> LicenseResult<Option<ActivationRecord>> {
        self.inner.get(key).await
    }

    async fn set(&self, _key: &str, _record: &ActivationRecord) -> LicenseResult<()> {
        std::future::pending::<()>().await;
        Ok(())
    }
}

/// Store that yields between read and write, widening any race window.
#[derive(Default)]
pub struct YieldingStore {
    pub inner: MemoryActivationStore,
}

#[async_trait]
impl ActivationStore for YieldingStore {
    async fn get(&self, key: &str) -> LicenseResult<Option<ActivationRecord>> {
        let record = self.inner.get(key).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        record
    }

    async fn set(&self, key: &str, record: &ActivationRecord) -> LicenseResult<()> {
        tokio::task::yield_now().await;
        self.inner.set(key, record).await
    }
}

/// Store whose writes land on a detached task after a delay, so a write
/// abandoned by its caller still commits later.
pub struct DetachedWriteStore {
    pub inner: Arc<MemoryActivationStore>,
    pub delay: Duration,
}

impl DetachedWriteStore {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: Arc::new(MemoryActivationStore::new()),
            delay,
        }
    }
}

#[async_trait]
impl ActivationStore for DetachedWriteStore {
    async fn get(&self, key: &str) -> LicenseResult<Option<ActivationRecord>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, record: &ActivationRecord) -> LicenseResult<()> {
        let inner = Arc::clone(&self.inner);
        let delay = self.delay;
        let key = key.to_string();
        let record = record.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            inner.set(&key, &record).await
        })
        .await
        .map_err(|e| LicenseError::StoreUnavailable(e.to_string()))?
    }
}
