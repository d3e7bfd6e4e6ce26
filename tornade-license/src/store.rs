//! Persistence seam for activation records.
//!
//! The ledger only needs `get` and `set` on a key-value store. Implementations
//! own durability; the ledger owns the read-check-write sequence and its
//! per-key serialization.

use crate::device::DeviceId;
use crate::error::LicenseResult;
use crate::key::LicenseKey;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Namespace prepended to every record key in a shared store.
pub const RECORD_NAMESPACE: &str = "activations:";

/// Store key for a license key's activation record.
#[must_use]
pub fn record_key(key: &LicenseKey) -> String {
    format!("{RECORD_NAMESPACE}{}", key.as_str())
}

/// Devices that have activated one license key.
///
/// Serialized as a plain JSON array of device ids. Duplicates are dropped on
/// load and rejected on insert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<DeviceId>", into = "Vec<DeviceId>")]
pub struct ActivationRecord {
    devices: Vec<DeviceId>,
}

impl ActivationRecord {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `device` is registered.
    #[must_use]
    pub fn contains(&self, device: &DeviceId) -> bool {
        self.devices.contains(device)
    }

    /// Number of registered devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Returns true if no device is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Registered devices in activation order.
    #[must_use]
    pub fn devices(&self) -> &[DeviceId] {
        &self.devices
    }

    /// Adds a device. Returns false if it was already present.
    pub fn insert(&mut self, device: DeviceId) -> bool {
        if self.contains(&device) {
            return false;
        }
        self.devices.push(device);
        true
    }

    /// Encodes the record as a JSON array.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> LicenseResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes a record from a JSON array.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or contains an empty id.
    pub fn from_json(json: &str) -> LicenseResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl From<Vec<DeviceId>> for ActivationRecord {
    fn from(devices: Vec<DeviceId>) -> Self {
        let mut record = Self::new();
        for device in devices {
            record.insert(device);
        }
        record
    }
}

impl From<ActivationRecord> for Vec<DeviceId> {
    fn from(record: ActivationRecord) -> Self {
        record.devices
    }
}

/// Key-value persistence for activation records.
#[async_trait]
pub trait ActivationStore: Send + Sync {
    /// Loads the record stored under `key`, or `None` if absent.
    async fn get(&self, key: &str) -> LicenseResult<Option<ActivationRecord>>;

    /// Replaces the record stored under `key`.
    async fn set(&self, key: &str, record: &ActivationRecord) -> LicenseResult<()>;
}
