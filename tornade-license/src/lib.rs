//! License issuance and device activation for Tornade.
//!
//! This crate handles:
//! - Minting license keys with an embedded HMAC checksum
//! - Stateless key validation against the shared secret
//! - A bounded, idempotent per-key device ledger
//! - Per-device activation tokens the app can re-verify offline
//!
//! # Design Principles
//!
//! - **Stateless keys**: a key is valid iff its checksum matches; issuance is not recorded
//! - **One-time activation**: the app contacts the server once per device
//! - **Offline-first**: the returned token is a pure function of key, device and secret
//! - **Bounded**: a key never holds more than `max_activations` devices
//!
//! # License Key Format
//!
//! Keys are formatted as: `TORNADE-XXXXXXXX-XXXXXXXX-XXXXXXXX-CCCC`
//! where `CCCC` is the first 4 hex chars of `HMAC-SHA256(secret, "XXXXXXXX-XXXXXXXX-XXXXXXXX")`.

mod config;
mod device;
mod error;
mod key;
mod ledger;
mod memory;
mod signing;
mod store;
mod token;

pub use config::{
    DEFAULT_MAX_ACTIVATIONS, DEFAULT_STORE_TIMEOUT, LicenseConfig, LicenseSecret,
    MAX_ACTIVATIONS_ENV, SECRET_ENV, STORE_TIMEOUT_ENV,
};
pub use device::DeviceId;
pub use error::{LicenseError, LicenseResult};
pub use key::{KEY_PREFIX, KeyIssuer, LicenseKey, SEGMENT_BYTES, normalize_key, validate_format};
pub use ledger::ActivationLedger;
pub use memory::MemoryActivationStore;
pub use signing::CHECKSUM_LEN;
pub use store::{ActivationRecord, ActivationStore, RECORD_NAMESPACE, record_key};
pub use token::{ActivationToken, TOKEN_LEN};
