//! Per-device activation tokens.
//!
//! `token = upper_hex(HMAC-SHA256(secret, "<KEY>:<DEVICE_ID>"))`
//!
//! Tokens are never stored. The desktop app recomputes one with the embedded
//! secret to re-verify an activation offline.

use crate::config::LicenseConfig;
use crate::device::DeviceId;
use crate::key::LicenseKey;
use crate::signing;
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;

/// Length of a token in hex characters.
pub const TOKEN_LEN: usize = 64;

/// Proof that a device activated a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivationToken(String);

impl ActivationToken {
    /// Derives the token for `(key, device)`.
    #[must_use]
    pub fn derive(config: &LicenseConfig, key: &LicenseKey, device: &DeviceId) -> Self {
        let message = format!("{}:{}", key.as_str(), device.as_str());
        Self(signing::hmac_hex_upper(config.secret(), &message))
    }

    /// Checks a candidate token in constant time. Case-insensitive.
    #[must_use]
    pub fn verify(
        config: &LicenseConfig,
        key: &LicenseKey,
        device: &DeviceId,
        candidate: &str,
    ) -> bool {
        let expected = Self::derive(config, key, device);
        let candidate = candidate.trim().to_ascii_uppercase();
        candidate.len() == TOKEN_LEN && bool::from(expected.0.as_bytes().ct_eq(candidate.as_bytes()))
    }

    /// Returns the hex string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActivationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
