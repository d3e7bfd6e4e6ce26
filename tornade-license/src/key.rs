//! License key generation and checksum validation.
//!
//! License keys use the format: `TORNADE-XXXXXXXX-XXXXXXXX-XXXXXXXX-CCCC`
//!
//! - the three middle segments are 4 random bytes each, uppercase hex
//! - `CCCC` is the first 4 hex chars of `HMAC-SHA256(secret, "XXXXXXXX-XXXXXXXX-XXXXXXXX")`
//!
//! Validation only proves the key was built with the shared secret. No
//! issuance record is consulted, so any checksum-consistent string passes.

use crate::config::{LicenseConfig, LicenseSecret};
use crate::error::{LicenseError, LicenseResult};
use crate::signing::{self, CHECKSUM_LEN};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Product tag every key starts with.
pub const KEY_PREFIX: &str = "TORNADE";

/// Random bytes per key segment (8 hex chars).
pub const SEGMENT_BYTES: usize = 4;

const SEGMENT_COUNT: usize = 3;
const PART_COUNT: usize = SEGMENT_COUNT + 2;

/// Uppercases and trims raw user input.
#[must_use]
pub fn normalize_key(raw: &str) -> String {
    raw.to_uppercase().trim().to_string()
}

/// Checks the structure and checksum of a key. Normalizes first.
#[must_use]
pub fn validate_format(raw: &str, secret: &LicenseSecret) -> bool {
    checksum_matches(&normalize_key(raw), secret)
}

fn checksum_matches(normalized: &str, secret: &LicenseSecret) -> bool {
    let parts: Vec<&str> = normalized.split('-').collect();
    if parts.len() != PART_COUNT || parts[0] != KEY_PREFIX {
        return false;
    }
    let payload = parts[1..=SEGMENT_COUNT].join("-");
    parts[SEGMENT_COUNT + 1] == signing::checksum(secret, &payload)
}

/// A normalized, checksum-valid license key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct LicenseKey {
    raw: String,
}

impl LicenseKey {
    /// Normalizes and validates a key string.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::InvalidRequest`] for empty input and
    /// [`LicenseError::InvalidKey`] if the format or checksum is wrong.
    pub fn parse(raw: &str, config: &LicenseConfig) -> LicenseResult<Self> {
        let normalized = normalize_key(raw);
        if normalized.is_empty() {
            return Err(LicenseError::InvalidRequest("license key is empty".into()));
        }
        if !checksum_matches(&normalized, config.secret()) {
            return Err(LicenseError::InvalidKey);
        }
        Ok(Self { raw: normalized })
    }

    /// Returns the canonical key string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the checksummed payload (`SEG1-SEG2-SEG3`).
    #[must_use]
    pub fn payload(&self) -> &str {
        // Prefix and checksum are ASCII, so both cut points are char boundaries.
        &self.raw[KEY_PREFIX.len() + 1..self.raw.len() - CHECKSUM_LEN - 1]
    }

    /// Returns the three payload segments.
    #[must_use]
    pub fn segments(&self) -> Vec<&str> {
        self.payload().split('-').collect()
    }

    /// Returns the trailing checksum.
    #[must_use]
    pub fn checksum(&self) -> &str {
        &self.raw[self.raw.len() - CHECKSUM_LEN..]
    }

    /// Last four characters, safe to show in logs.
    #[must_use]
    pub fn redacted(&self) -> String {
        format!("...{}", self.checksum())
    }
}

impl fmt::Display for LicenseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl AsRef<str> for LicenseKey {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}

/// Mints new license keys. Holds no state besides the shared config.
#[derive(Debug, Clone)]
pub struct KeyIssuer {
    config: Arc<LicenseConfig>,
}

impl KeyIssuer {
    /// Creates an issuer bound to the process configuration.
    #[must_use]
    pub fn new(config: Arc<LicenseConfig>) -> Self {
        Self { config }
    }

    /// Generates a fresh key from the OS random source.
    ///
    /// Nothing is persisted. Panics only if the OS random source fails.
    #[must_use]
    pub fn generate(&self) -> LicenseKey {
        let payload = (0..SEGMENT_COUNT)
            .map(|_| {
                let mut segment = [0u8; SEGMENT_BYTES];
                OsRng.fill_bytes(&mut segment);
                hex::encode_upper(segment)
            })
            .collect::<Vec<_>>()
            .join("-");
        let checksum = signing::checksum(self.config.secret(), &payload);

        let key = LicenseKey {
            raw: format!("{KEY_PREFIX}-{payload}-{checksum}"),
        };
        debug!("Generated license key {}", key.redacted());
        key
    }
}
