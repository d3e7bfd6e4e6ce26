//! Client-supplied device identifiers.

use crate::error::{LicenseError, LicenseResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of one installation of the desktop app.
///
/// The only rule is that it is non-empty. It is stored and hashed exactly as
/// the client sent it (no case folding).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceId(String);

impl DeviceId {
    /// Wraps a raw device id.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::InvalidRequest`] if `raw` is empty.
    pub fn new(raw: impl Into<String>) -> LicenseResult<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(LicenseError::InvalidRequest("device id is empty".into()));
        }
        Ok(Self(raw))
    }

    /// Returns the raw id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 8 characters, safe to show in logs.
    #[must_use]
    pub fn redacted(&self) -> String {
        let head: String = self.0.chars().take(8).collect();
        format!("{head}...")
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DeviceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DeviceId {
    type Error = LicenseError;

    fn try_from(raw: String) -> LicenseResult<Self> {
        Self::new(raw)
    }
}

impl From<DeviceId> for String {
    fn from(id: DeviceId) -> Self {
        id.0
    }
}
