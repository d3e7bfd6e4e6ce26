//! Error types for the licensing module.

use thiserror::Error;

/// Licensing-specific errors.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// Missing or malformed input (empty key or device id).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Key is not `TORNADE-XXXXXXXX-XXXXXXXX-XXXXXXXX-CCCC` or its checksum does not match.
    #[error("invalid license key")]
    InvalidKey,

    /// The key already has the maximum number of devices registered.
    #[error("max activations reached ({0} devices)")]
    MaxActivationsReached(u32),

    /// The activation store failed or timed out.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Process configuration is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LicenseError {
    /// Stable machine-readable code for this error, used by transport layers.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::InvalidKey => "invalid_key",
            Self::MaxActivationsReached(_) => "max_activations_reached",
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::Config(_) => "config_error",
            Self::Serialization(_) => "serialization_error",
        }
    }
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
