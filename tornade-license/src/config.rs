//! Process-wide licensing configuration.
//!
//! Built once at startup and shared by [`KeyIssuer`](crate::KeyIssuer) and
//! [`ActivationLedger`](crate::ActivationLedger). The process must refuse to
//! start when the secret is absent.

use crate::error::{LicenseError, LicenseResult};
use std::env::{self, VarError};
use std::fmt;
use std::time::Duration;
use zeroize::Zeroizing;

/// Environment variable holding the shared HMAC secret.
pub const SECRET_ENV: &str = "TORNADE_LICENSE_SECRET";

/// Environment variable holding the per-key device cap.
pub const MAX_ACTIVATIONS_ENV: &str = "MAX_ACTIVATIONS";

/// Environment variable holding the store call timeout in milliseconds.
pub const STORE_TIMEOUT_ENV: &str = "TORNADE_STORE_TIMEOUT_MS";

/// Default number of devices a single key may activate.
pub const DEFAULT_MAX_ACTIVATIONS: u32 = 5;

/// Default timeout applied to every store call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// The shared HMAC secret. Wiped from memory on drop and never printed.
#[derive(Clone)]
pub struct LicenseSecret(Zeroizing<Vec<u8>>);

impl LicenseSecret {
    /// Wraps a secret, rejecting empty values.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::Config`] if the secret is empty.
    pub fn new(secret: impl Into<Vec<u8>>) -> LicenseResult<Self> {
        let bytes = secret.into();
        if bytes.is_empty() {
            return Err(LicenseError::Config("license secret must not be empty".into()));
        }
        Ok(Self(Zeroizing::new(bytes)))
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for LicenseSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LicenseSecret(<redacted>)")
    }
}

/// Configuration shared by the issuer and the ledger.
#[derive(Debug, Clone)]
pub struct LicenseConfig {
    secret: LicenseSecret,
    max_activations: u32,
    store_timeout: Duration,
}

impl LicenseConfig {
    /// Creates a configuration with default limits.
    #[must_use]
    pub fn new(secret: LicenseSecret) -> Self {
        Self {
            secret,
            max_activations: DEFAULT_MAX_ACTIVATIONS,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::Config`] if the secret is missing or a tunable
    /// cannot be parsed.
    pub fn from_env() -> LicenseResult<Self> {
        Self::from_lookup(|name| env::var(name))
    }

    /// Reads the configuration through `lookup`, which resolves variable
    /// names the way [`std::env::var`] does.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::Config`] if the secret is missing or empty, a
    /// variable is not valid UTF-8, or a tunable cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> LicenseResult<Self>
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        let secret = optional_var(&lookup, SECRET_ENV)?
            .ok_or_else(|| LicenseError::Config(format!("missing required env var: {SECRET_ENV}")))?;
        let mut config = Self::new(LicenseSecret::new(secret)?);

        if let Some(raw) = optional_var(&lookup, MAX_ACTIVATIONS_ENV)? {
            config = config.with_max_activations(parse_max_activations(&raw)?)?;
        }

        if let Some(raw) = optional_var(&lookup, STORE_TIMEOUT_ENV)? {
            let millis: u64 = raw.trim().parse().map_err(|_| {
                LicenseError::Config(format!("{STORE_TIMEOUT_ENV} must be an integer, got {raw:?}"))
            })?;
            config = config.with_store_timeout(Duration::from_millis(millis));
        }

        Ok(config)
    }

    /// Sets the per-key device cap.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::Config`] if `max` is zero.
    pub fn with_max_activations(mut self, max: u32) -> LicenseResult<Self> {
        if max == 0 {
            return Err(LicenseError::Config("max activations must be at least 1".into()));
        }
        self.max_activations = max;
        Ok(self)
    }

    /// Sets the timeout applied to every store call.
    #[must_use]
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Returns the shared secret.
    #[must_use]
    pub fn secret(&self) -> &LicenseSecret {
        &self.secret
    }

    /// Returns the per-key device cap.
    #[must_use]
    pub fn max_activations(&self) -> u32 {
        self.max_activations
    }

    /// Returns the store call timeout.
    #[must_use]
    pub fn store_timeout(&self) -> Duration {
        self.store_timeout
    }
}

fn parse_max_activations(raw: &str) -> LicenseResult<u32> {
    raw.trim().parse().map_err(|_| {
        LicenseError::Config(format!("{MAX_ACTIVATIONS_ENV} must be a positive integer, got {raw:?}"))
    })
}

fn optional_var<F>(lookup: &F, name: &str) -> LicenseResult<Option<String>>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    match lookup(name) {
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(_)) => Err(LicenseError::Config(format!(
            "env var {name} is not valid UTF-8"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::ffi::OsString;

    #[test]
    fn empty_secret_rejected() {
        assert!(matches!(LicenseSecret::new(""), Err(LicenseError::Config(_))));
    }

    #[test]
    fn secret_debug_is_redacted() {
        let secret = LicenseSecret::new("s3cret").unwrap();
        let printed = format!("{secret:?}");
        assert!(!printed.contains("s3cret"));
    }

    #[test]
    fn defaults() {
        let config = LicenseConfig::new(LicenseSecret::new("s3cret").unwrap());
        assert_eq!(config.max_activations(), DEFAULT_MAX_ACTIVATIONS);
        assert_eq!(config.store_timeout(), DEFAULT_STORE_TIMEOUT);
    }

    #[test]
    fn zero_max_activations_rejected() {
        let config = LicenseConfig::new(LicenseSecret::new("s3cret").unwrap());
        assert!(config.with_max_activations(0).is_err());
    }

    #[test]
    fn parse_max_activations_values() {
        assert_eq!(parse_max_activations(" 3 ").unwrap(), 3);
        assert!(parse_max_activations("-1").is_err());
        assert!(parse_max_activations("five").is_err());
    }

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Result<String, VarError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned().ok_or(VarError::NotPresent)
    }

    fn config_error(result: LicenseResult<LicenseConfig>) -> String {
        match result {
            Err(LicenseError::Config(msg)) => msg,
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn lookup_reads_all_tunables() {
        let config = LicenseConfig::from_lookup(lookup_from(&[
            (SECRET_ENV, "s3cret"),
            (MAX_ACTIVATIONS_ENV, " 3 "),
            (STORE_TIMEOUT_ENV, "250"),
        ]))
        .unwrap();
        assert_eq!(config.max_activations(), 3);
        assert_eq!(config.store_timeout(), Duration::from_millis(250));
        assert_eq!(config.secret().as_bytes(), b"s3cret");
    }

    #[test]
    fn lookup_applies_defaults() {
        let config = LicenseConfig::from_lookup(lookup_from(&[(SECRET_ENV, "s3cret")])).unwrap();
        assert_eq!(config.max_activations(), DEFAULT_MAX_ACTIVATIONS);
        assert_eq!(config.store_timeout(), DEFAULT_STORE_TIMEOUT);
    }

    #[test]
    fn missing_secret_is_config_error() {
        let msg = config_error(LicenseConfig::from_lookup(lookup_from(&[])));
        assert!(msg.contains("missing"));
        assert!(msg.contains(SECRET_ENV));
    }

    #[test]
    fn empty_secret_from_env_is_config_error() {
        config_error(LicenseConfig::from_lookup(lookup_from(&[(SECRET_ENV, "")])));
    }

    #[test]
    fn non_utf8_secret_is_not_reported_missing() {
        let msg = config_error(LicenseConfig::from_lookup(|name: &str| {
            if name == SECRET_ENV {
                Err(VarError::NotUnicode(OsString::from("s3cret")))
            } else {
                Err(VarError::NotPresent)
            }
        }));
        assert!(msg.contains("not valid UTF-8"));
        assert!(!msg.contains("missing"));
    }

    #[test]
    fn zero_cap_from_env_is_config_error() {
        config_error(LicenseConfig::from_lookup(lookup_from(&[
            (SECRET_ENV, "s3cret"),
            (MAX_ACTIVATIONS_ENV, "0"),
        ])));
    }

    #[test]
    fn non_numeric_cap_is_config_error() {
        config_error(LicenseConfig::from_lookup(lookup_from(&[
            (SECRET_ENV, "s3cret"),
            (MAX_ACTIVATIONS_ENV, "five"),
        ])));
    }

    #[test]
    fn bad_store_timeout_is_config_error() {
        for raw in ["soon", "-5", "1.5"] {
            let msg = config_error(LicenseConfig::from_lookup(lookup_from(&[
                (SECRET_ENV, "s3cret"),
                (STORE_TIMEOUT_ENV, raw),
            ])));
            assert!(msg.contains(STORE_TIMEOUT_ENV));
        }
    }
}
