//! HMAC-SHA256 helpers shared by key checksums and activation tokens.

use crate::config::LicenseSecret;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Length of a key checksum in hex characters.
pub const CHECKSUM_LEN: usize = 4;

/// Returns `HMAC-SHA256(secret, message)` as uppercase hex (64 chars).
pub(crate) fn hmac_hex_upper(secret: &LicenseSecret, message: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC-SHA256 accepts keys of any length");
    mac.update(message.as_bytes());
    hex::encode_upper(mac.finalize().into_bytes())
}

/// Checksum embedded as the last segment of a license key.
pub(crate) fn checksum(secret: &LicenseSecret, payload: &str) -> String {
    let mut digest = hmac_hex_upper(secret, payload);
    digest.truncate(CHECKSUM_LEN);
    digest
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret() -> LicenseSecret {
        LicenseSecret::new("s3cret").unwrap()
    }

    #[test]
    fn fixed_vector_checksum() {
        assert_eq!(checksum(&secret(), "AAAAAAAA-BBBBBBBB-CCCCCCCC"), "1038");
    }

    #[test]
    fn digest_is_full_uppercase_hex() {
        let digest = hmac_hex_upper(&secret(), "AAAAAAAA-BBBBBBBB-CCCCCCCC");
        assert_eq!(digest.len(), 64);
        assert!(digest.starts_with("1038DC35"));
        assert!(digest.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }
}
