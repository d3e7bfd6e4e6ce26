use tornade_license::LicenseError;

#[test]
fn error_display_invalid_request() {
    let err = LicenseError::InvalidRequest("device id is empty".into());
    let msg = format!("{err}");
    assert!(msg.contains("invalid request"));
    assert!(msg.contains("device id is empty"));
}

#[test]
fn error_display_invalid_key() {
    let err = LicenseError::InvalidKey;
    assert!(format!("{err}").contains("invalid license key"));
}

#[test]
fn error_display_max_activations() {
    let err = LicenseError::MaxActivationsReached(5);
    let msg = format!("{err}");
    assert!(msg.contains("max activations"));
    assert!(msg.contains("5"));
}

#[test]
fn error_display_store_unavailable() {
    let err = LicenseError::StoreUnavailable("timeout".into());
    assert!(format!("{err}").contains("store unavailable"));
}

#[test]
fn error_display_config() {
    let err = LicenseError::Config("missing secret".into());
    assert!(format!("{err}").contains("configuration"));
}

#[test]
fn error_from_serde_json() {
    let serde_err: Result<serde_json::Value, _> = serde_json::from_str("not json");
    let license_err: LicenseError = serde_err.unwrap_err().into();
    assert!(format!("{license_err}").contains("serialization"));
}

#[test]
fn error_kinds_are_stable() {
    assert_eq!(LicenseError::InvalidRequest(String::new()).kind(), "invalid_request");
    assert_eq!(LicenseError::InvalidKey.kind(), "invalid_key");
    assert_eq!(LicenseError::MaxActivationsReached(1).kind(), "max_activations_reached");
    assert_eq!(LicenseError::StoreUnavailable(String::new()).kind(), "store_unavailable");
    assert_eq!(LicenseError::Config(String::new()).kind(), "config_error");
}
