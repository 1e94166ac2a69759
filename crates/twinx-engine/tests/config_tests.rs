#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use tempfile::TempDir;
use twinx_core::invocation::HandleRetention;
use twinx_core::logging_facility::Profile;
use twinx_core::model::Submodel;
use twinx_core::ExErrorKind;
use twinx_engine::{EngineConfig, SubmodelServiceProvider};

#[test]
fn test_load_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("twinx.toml");
    std::fs::write(
        &path,
        r#"
[invocation]
default_timeout_ms = 250
handle_ttl_secs = 10

[pagination]
default_limit = 25

[logging]
profile = "test"
"#,
    )
    .unwrap();

    let config = EngineConfig::load(&path).unwrap();
    assert_eq!(config.default_timeout(), Duration::from_millis(250));
    assert_eq!(
        config.handle_retention(),
        HandleRetention::Ttl(Duration::from_secs(10))
    );
    assert_eq!(config.pagination.default_limit, 25);
    assert_eq!(config.logging.profile, Profile::Test);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = EngineConfig::load(dir.path().join("absent.toml")).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Io);
    assert_eq!(err.op(), Some("config_load"));
}

#[test]
fn test_unknown_profile_is_serialization_error() {
    let err = EngineConfig::from_toml_str("[logging]\nprofile = \"verbose\"").unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Serialization);
}

#[test]
fn test_provider_picks_up_engine_settings() {
    let config = EngineConfig::from_toml_str("[invocation]\ndefault_timeout_ms = 1234").unwrap();
    let provider = SubmodelServiceProvider::with_config(&config);
    provider.bind(Submodel::new("urn:sm:1", "S1")).unwrap();
    assert_eq!(
        provider.engine().default_timeout(),
        Duration::from_millis(1234)
    );
    assert_eq!(provider.engine().handles().retention(), HandleRetention::KeepForever);
}
