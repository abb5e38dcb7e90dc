//! Loading `RecoveryConfig` from TOML files on disk.

use assert_matches::assert_matches;
use std::io::Write;
use tessera_core::{RecoveryConfig, RecoveryError, TesseraConfig};

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn loads_full_file() {
    let file = write_config(
        r#"
[envelope]
context = "node-b.distribution"
max_envelope_bytes = 2048

[distribution]
max_peers_per_send = 16
"#,
    );

    let config = RecoveryConfig::load_from_file(file.path()).unwrap();
    assert_eq!(config.envelope.context, "node-b.distribution");
    assert_eq!(config.envelope.max_envelope_bytes, 2048);
    assert_eq!(config.distribution.max_peers_per_send, 16);
}

#[test]
fn missing_sections_fall_back_to_defaults() {
    let file = write_config("[distribution]\nmax_peers_per_send = 3\n");

    let config = RecoveryConfig::load(Some(file.path())).unwrap();
    assert_eq!(config.distribution.max_peers_per_send, 3);
    assert_eq!(config.envelope, RecoveryConfig::default().envelope);
}

#[test]
fn invalid_values_fail_validation() {
    let file = write_config("[envelope]\ncontext = \"\"\n");

    let err = RecoveryConfig::load(Some(file.path())).unwrap_err();
    assert_matches!(err, RecoveryError::Invalid { .. });
    assert!(err.to_string().contains("envelope.context"));
}

#[test]
fn malformed_toml_is_invalid() {
    let file = write_config("[envelope\ncontext = 1");
    assert_matches!(
        RecoveryConfig::load_from_file(file.path()),
        Err(RecoveryError::Invalid { .. })
    );
}

#[test]
fn missing_file_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    assert_matches!(
        RecoveryConfig::load_from_file(&path),
        Err(RecoveryError::Invalid { .. })
    );
}
