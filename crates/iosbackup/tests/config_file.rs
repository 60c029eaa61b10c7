#![allow(clippy::unwrap_used, clippy::expect_used, missing_docs)]
//! Loading a station config from disk.
//!
//! Run with: cargo test -p iosbackup --test config_file

use std::path::PathBuf;
use std::time::Duration;

use eink_canvas::Orientation;
use iosbackup::config::{load, Config, ConfigError, ConfigLocation};

const STATION_TOML: &str = r#"
backup_dir = "/media/backup/iphone"
marker_file = ".mounted"
disk_device = "/dev/sda1"
orientation = "landscape_left"
owner_lines = ["If found, call", "555-0100"]
log_dir = "/var/log/iosbackup"
idle_refresh_secs = 30
partial_reset_threshold = 50
animation_period_ms = 400

[error_codes]
105 = "Not enough free space on the drive"
208 = "Device locked. Unlock and retry."

[env]
USBMUXD_SOCKET_ADDRESS = "127.0.0.1:27015"
"#;

fn write_config(text: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, text).unwrap();
    (dir, path)
}

fn required(path: PathBuf) -> ConfigLocation {
    ConfigLocation { path, required: true }
}

#[test]
fn test_station_config_loads() {
    let (_dir, path) = write_config(STATION_TOML);
    let config = load(&required(path)).unwrap();

    assert_eq!(config.backup_dir, PathBuf::from("/media/backup/iphone"));
    assert_eq!(config.marker_path(), PathBuf::from("/media/backup/iphone/.mounted"));
    assert_eq!(config.orientation, Orientation::LandscapeLeft);
    assert_eq!(config.owner_lines, vec!["If found, call", "555-0100"]);
    assert_eq!(config.idle_threshold(), Duration::from_secs(30));
    assert_eq!(config.animation_period(), Duration::from_millis(400));
    assert_eq!(config.partial_reset_threshold, 50);

    let catalog = config.error_catalog();
    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.resolve(Some(105)), "Not enough free space on the drive");
    assert_eq!(catalog.resolve(Some(1)), backup_stream::UNKNOWN_ERROR);

    assert_eq!(
        config.env_vars(),
        vec![("USBMUXD_SOCKET_ADDRESS".to_string(), "127.0.0.1:27015".to_string())]
    );
}

#[test]
fn test_unspecified_keys_keep_defaults() {
    let (_dir, path) = write_config("owner_lines = [\"Jane\"]\n");
    let config = load(&required(path)).unwrap();
    let defaults = Config::default();
    assert_eq!(config.owner_lines, vec!["Jane"]);
    assert_eq!(config.backup_dir, defaults.backup_dir);
    assert_eq!(config.backup_command, defaults.backup_command);
    assert_eq!(config.partial_reset_threshold, defaults.partial_reset_threshold);
}

#[test]
fn test_missing_required_file_is_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load(&required(dir.path().join("absent.toml"))).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn test_missing_optional_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let location = ConfigLocation {
        path: dir.path().join("absent.toml"),
        required: false,
    };
    assert_eq!(load(&location).unwrap(), Config::default());
}

#[test]
fn test_malformed_file_names_its_path() {
    let (_dir, path) = write_config("orientation = [\n");
    let err = load(&required(path.clone())).unwrap_err();
    match &err {
        ConfigError::Parse { path: p, .. } => assert_eq!(p, &path),
        other => panic!("expected parse error, got {other:?}"),
    }
    assert!(err.to_string().contains("config.toml"));
}

#[test]
fn test_invalid_values_are_rejected() {
    let (_dir, path) = write_config("animation_period_ms = 0\n");
    assert!(matches!(load(&required(path)), Err(ConfigError::Invalid(_))));
}
