//! Station configuration
//!
//! Loaded once from TOML at startup. Lookup order for the file: `--config`,
//! then `$IOSBACKUP_CONFIG`, then `/etc/iosbackup/config.toml`. Only the
//! last one may be missing, in which case the defaults apply.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use backup_stream::ErrorCatalog;
use eink_canvas::Orientation;
use platform::config::{CONFIG_ENV_VAR, DEFAULT_CONFIG_PATH, DEFAULT_LOG_DIR};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Config {
    /// Destination passed to the backup tool
    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,
    /// File that must exist in `backup_dir` for it to count as mounted
    #[serde(default = "default_marker_file")]
    pub marker_file: String,
    /// Block device reported by `df` on the completion screen
    #[serde(default = "default_disk_device")]
    pub disk_device: String,
    #[serde(default)]
    pub orientation: Orientation,
    /// Contact lines shown on completion and on notices
    #[serde(default = "default_owner_lines")]
    pub owner_lines: Vec<String>,
    /// Backup tool error code (as a string key) to display message
    #[serde(default)]
    pub error_codes: BTreeMap<String, String>,
    /// Exported to the process environment before anything is spawned
    #[serde(default)]
    pub env: BTreeMap<String, toml::Value>,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(default = "default_idle_refresh_secs")]
    pub idle_refresh_secs: u64,
    #[serde(default = "default_partial_reset_threshold")]
    pub partial_reset_threshold: u32,
    #[serde(default = "default_animation_period_ms")]
    pub animation_period_ms: u64,
    #[serde(default = "default_device_poll_secs")]
    pub device_poll_secs: u64,
    #[serde(default = "default_busy_backoff_ms")]
    pub busy_backoff_ms: u64,
    #[serde(default = "default_backup_command")]
    pub backup_command: String,
    #[serde(default = "default_device_list_command")]
    pub device_list_command: String,
    #[serde(default = "default_pair_command")]
    pub pair_command: String,
}

fn default_backup_dir() -> PathBuf {
    PathBuf::from("/media/iosbackup/")
}

fn default_marker_file() -> String {
    ".foldermarker".to_string()
}

fn default_disk_device() -> String {
    "/dev/mmcblk1".to_string()
}

fn default_owner_lines() -> Vec<String> {
    vec![
        "Property owner".to_string(),
        "contact".to_string(),
        "message".to_string(),
    ]
}

fn default_log_dir() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_DIR)
}

fn default_idle_refresh_secs() -> u64 {
    4
}

fn default_partial_reset_threshold() -> u32 {
    100
}

fn default_animation_period_ms() -> u64 {
    1000
}

fn default_device_poll_secs() -> u64 {
    2
}

fn default_busy_backoff_ms() -> u64 {
    200
}

fn default_backup_command() -> String {
    "idevicebackup2".to_string()
}

fn default_device_list_command() -> String {
    "idevice_id".to_string()
}

fn default_pair_command() -> String {
    "idevicepair".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backup_dir: default_backup_dir(),
            marker_file: default_marker_file(),
            disk_device: default_disk_device(),
            orientation: Orientation::default(),
            owner_lines: default_owner_lines(),
            error_codes: BTreeMap::new(),
            env: BTreeMap::new(),
            log_dir: default_log_dir(),
            idle_refresh_secs: default_idle_refresh_secs(),
            partial_reset_threshold: default_partial_reset_threshold(),
            animation_period_ms: default_animation_period_ms(),
            device_poll_secs: default_device_poll_secs(),
            busy_backoff_ms: default_busy_backoff_ms(),
            backup_command: default_backup_command(),
            device_list_command: default_device_list_command(),
            pair_command: default_pair_command(),
        }
    }
}

impl Config {
    /// Parse and validate TOML text
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.partial_reset_threshold == 0 {
            return Err(ConfigError::Invalid(
                "partial_reset_threshold must be at least 1".into(),
            ));
        }
        if self.animation_period_ms == 0 {
            return Err(ConfigError::Invalid(
                "animation_period_ms must be at least 1".into(),
            ));
        }
        if self.backup_command.trim().is_empty() {
            return Err(ConfigError::Invalid("backup_command is empty".into()));
        }
        Ok(())
    }

    /// `<backup_dir>/<marker_file>`
    pub fn marker_path(&self) -> PathBuf {
        self.backup_dir.join(&self.marker_file)
    }

    pub fn idle_threshold(&self) -> Duration {
        Duration::from_secs(self.idle_refresh_secs)
    }

    pub fn animation_period(&self) -> Duration {
        Duration::from_millis(self.animation_period_ms)
    }

    pub fn device_poll(&self) -> Duration {
        Duration::from_secs(self.device_poll_secs)
    }

    pub fn busy_backoff(&self) -> Duration {
        Duration::from_millis(self.busy_backoff_ms)
    }

    /// Error catalog built from `error_codes`; keys that are not integers
    /// are skipped
    pub fn error_catalog(&self) -> ErrorCatalog {
        let mut catalog = ErrorCatalog::new();
        for (key, message) in &self.error_codes {
            match key.trim().parse::<i32>() {
                Ok(code) => catalog.insert(code, message.clone()),
                Err(_) => tracing::warn!(key = %key, "ignoring non-numeric error code"),
            }
        }
        catalog
    }

    /// `env` entries rendered as strings
    pub fn env_vars(&self) -> Vec<(String, String)> {
        self.env
            .iter()
            .map(|(k, v)| {
                let value = match v {
                    toml::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.clone(), value)
            })
            .collect()
    }

    /// Export `env` into this process' environment
    ///
    /// Call before any thread is spawned.
    pub fn apply_env(&self) {
        for (key, value) in self.env_vars() {
            tracing::debug!(%key, "exporting environment variable");
            std::env::set_var(key, value);
        }
    }
}

/// Where the config comes from and whether it must exist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLocation {
    pub path: PathBuf,
    pub required: bool,
}

impl ConfigLocation {
    /// Resolve from the CLI flag and the environment
    pub fn resolve(cli: Option<&Path>) -> Self {
        if let Some(path) = cli {
            return Self {
                path: path.to_path_buf(),
                required: true,
            };
        }
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(raw) if !raw.is_empty() => Self {
                path: PathBuf::from(raw),
                required: true,
            },
            _ => Self {
                path: PathBuf::from(DEFAULT_CONFIG_PATH),
                required: false,
            },
        }
    }
}

/// Load the config at `location`
pub fn load(location: &ConfigLocation) -> Result<Config, ConfigError> {
    match std::fs::read_to_string(&location.path) {
        Ok(text) => {
            let config = Config::from_toml_str(&text, &location.path)?;
            tracing::info!(path = %location.path.display(), "configuration loaded");
            Ok(config)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && !location.required => {
            tracing::warn!(path = %location.path.display(), "no config file; using defaults");
            Ok(Config::default())
        }
        Err(source) => Err(ConfigError::Read {
            path: location.path.clone(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Config, ConfigError> {
        Config::from_toml_str(text, Path::new("test.toml"))
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        assert_eq!(parse("").unwrap(), Config::default());
    }

    #[test]
    fn test_defaults() {
        let c = Config::default();
        assert_eq!(c.orientation, Orientation::LandscapeRight);
        assert_eq!(c.marker_path(), PathBuf::from("/media/iosbackup/.foldermarker"));
        assert_eq!(c.idle_threshold(), Duration::from_secs(4));
        assert_eq!(c.partial_reset_threshold, 100);
        assert_eq!(c.owner_lines.len(), 3);
    }

    #[test]
    fn test_orientation_values() {
        assert_eq!(parse("orientation = \"portrait\"").unwrap().orientation, Orientation::Portrait);
        assert_eq!(
            parse("orientation = \"landscape_left\"").unwrap().orientation,
            Orientation::LandscapeLeft
        );
        assert!(matches!(parse("orientation = \"sideways\""), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_error_codes_skip_bad_keys() {
        let c = parse("[error_codes]\n\"105\" = \"Not enough space\"\n\"-13\" = \"Locked\"\nabc = \"x\"\n").unwrap();
        let catalog = c.error_catalog();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.resolve(Some(105)), "Not enough space");
        assert_eq!(catalog.resolve(Some(-13)), "Locked");
    }

    #[test]
    fn test_env_values_are_stringified() {
        let c = parse("[env]\nUSBMUXD_SOCKET_ADDRESS = \"127.0.0.1:27015\"\nRETRIES = 3\n").unwrap();
        let vars = c.env_vars();
        assert!(vars.contains(&("RETRIES".to_string(), "3".to_string())));
        assert!(vars.contains(&(
            "USBMUXD_SOCKET_ADDRESS".to_string(),
            "127.0.0.1:27015".to_string()
        )));
    }

    #[test]
    fn test_zero_threshold_is_rejected() {
        assert!(matches!(
            parse("partial_reset_threshold = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(parse("animation_period_ms = 0"), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_cli_path_is_required() {
        let loc = ConfigLocation::resolve(Some(Path::new("/nonexistent/x.toml")));
        assert!(loc.required);
        assert!(matches!(load(&loc), Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_missing_optional_file_gives_defaults() {
        let loc = ConfigLocation {
            path: PathBuf::from("/nonexistent/config.toml"),
            required: false,
        };
        assert_eq!(load(&loc).unwrap(), Config::default());
    }
}
