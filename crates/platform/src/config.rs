//! Application configuration and constants
//!
//! Central naming and default locations used across the application.
//! Branding and well-known paths should reference these constants rather
//! than hardcoding values.

/// Title drawn in the screen header
pub const APP_TITLE: &str = "iOS Backup Machine";

/// Binary / service name
pub const APP_NAME: &str = "iosbackup";

/// Application version (synchronized with Cargo.toml)
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable that overrides the configuration file location
pub const CONFIG_ENV_VAR: &str = "IOSBACKUP_CONFIG";

/// Configuration file used when neither the CLI nor the environment names one
pub const DEFAULT_CONFIG_PATH: &str = "/etc/iosbackup/config.toml";

/// Directory receiving per-session backup logs
pub const DEFAULT_LOG_DIR: &str = "/var/log/iosbackup";

/// Full application title for headers and notices
pub const fn app_title() -> &'static str {
    APP_TITLE
}

/// Startup banner for the diagnostic log
pub fn banner() -> String {
    format!("{APP_NAME} {APP_VERSION}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_carries_version() {
        assert!(banner().starts_with("iosbackup "));
        assert!(banner().ends_with(APP_VERSION));
    }
}
