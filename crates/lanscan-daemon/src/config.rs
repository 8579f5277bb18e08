//! Configuration loading and validation

use anyhow::{Context, Result};
use lanscan_discovery::ScannerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub collector: CollectorConfig,
    #[serde(default)]
    pub scan: ScanConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Endpoint receiving each cycle's device list
    #[serde(default = "default_url")]
    pub url: String,
    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            timeout_secs: default_request_timeout(),
        }
    }
}

fn default_url() -> String {
    "http://localhost:5002/api/devices".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Idle time between scan cycles in seconds
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
    /// Force privileged mode on or off instead of detecting root
    #[serde(default)]
    pub privileged: Option<bool>,
    /// Echo reply wait per ping probe in milliseconds
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_ms: u64,
    /// Upper bound for other tool runs in seconds
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,
    /// Upper bound for a reverse DNS lookup in milliseconds
    #[serde(default = "default_hostname_timeout")]
    pub hostname_timeout_ms: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            privileged: None,
            probe_timeout_ms: default_probe_timeout(),
            command_timeout_secs: default_command_timeout(),
            hostname_timeout_ms: default_hostname_timeout(),
        }
    }
}

fn default_interval() -> u64 {
    10
}

fn default_probe_timeout() -> u64 {
    1000
}

fn default_command_timeout() -> u64 {
    30
}

fn default_hostname_timeout() -> u64 {
    2000
}

impl Config {
    /// Convert to ScannerConfig
    ///
    /// `detected_privileged` is used unless the file forces a value.
    pub fn to_scanner_config(&self, detected_privileged: bool) -> ScannerConfig {
        ScannerConfig {
            privileged: self.scan.privileged.unwrap_or(detected_privileged),
            probe_timeout_ms: self.scan.probe_timeout_ms,
            command_timeout_secs: self.scan.command_timeout_secs,
            hostname_timeout_ms: self.scan.hostname_timeout_ms,
        }
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("lanscan.toml")).unwrap();
        assert_eq!(config.collector.url, "http://localhost:5002/api/devices");
        assert_eq!(config.scan.interval_secs, 10);
        assert_eq!(config.scan.privileged, None);
    }

    #[test]
    fn test_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[collector]
url = "http://collector.lan:8000/devices"

[scan]
interval_secs = 60
privileged = false
"#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.collector.url, "http://collector.lan:8000/devices");
        assert_eq!(config.collector.timeout_secs, 10);
        assert_eq!(config.scan.interval_secs, 60);
        assert_eq!(config.scan.probe_timeout_ms, 1000);

        let scanner = config.to_scanner_config(true);
        assert!(!scanner.privileged);
    }

    #[test]
    fn test_detected_privilege_used_without_override() {
        let config = Config::default();
        assert!(config.to_scanner_config(true).privileged);
        assert!(!config.to_scanner_config(false).privileged);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[scan]\ninterval_secs = \"soon\"").unwrap();
        assert!(load_config(file.path()).is_err());
    }
}
