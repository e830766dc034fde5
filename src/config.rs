/// Centralized configuration for wifiscan
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

// Timing
pub const SCAN_INTERVAL_MS: u64 = 3000;
pub const SCAN_DELAY_MS: u64 = 2000;
pub const POLL_INTERVAL_MS: u64 = 1000;
pub const DISCONNECT_SETTLE_MS: u64 = 1000;

// Files
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";
pub const DEFAULT_STORE_PATH: &str = "saved_data.json";

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// On-disk configuration document
///
/// Only `timeout` is required. Everything else falls back to the timing
/// constants above.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Connect timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_interval_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_settle_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_interval_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disconnect_settle_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clear_profiles_on_connect: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl ConfigFile {
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to null, treat it as "nothing set"
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };
        Self::from_yaml(&text)
    }

    /// Update the connect timeout, keeping every other key as loaded
    pub fn set_timeout(&mut self, secs: u64) {
        self.timeout = Some(secs);
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let text = serde_yaml::to_string(self)?;
        std::fs::write(path, text)?;
        tracing::info!(path = %path.display(), "configuration saved");
        Ok(())
    }
}

/// Validated engine settings, built once and handed to the scheduler and supervisor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub connect_timeout: Duration,
    pub scan_interval: Duration,
    pub scan_settle: Duration,
    pub poll_interval: Duration,
    pub disconnect_settle: Duration,
    pub clear_profiles_on_connect: bool,
}

impl EngineConfig {
    /// Settings with the default timings and the given connect timeout
    pub fn with_timeout(connect_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            scan_interval: Duration::from_millis(SCAN_INTERVAL_MS),
            scan_settle: Duration::from_millis(SCAN_DELAY_MS),
            poll_interval: Duration::from_millis(POLL_INTERVAL_MS),
            disconnect_settle: Duration::from_millis(DISCONNECT_SETTLE_MS),
            clear_profiles_on_connect: false,
        }
    }

    pub fn from_file(file: &ConfigFile) -> Result<Self, ConfigError> {
        let timeout = file.timeout.ok_or(ConfigError::Missing("timeout"))?;
        if timeout == 0 {
            return Err(ConfigError::Invalid {
                key: "timeout",
                reason: "must be greater than zero".to_string(),
            });
        }

        let mut config = Self::with_timeout(Duration::from_secs(timeout));
        if let Some(ms) = file.scan_interval_ms {
            config.scan_interval = positive_millis("scan_interval_ms", ms)?;
        }
        if let Some(ms) = file.scan_settle_ms {
            config.scan_settle = Duration::from_millis(ms);
        }
        if let Some(ms) = file.poll_interval_ms {
            config.poll_interval = positive_millis("poll_interval_ms", ms)?;
        }
        if let Some(ms) = file.disconnect_settle_ms {
            config.disconnect_settle = Duration::from_millis(ms);
        }
        if let Some(clear) = file.clear_profiles_on_connect {
            config.clear_profiles_on_connect = clear;
        }
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        Self::from_file(&ConfigFile::from_yaml(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::from_file(&ConfigFile::load(path)?)
    }

    /// Number of status polls that fit in the connect timeout
    pub fn max_polls(&self) -> u32 {
        let interval = self.poll_interval.as_millis().max(1);
        let polls = self.connect_timeout.as_millis().div_ceil(interval);
        u32::try_from(polls).unwrap_or(u32::MAX).max(1)
    }
}

fn positive_millis(key: &'static str, ms: u64) -> Result<Duration, ConfigError> {
    if ms == 0 {
        return Err(ConfigError::Invalid {
            key,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(Duration::from_millis(ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_timeout_only_uses_defaults() {
        let config = EngineConfig::from_yaml("timeout: 5\n").unwrap();
        assert_eq!(config, EngineConfig::with_timeout(Duration::from_secs(5)));
        assert_eq!(config.scan_interval, Duration::from_millis(3000));
        assert_eq!(config.scan_settle, Duration::from_millis(2000));
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert!(!config.clear_profiles_on_connect);
    }

    #[test]
    fn test_missing_timeout_fails_fast() {
        let err = EngineConfig::from_yaml("scan_interval_ms: 1000\n").unwrap_err();
        assert!(matches!(err, ConfigError::Missing("timeout")));

        let err = EngineConfig::from_yaml("").unwrap_err();
        assert!(matches!(err, ConfigError::Missing("timeout")));
    }

    #[test]
    fn test_zero_values_rejected() {
        assert!(matches!(
            EngineConfig::from_yaml("timeout: 0\n"),
            Err(ConfigError::Invalid { key: "timeout", .. })
        ));
        assert!(matches!(
            EngineConfig::from_yaml("timeout: 5\npoll_interval_ms: 0\n"),
            Err(ConfigError::Invalid {
                key: "poll_interval_ms",
                ..
            })
        ));
    }

    #[test]
    fn test_overrides_applied() {
        let yaml = "timeout: 10\nscan_interval_ms: 500\nscan_settle_ms: 100\n\
                    poll_interval_ms: 250\ndisconnect_settle_ms: 0\nclear_profiles_on_connect: true\n";
        let config = EngineConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.scan_interval, Duration::from_millis(500));
        assert_eq!(config.scan_settle, Duration::from_millis(100));
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.disconnect_settle, Duration::ZERO);
        assert!(config.clear_profiles_on_connect);
        assert_eq!(config.max_polls(), 40);
    }

    #[test]
    fn test_max_polls_rounds_up() {
        let mut config = EngineConfig::with_timeout(Duration::from_secs(5));
        assert_eq!(config.max_polls(), 5);

        config.poll_interval = Duration::from_secs(2);
        assert_eq!(config.max_polls(), 3);
    }

    #[test]
    fn test_missing_file_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        assert!(matches!(
            EngineConfig::load(&path),
            Err(ConfigError::NotFound(_))
        ));
    }

    #[test]
    fn test_set_timeout_round_trip_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "timeout: 5\nscan_interval_ms: 1500\n").unwrap();

        let mut file = ConfigFile::load(&path).unwrap();
        file.set_timeout(30);
        file.save(&path).unwrap();

        let reloaded = ConfigFile::load(&path).unwrap();
        assert_eq!(reloaded.timeout, Some(30));
        assert_eq!(reloaded.scan_interval_ms, Some(1500));
        assert_eq!(
            EngineConfig::load(&path).unwrap().connect_timeout,
            Duration::from_secs(30)
        );
    }
}
