/// Typed errors for wifiscan radio, configuration and store operations
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for radio operations
pub type WifiResult<T> = Result<T, WifiError>;

/// Errors that can occur while talking to the radio
#[derive(Error, Debug)]
pub enum WifiError {
    #[error("Failed to open WLAN handle (code: {code})")]
    HandleOpenFailed { code: u32 },

    #[error("Failed to enumerate interfaces (code: {code})")]
    InterfaceEnumFailed { code: u32 },

    #[error("No WiFi interface found")]
    NoInterface,

    #[error("Failed to scan networks (code: {code})")]
    ScanFailed { code: u32 },

    #[error("Failed to read scan results (code: {code})")]
    ScanResultsFailed { code: u32 },

    #[error("Failed to connect (code: {code})")]
    ConnectionFailed { code: u32 },

    #[error("Connect request rejected: {0}")]
    ConnectRejected(String),

    #[error("Failed to add profile (code: {code}, reason: {reason})")]
    ProfileAddFailed { code: u32, reason: u32 },

    #[error("Failed to list profiles (code: {code})")]
    ProfileListFailed { code: u32 },

    #[error("Failed to delete profile (code: {code})")]
    ProfileDeleteFailed { code: u32 },

    #[error("Failed to disconnect (code: {code})")]
    DisconnectFailed { code: u32 },

    #[error("Failed to query interface status (code: {code})")]
    StatusQueryFailed { code: u32 },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors raised while loading or saving the engine configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Required configuration value `{0}` is missing")]
    Missing(&'static str),

    #[error("Invalid configuration value `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Errors raised by the credential store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to access credential store: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed credential store: {0}")]
    Json(#[from] serde_json::Error),
}

/// Fatal startup errors for the engine
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("No radio adapter available: {0}")]
    AdapterUnavailable(#[source] WifiError),

    #[error("Connect timeout is not configured")]
    ConfigurationMissing,

    #[error(transparent)]
    Config(ConfigError),
}

impl From<ConfigError> for EngineError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Missing(_) | ConfigError::NotFound(_) => EngineError::ConfigurationMissing,
            other => EngineError::Config(other),
        }
    }
}

/// Convert a WLAN reason code to a human-readable string
#[cfg(windows)]
pub fn wlan_reason_to_string(code: u32) -> String {
    match code {
        0 => "Success".to_string(),
        1 => "Unknown Failure".to_string(),
        0x00010001 => "Network Not Compatible".to_string(),
        0x00010002 => "Profile Not Compatible".to_string(),
        0x00038003 => "Profile Not Found".to_string(),
        0x00038005 => "Profile Name Too Long".to_string(),
        0x00038006 => "Profile Invalid".to_string(),
        0x00050004 => "Incorrect Password".to_string(),
        0x00080006 => "MSM Security Missing".to_string(),
        _ => format!("Unknown Error (Code: {code}, 0x{code:X})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_maps_to_configuration_missing() {
        let err: EngineError = ConfigError::Missing("timeout").into();
        assert!(matches!(err, EngineError::ConfigurationMissing));

        let err: EngineError = ConfigError::NotFound(PathBuf::from("config.yaml")).into();
        assert!(matches!(err, EngineError::ConfigurationMissing));
    }

    #[test]
    fn test_invalid_config_is_wrapped() {
        let err: EngineError = ConfigError::Invalid {
            key: "timeout",
            reason: "must be greater than zero".to_string(),
        }
        .into();
        assert!(matches!(err, EngineError::Config(_)));
        assert_eq!(
            err.to_string(),
            "Invalid configuration value `timeout`: must be greater than zero"
        );
    }
}
