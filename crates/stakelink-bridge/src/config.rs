//! Bridge settings
//!
//! Deserialized from the service's TOML file; every field has a default so an
//! empty file is a valid (if not very useful) configuration.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use stakelink_core::telemetry::fixed_offset;

use crate::target::MulticastGroupMap;
use crate::{BridgeError, Result};

/// Network-server REST API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChirpStackConfig {
    /// Base URL of the REST API (e.g., "http://localhost:8090")
    #[serde(default = "default_chirpstack_url")]
    pub url: String,
    /// API key sent as a bearer token
    #[serde(default)]
    pub api_token: String,
    /// Per-call timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Request confirmed unicast downlinks
    #[serde(default)]
    pub confirmed: bool,
}

impl ChirpStackConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ChirpStackConfig {
    fn default() -> Self {
        Self {
            url: default_chirpstack_url(),
            api_token: String::new(),
            timeout_secs: default_timeout(),
            confirmed: false,
        }
    }
}

/// Alarm/heartbeat server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusServerConfig {
    #[serde(default = "default_status_url")]
    pub url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl StatusServerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for StatusServerConfig {
    fn default() -> Self {
        Self {
            url: default_status_url(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Reference clock for time-sync replies and status timestamps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSyncConfig {
    /// Offset of the reference zone from UTC in whole hours
    #[serde(default = "default_utc_offset")]
    pub utc_offset_hours: i32,
}

impl Default for TimeSyncConfig {
    fn default() -> Self {
        Self {
            utc_offset_hours: default_utc_offset(),
        }
    }
}

/// Log output besides stderr
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Also write plain-text logs to this file (appended, never rotated)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Add a permissive CORS layer
    #[serde(default)]
    pub cors_enabled: bool,
}

/// Complete bridge configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeSettings {
    /// HTTP listen address
    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default)]
    pub chirpstack: ChirpStackConfig,
    #[serde(default)]
    pub status_server: StatusServerConfig,
    #[serde(default)]
    pub time_sync: TimeSyncConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Group name to network-server multicast group id
    #[serde(default)]
    pub multicast_groups: HashMap<String, String>,
}

fn default_listen() -> String {
    "0.0.0.0:10088".to_string()
}

fn default_chirpstack_url() -> String {
    "http://localhost:8090".to_string()
}

fn default_status_url() -> String {
    "http://localhost:10089".to_string()
}

fn default_timeout() -> u64 {
    5
}

fn default_utc_offset() -> i32 {
    8
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            chirpstack: ChirpStackConfig::default(),
            status_server: StatusServerConfig::default(),
            time_sync: TimeSyncConfig::default(),
            http: HttpConfig::default(),
            logging: LoggingConfig::default(),
            multicast_groups: HashMap::new(),
        }
    }
}

impl BridgeSettings {
    /// Reject settings the service cannot start with
    pub fn validate(&self) -> Result<()> {
        if self.chirpstack.url.trim().is_empty() {
            return Err(BridgeError::Config("chirpstack.url is empty".to_string()));
        }
        if self.status_server.url.trim().is_empty() {
            return Err(BridgeError::Config("status_server.url is empty".to_string()));
        }
        if self.chirpstack.timeout_secs == 0 || self.status_server.timeout_secs == 0 {
            return Err(BridgeError::Config(
                "timeouts must be at least one second".to_string(),
            ));
        }
        if !(-14..=14).contains(&self.time_sync.utc_offset_hours) {
            return Err(BridgeError::Config(format!(
                "time_sync.utc_offset_hours out of range: {}",
                self.time_sync.utc_offset_hours
            )));
        }
        if let Some(file) = &self.logging.file {
            if file.file_name().is_none() {
                return Err(BridgeError::Config(format!(
                    "logging.file is not a file path: {}",
                    file.display()
                )));
            }
        }
        for (name, id) in &self.multicast_groups {
            if name.trim().is_empty() || id.trim().is_empty() {
                return Err(BridgeError::Config(format!(
                    "multicast group '{}' has an empty name or id",
                    name
                )));
            }
        }
        Ok(())
    }

    pub fn time_offset(&self) -> Result<FixedOffset> {
        fixed_offset(self.time_sync.utc_offset_hours).ok_or_else(|| {
            BridgeError::Config(format!(
                "invalid utc offset: {}",
                self.time_sync.utc_offset_hours
            ))
        })
    }

    pub fn group_map(&self) -> MulticastGroupMap {
        MulticastGroupMap::new(self.multicast_groups.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = BridgeSettings::default();
        assert_eq!(settings.listen, "0.0.0.0:10088");
        assert_eq!(settings.chirpstack.timeout(), Duration::from_secs(5));
        assert_eq!(settings.time_sync.utc_offset_hours, 8);
        assert!(!settings.chirpstack.confirmed);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_offset() {
        let settings = BridgeSettings::default();
        assert_eq!(settings.time_offset().unwrap().local_minus_utc(), 8 * 3600);
    }

    #[test]
    fn test_validate_rejects_bad_offset() {
        let mut settings = BridgeSettings::default();
        settings.time_sync.utc_offset_hours = 20;
        assert!(matches!(settings.validate(), Err(BridgeError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_empty_group_id() {
        let mut settings = BridgeSettings::default();
        settings
            .multicast_groups
            .insert("group1".to_string(), " ".to_string());
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_log_file_path() {
        let mut settings = BridgeSettings::default();
        settings.logging.file = Some(PathBuf::from("/var/log/stakelink.log"));
        assert!(settings.validate().is_ok());
        for bad in ["..", "/"] {
            settings.logging.file = Some(PathBuf::from(bad));
            assert!(matches!(settings.validate(), Err(BridgeError::Config(_))));
        }
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut settings = BridgeSettings::default();
        settings.status_server.timeout_secs = 0;
        assert!(settings.validate().is_err());
    }
}
