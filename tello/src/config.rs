//! Session configuration.
//!
//! All fields have defaults matching the Tello SDK, so an empty JSON object
//! (`{}`) is a valid config file.

use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{TelloError, TelloResult};

/// UDP port the Tello listens on for SDK commands.
pub const DEFAULT_PORT: u16 = 8889;

/// Address of the Tello on its own WiFi access point.
pub const DEFAULT_TELLO_IP: &str = "192.168.10.1";

/// Default per-command timeout in seconds.
pub const DEFAULT_COMMAND_TIMEOUT_SECS: f64 = 0.3;

/// Construction options for a [`Tello`](crate::Tello) session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelloConfig {
    /// Local IP to bind (`0.0.0.0` binds every interface).
    pub local_ip: String,
    pub local_port: u16,
    /// Seconds to wait for a reply before a command times out.
    pub command_timeout_secs: f64,
    pub tello_ip: String,
    pub tello_port: u16,
    /// Extra blocking delay after a successful `takeoff` reply.
    pub takeoff_settle_secs: f64,
}

impl Default for TelloConfig {
    fn default() -> Self {
        Self {
            local_ip: "0.0.0.0".to_string(),
            local_port: DEFAULT_PORT,
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
            tello_ip: DEFAULT_TELLO_IP.to_string(),
            tello_port: DEFAULT_PORT,
            takeoff_settle_secs: 0.0,
        }
    }
}

impl TelloConfig {
    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> TelloResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Parse a config from JSON text and validate it.
    pub fn from_json_str(json: &str) -> TelloResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that addresses parse and durations are usable.
    pub fn validate(&self) -> TelloResult<()> {
        self.local_addr()?;
        self.remote_addr()?;
        if !self.command_timeout_secs.is_finite() || self.command_timeout_secs <= 0.0 {
            return Err(TelloError::Config(format!(
                "command_timeout_secs must be positive, got {}",
                self.command_timeout_secs
            )));
        }
        if !self.takeoff_settle_secs.is_finite() || self.takeoff_settle_secs < 0.0 {
            return Err(TelloError::Config(format!(
                "takeoff_settle_secs must not be negative, got {}",
                self.takeoff_settle_secs
            )));
        }
        Ok(())
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout_secs = timeout.as_secs_f64();
        self
    }

    pub fn with_takeoff_settle(mut self, settle: Duration) -> Self {
        self.takeoff_settle_secs = settle.as_secs_f64();
        self
    }

    pub fn with_local(mut self, ip: impl Into<String>, port: u16) -> Self {
        self.local_ip = ip.into();
        self.local_port = port;
        self
    }

    pub fn with_remote(mut self, ip: impl Into<String>, port: u16) -> Self {
        self.tello_ip = ip.into();
        self.tello_port = port;
        self
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.command_timeout_secs)
    }

    pub fn takeoff_settle(&self) -> Duration {
        Duration::from_secs_f64(self.takeoff_settle_secs)
    }

    /// Local socket address to bind.
    pub fn local_addr(&self) -> TelloResult<SocketAddr> {
        parse_addr(&self.local_ip, self.local_port)
    }

    /// Address of the drone.
    pub fn remote_addr(&self) -> TelloResult<SocketAddr> {
        parse_addr(&self.tello_ip, self.tello_port)
    }
}

fn parse_addr(ip: &str, port: u16) -> TelloResult<SocketAddr> {
    let ip: IpAddr = ip
        .parse()
        .map_err(|_| TelloError::Config(format!("Invalid IP address: {ip:?}")))?;
    Ok(SocketAddr::new(ip, port))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults_match_sdk() {
        let config = TelloConfig::default();
        assert_eq!(
            config.remote_addr().unwrap(),
            "192.168.10.1:8889".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(
            config.local_addr().unwrap(),
            "0.0.0.0:8889".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(config.command_timeout(), Duration::from_millis(300));
        assert_eq!(config.takeoff_settle(), Duration::ZERO);
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = TelloConfig::from_json_str("{}").unwrap();
        assert_eq!(config, TelloConfig::default());
    }

    #[test]
    fn test_partial_json_overrides() {
        let config =
            TelloConfig::from_json_str(r#"{"tello_ip": "127.0.0.1", "command_timeout_secs": 5}"#)
                .unwrap();
        assert_eq!(config.tello_ip, "127.0.0.1");
        assert_eq!(config.tello_port, DEFAULT_PORT);
        assert_relative_eq!(config.command_timeout_secs, 5.0);
    }

    #[test]
    fn test_invalid_ip_rejected() {
        let err = TelloConfig::from_json_str(r#"{"tello_ip": "not-an-ip"}"#).unwrap_err();
        assert!(matches!(err, TelloError::Config(_)));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = TelloConfig::from_json_str(r#"{"command_timeout_secs": 0}"#).unwrap_err();
        assert!(matches!(err, TelloError::Config(_)));
    }

    #[test]
    fn test_malformed_json_rejected() {
        let err = TelloConfig::from_json_str("{ tello_ip").unwrap_err();
        assert!(matches!(err, TelloError::ConfigJson(_)));
    }

    #[test]
    fn test_json_file_roundtrip() {
        let path = std::env::temp_dir().join(format!(
            "tello_config_test_{}.json",
            std::process::id()
        ));
        let config = TelloConfig::default()
            .with_remote("10.0.0.5", 9000)
            .with_command_timeout(Duration::from_secs(2));
        std::fs::write(&path, serde_json::to_string(&config).unwrap()).unwrap();

        let loaded = TelloConfig::from_json_file(&path).unwrap();
        assert_eq!(loaded, config);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = TelloConfig::from_json_file("/nonexistent/tello.json").unwrap_err();
        assert!(matches!(err, TelloError::ConfigIo(_)));
    }
}
