//! Configuration for blanc-io
//!
//! Loaded from a TOML file. Every field has a default, so a file only needs
//! the values that differ on a given unit (typically `peer.address`).
//!
//! ```toml
//! [peer]
//! address = "192.168.1.2"
//!
//! [serial]
//! port = "/dev/ttyUSB0"
//! ```

use crate::error::{Error, Result};
use crate::reconnect::{Backoff, ReconnectPolicy};
use crate::sensor::LinkTiming;
use crate::threads::PollSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub peer: PeerConfig,
    pub listen: ListenConfig,
    pub serial: SerialConfig,
    pub reconnect: ReconnectConfig,
    pub poll: PollConfig,
    pub actuator: ActuatorConfig,
    pub logging: LoggingConfig,
}

/// Paired unit that receives our readings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PeerConfig {
    /// Host name or IP address of the other unit
    pub address: String,
    pub port: u16,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            address: "192.168.1.2".to_string(),
            port: 8888,
        }
    }
}

/// Local socket receiving the paired unit's readings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenConfig {
    pub bind_address: String,
    pub port: u16,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8888,
        }
    }
}

/// Microcontroller serial port
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SerialConfig {
    pub port: String,
    pub baud_rate: u32,
    /// Deadline for one reply line
    pub read_timeout_ms: u64,
    /// Wait after opening the port (the board resets on open)
    pub settle_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyACM0".to_string(),
            baud_rate: 9600,
            read_timeout_ms: 1000,
            settle_ms: 2000,
        }
    }
}

/// Retry behaviour for the serial port and both sockets
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ReconnectConfig {
    pub delay_ms: u64,
    pub backoff: Backoff,
    /// Upper bound for exponential backoff
    pub max_delay_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            delay_ms: 2000,
            backoff: Backoff::Fixed,
            max_delay_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PollConfig {
    pub no_response_backoff_ms: u64,
    pub max_silent_polls: u32,
    pub error_pause_ms: u64,
    pub motion_idle_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            no_response_backoff_ms: 10,
            max_silent_polls: 50,
            error_pause_ms: 1000,
            motion_idle_ms: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ActuatorConfig {
    pub poll_interval_ms: u64,
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 20,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load and validate configuration from a TOML file
    ///
    /// # Example
    /// ```no_run
    /// use blanc_io::Config;
    ///
    /// let config = Config::load("/etc/blanc.toml")?;
    /// # Ok::<(), blanc_io::Error>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Reject values that would make the relay misbehave at runtime
    pub fn validate(&self) -> Result<()> {
        if self.peer.address.trim().is_empty() {
            return Err(Error::Config("peer.address must not be empty".into()));
        }
        if self.peer.port == 0 {
            return Err(Error::Config("peer.port must not be 0".into()));
        }
        self.listen_addr()?;
        if self.serial.port.trim().is_empty() {
            return Err(Error::Config("serial.port must not be empty".into()));
        }
        if self.serial.baud_rate == 0 {
            return Err(Error::Config("serial.baud_rate must not be 0".into()));
        }
        if self.serial.read_timeout_ms == 0 {
            return Err(Error::Config("serial.read_timeout_ms must not be 0".into()));
        }
        if self.reconnect.delay_ms == 0 {
            return Err(Error::Config("reconnect.delay_ms must not be 0".into()));
        }
        if self.poll.max_silent_polls == 0 {
            return Err(Error::Config("poll.max_silent_polls must not be 0".into()));
        }
        if self.actuator.poll_interval_ms == 0 {
            return Err(Error::Config("actuator.poll_interval_ms must not be 0".into()));
        }
        Ok(())
    }

    /// Socket address for the relay receiver
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self.listen.bind_address.parse().map_err(|e| {
            Error::Config(format!(
                "listen.bind_address {:?} is not an IP address: {}",
                self.listen.bind_address, e
            ))
        })?;
        Ok(SocketAddr::new(ip, self.listen.port))
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        let delay = Duration::from_millis(self.reconnect.delay_ms);
        match self.reconnect.backoff {
            Backoff::Fixed => ReconnectPolicy::fixed(delay),
            Backoff::Exponential => ReconnectPolicy::exponential(
                delay,
                Duration::from_millis(self.reconnect.max_delay_ms),
            ),
        }
    }

    pub fn link_timing(&self) -> LinkTiming {
        LinkTiming {
            read_timeout: Duration::from_millis(self.serial.read_timeout_ms),
            settle: Duration::from_millis(self.serial.settle_ms),
        }
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            motion_idle: Duration::from_millis(self.poll.motion_idle_ms),
            no_response_backoff: Duration::from_millis(self.poll.no_response_backoff_ms),
            max_silent_polls: self.poll.max_silent_polls,
            error_pause: Duration::from_millis(self.poll.error_pause_ms),
        }
    }

    pub fn actuator_interval(&self) -> Duration {
        Duration::from_millis(self.actuator.poll_interval_ms)
    }
}
