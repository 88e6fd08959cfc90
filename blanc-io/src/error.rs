//! Error types for blanc-io

use crate::sensor::parser::ParseError;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// blanc-io error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Serial port error (open or configure)
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Microcontroller did not answer the trigger within the read timeout
    #[error("No response from sensor")]
    NoResponse,

    /// Sensor line could not be parsed into a reading
    #[error("Malformed sensor line: {0}")]
    Parse(#[from] ParseError),

    /// OSC packet that cannot be encoded, or an inbound datagram that is not a reading
    #[error("Invalid packet: {0}")]
    InvalidPacket(String),

    /// Operation needs a connection that is not open
    #[error("Not connected: {0}")]
    NotConnected(&'static str),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(e: toml::ser::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<rosc::OscError> for Error {
    fn from(e: rosc::OscError) -> Self {
        Error::InvalidPacket(format!("{:?}", e))
    }
}
