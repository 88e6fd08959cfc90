//! Core data types shared by every component.
//!
//! - [`types::Reading`]: One sensor sample, the only domain value
//! - [`telemetry::TelemetryStore`]: Latest local and remote readings, shared between threads

pub mod telemetry;
pub mod types;
