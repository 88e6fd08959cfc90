//! blanc-io - Serial-to-UDP relay node for a paired installation
//!
//! Each unit polls its microcontroller for `(y, z, pressure)` readings,
//! forwards them to the other unit as OSC over UDP, and keeps the latest
//! local and remote readings in a shared [`TelemetryStore`] for the motor
//! actuator.
//!
//! ## Threads
//!
//! - `sensor-poll`: [`PollLoop`] (serial request, store, forward)
//! - `actuator`: [`ActuatorLoop`] (remote reading to [`MotorActuator`])
//! - main: [`UdpReceiver`] (datagrams to the remote slot)

pub mod config;
pub mod core;
pub mod drivers;
pub mod error;
pub mod reconnect;
pub mod sensor;
pub mod streaming;
pub mod threads;
pub mod transport;

// Re-export commonly used types
pub use config::Config;
pub use crate::core::telemetry::{SharedTelemetry, Snapshot, TelemetryStore};
pub use crate::core::types::Reading;
pub use drivers::{DryRunActuator, MotionFlag, MotorActuator};
pub use error::{Error, Result};
pub use reconnect::{Backoff, LinkState, ReconnectPolicy};
pub use sensor::{LinkTiming, SensorLink};
pub use streaming::{Received, UdpReceiver, UdpSender};
pub use threads::{ActuatorLoop, PollLoop, PollOutcome, PollSettings};
