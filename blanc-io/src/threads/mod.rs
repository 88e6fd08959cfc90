//! Worker threads for blanc-io.
//!
//! - `sensor-poll`: requests readings over serial, stores and forwards them
//! - `actuator`: drives the motors from the paired unit's readings
//!
//! The relay receiver is not spawned here; it runs on the main thread and
//! stops once either worker has exited.

mod actuator;
mod poll;

pub use actuator::ActuatorLoop;
pub use poll::{PollLoop, PollOutcome, PollSettings};

use crate::error::{Error, Result};
use std::thread::{self, JoinHandle};

/// Handles of the spawned worker threads
pub struct ThreadHandles {
    pub poll: JoinHandle<()>,
    pub actuator: JoinHandle<()>,
}

impl ThreadHandles {
    /// Name of the first worker that is no longer running, if any
    pub fn stopped(&self) -> Option<&'static str> {
        if self.poll.is_finished() {
            Some("sensor-poll")
        } else if self.actuator.is_finished() {
            Some("actuator")
        } else {
            None
        }
    }

    /// Wait for both workers, reporting whether either panicked
    pub fn join(self) -> Result<()> {
        let poll = self.poll.join();
        let actuator = self.actuator.join();
        match (poll, actuator) {
            (Ok(()), Ok(())) => Ok(()),
            (Err(_), _) => Err(Error::Other("sensor-poll thread panicked".into())),
            (_, Err(_)) => Err(Error::Other("actuator thread panicked".into())),
        }
    }
}

/// Spawn the poll and actuator threads.
pub fn spawn_threads(
    mut poll_loop: PollLoop,
    mut actuator_loop: ActuatorLoop,
) -> Result<ThreadHandles> {
    let poll = thread::Builder::new()
        .name("sensor-poll".into())
        .spawn(move || poll_loop.run())
        .map_err(|e| Error::Other(format!("Failed to spawn sensor-poll thread: {}", e)))?;

    let actuator = thread::Builder::new()
        .name("actuator".into())
        .spawn(move || actuator_loop.run())
        .map_err(|e| Error::Other(format!("Failed to spawn actuator thread: {}", e)))?;

    Ok(ThreadHandles { poll, actuator })
}
