//! Actuator thread: hands every new remote reading to the motor actuator.

use crate::core::telemetry::SharedTelemetry;
use crate::drivers::{MotionFlag, MotorActuator};
use std::thread;
use std::time::Duration;

/// Watches the remote slot and drives the actuator on each update
pub struct ActuatorLoop {
    actuator: Box<dyn MotorActuator>,
    telemetry: SharedTelemetry,
    motion: MotionFlag,
    interval: Duration,
    last_sequence: u64,
}

impl ActuatorLoop {
    pub fn new(
        actuator: Box<dyn MotorActuator>,
        telemetry: SharedTelemetry,
        motion: MotionFlag,
        interval: Duration,
    ) -> Self {
        Self {
            actuator,
            telemetry,
            motion,
            interval,
            last_sequence: 0,
        }
    }

    /// Run forever
    pub fn run(&mut self) {
        log::info!("Actuator loop started (interval {:?})", self.interval);
        loop {
            self.step();
            thread::sleep(self.interval);
        }
    }

    /// Drive once if the remote slot changed since the last call.
    ///
    /// Returns true if the actuator was invoked. Intermediate readings that
    /// arrived between two calls are skipped; only the latest matters.
    pub fn step(&mut self) -> bool {
        let Some(snapshot) = self.telemetry.remote_snapshot() else {
            return false;
        };
        if snapshot.sequence == self.last_sequence {
            return false;
        }
        self.last_sequence = snapshot.sequence;

        if let Err(e) = self.actuator.drive(snapshot.reading, &self.motion) {
            log::error!("Actuator failed on {}: {}", snapshot.reading, e);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::telemetry::TelemetryStore;
    use crate::core::types::Reading;
    use crate::error::{Error, Result};
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Records targets; fails when asked to
    struct Recorder {
        targets: Arc<Mutex<Vec<Reading>>>,
        fail: bool,
    }

    impl MotorActuator for Recorder {
        fn drive(&mut self, target: Reading, _motion: &MotionFlag) -> Result<()> {
            self.targets.lock().push(target);
            if self.fail {
                return Err(Error::Other("stalled".into()));
            }
            Ok(())
        }
    }

    fn loop_with(fail: bool) -> (ActuatorLoop, SharedTelemetry, Arc<Mutex<Vec<Reading>>>) {
        let telemetry = TelemetryStore::shared();
        let targets = Arc::new(Mutex::new(Vec::new()));
        let actuator = Recorder {
            targets: targets.clone(),
            fail,
        };
        let actuator_loop = ActuatorLoop::new(
            Box::new(actuator),
            telemetry.clone(),
            MotionFlag::new(),
            Duration::from_millis(1),
        );
        (actuator_loop, telemetry, targets)
    }

    #[test]
    fn test_drives_once_per_remote_update() {
        let (mut actuator_loop, telemetry, targets) = loop_with(false);
        assert!(!actuator_loop.step());

        telemetry.set_remote(Reading::new(7, 2, true));
        assert!(actuator_loop.step());
        assert!(!actuator_loop.step());

        // Same value again is still a new update
        telemetry.set_remote(Reading::new(7, 2, true));
        assert!(actuator_loop.step());

        assert_eq!(targets.lock().len(), 2);
    }

    #[test]
    fn test_only_latest_reading_is_driven() {
        let (mut actuator_loop, telemetry, targets) = loop_with(false);
        telemetry.set_remote(Reading::new(1, 0, false));
        telemetry.set_remote(Reading::new(2, 0, false));

        assert!(actuator_loop.step());
        assert_eq!(*targets.lock(), vec![Reading::new(2, 0, false)]);
    }

    #[test]
    fn test_local_updates_do_not_drive() {
        let (mut actuator_loop, telemetry, targets) = loop_with(false);
        telemetry.set_local(Reading::new(1, 1, true));
        assert!(!actuator_loop.step());
        assert!(targets.lock().is_empty());
    }

    #[test]
    fn test_drive_error_does_not_stop_loop() {
        let (mut actuator_loop, telemetry, targets) = loop_with(true);
        telemetry.set_remote(Reading::new(1, 0, false));
        assert!(actuator_loop.step());
        telemetry.set_remote(Reading::new(2, 0, false));
        assert!(actuator_loop.step());
        assert_eq!(targets.lock().len(), 2);
    }
}
