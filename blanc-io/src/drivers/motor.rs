//! Motor actuator boundary
//!
//! The physical motor control law is installation-specific and lives behind
//! [`MotorActuator`]. This module only defines how targets reach it and how
//! it tells the poll loop that the mechanism is moving.

use crate::core::types::Reading;
use crate::error::Result;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared "motors are moving" flag.
///
/// Set by the actuator while a movement is in progress; the poll loop skips
/// sensor requests while it is set. Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct MotionFlag {
    moving: Arc<AtomicBool>,
}

impl MotionFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_moving(&self) -> bool {
        self.moving.load(Ordering::Acquire)
    }

    pub fn set_moving(&self, moving: bool) {
        let was = self.moving.swap(moving, Ordering::AcqRel);
        if was != moving {
            log::debug!("Motion flag {}", if moving { "set" } else { "cleared" });
        }
    }
}

/// Motor actuator driver trait
pub trait MotorActuator: Send {
    /// Move towards the latest reading of the paired unit.
    ///
    /// # Arguments
    /// * `target` - Remote reading to mirror
    /// * `motion` - Flag to hold set while the motors are moving
    fn drive(&mut self, target: Reading, motion: &MotionFlag) -> Result<()>;
}

/// Actuator used when no motor hardware is attached: logs targets, never moves.
#[derive(Debug, Default)]
pub struct DryRunActuator {
    driven: u64,
}

impl DryRunActuator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of targets received so far
    pub fn driven(&self) -> u64 {
        self.driven
    }
}

impl MotorActuator for DryRunActuator {
    fn drive(&mut self, target: Reading, motion: &MotionFlag) -> Result<()> {
        self.driven += 1;
        motion.set_moving(false);
        log::info!("Dry-run target #{}: {}", self.driven, target);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_motion_flag_clones_share_state() {
        let flag = MotionFlag::new();
        let other = flag.clone();
        assert!(!flag.is_moving());

        other.set_moving(true);
        assert!(flag.is_moving());

        flag.set_moving(false);
        assert!(!other.is_moving());
    }

    #[test]
    fn test_dry_run_never_reports_motion() {
        let flag = MotionFlag::new();
        flag.set_moving(true);

        let mut actuator = DryRunActuator::new();
        actuator.drive(Reading::new(3, 4, true), &flag).unwrap();

        assert!(!flag.is_moving());
        assert_eq!(actuator.driven(), 1);
    }
}
