//! Device driver traits

pub mod motor;

pub use motor::{DryRunActuator, MotionFlag, MotorActuator};
