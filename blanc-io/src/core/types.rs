//! Sensor reading type.

use std::fmt;

/// One sample from the sensor stream: 2-axis deflection plus a contact flag.
///
/// A reading is a complete snapshot. A newer reading fully supersedes an
/// older one; there is no merging of fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Reading {
    pub y: i64,
    pub z: i64,
    pub pressure: bool,
}

impl Reading {
    pub const fn new(y: i64, z: i64, pressure: bool) -> Self {
        Self { y, z, pressure }
    }

    /// Pressure flag as the 0/1 integer used on the wire
    #[inline]
    pub fn pressure_bit(&self) -> i32 {
        i32::from(self.pressure)
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "y: {}, z: {}, pressure: {}",
            self.y,
            self.z,
            self.pressure_bit()
        )
    }
}
