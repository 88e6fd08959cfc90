//! Transport layer for I/O abstraction

use crate::error::Result;

pub mod mock;
mod serial;

pub use mock::MockTransport;
pub use serial::SerialTransport;

/// Byte-stream connection to the microcontroller
pub trait Transport: Send {
    /// Read data into buffer, returns number of bytes read (0 on timeout)
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize>;

    /// Write the whole buffer
    fn write_all(&mut self, data: &[u8]) -> Result<()>;

    /// Flush any pending writes (blocking until complete)
    fn flush(&mut self) -> Result<()>;
}

/// Opens a fresh transport; called on every (re)connect attempt
pub type TransportOpener = Box<dyn FnMut() -> Result<Box<dyn Transport>> + Send>;
