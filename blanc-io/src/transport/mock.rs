//! Mock transport for testing
//!
//! Behaves like a microcontroller that answers each write with the next
//! scripted response. Clones share state, so a test keeps one handle while the
//! sensor link owns another.

use super::{Transport, TransportOpener};
use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::sync::Arc;

/// Mock transport for unit testing
#[derive(Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Default)]
struct MockTransportInner {
    read_buffer: VecDeque<u8>,
    write_buffer: Vec<u8>,
    /// Released into `read_buffer` one per write; `None` stays silent
    responses: VecDeque<Option<Vec<u8>>>,
    writes: usize,
    fail_next_write: bool,
    failing_opens: usize,
    opens: usize,
}

impl MockTransport {
    /// Create a new mock transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Inject data to be read
    pub fn inject_read(&self, data: &[u8]) {
        self.inner.lock().read_buffer.extend(data);
    }

    /// Queue a line (terminator added) sent back after the next unanswered write
    pub fn queue_response(&self, line: &str) {
        let mut bytes = line.as_bytes().to_vec();
        bytes.push(b'\n');
        self.inner.lock().responses.push_back(Some(bytes));
    }

    /// Queue a write that gets no answer (simulates a read timeout)
    pub fn queue_silence(&self) {
        self.inner.lock().responses.push_back(None);
    }

    /// Make the next write fail with a broken pipe
    pub fn fail_next_write(&self) {
        self.inner.lock().fail_next_write = true;
    }

    /// Make the next `count` calls of an [`opener`](Self::opener) fail
    pub fn fail_opens(&self, count: usize) {
        self.inner.lock().failing_opens = count;
    }

    /// Get all written data
    pub fn get_written(&self) -> Vec<u8> {
        self.inner.lock().write_buffer.clone()
    }

    /// Number of successful writes so far
    pub fn write_count(&self) -> usize {
        self.inner.lock().writes
    }

    /// Number of open attempts made through openers (failed ones included)
    pub fn open_count(&self) -> usize {
        self.inner.lock().opens
    }

    /// Opener handing out handles to this mock
    pub fn opener(&self) -> TransportOpener {
        let mock = self.clone();
        Box::new(move || {
            let mut inner = mock.inner.lock();
            inner.opens += 1;
            if inner.failing_opens > 0 {
                inner.failing_opens -= 1;
                return Err(Error::Io(io::Error::new(
                    io::ErrorKind::NotFound,
                    "mock device not present",
                )));
            }
            drop(inner);
            Ok(Box::new(mock.clone()) as Box<dyn Transport>)
        })
    }
}

impl Transport for MockTransport {
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize> {
        let mut inner = self.inner.lock();
        let available = inner.read_buffer.len().min(buffer.len());

        for (slot, byte) in buffer.iter_mut().zip(inner.read_buffer.drain(..available)) {
            *slot = byte;
        }

        Ok(available)
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.fail_next_write {
            inner.fail_next_write = false;
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "mock write failure",
            )));
        }
        inner.write_buffer.extend_from_slice(data);
        inner.writes += 1;
        if let Some(Some(response)) = inner.responses.pop_front() {
            inner.read_buffer.extend(response);
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
