//! Sensor link: request/response access to the microcontroller.
//!
//! The microcontroller only talks when asked. Each request writes the
//! trigger token `".\n"` and reads back one text line (see [`parser`]).
//!
//! # Connection Handling
//!
//! - `connect()` blocks until the port opens, retrying through the
//!   [`ReconnectPolicy`]. Opening the port resets the board, so the link
//!   waits `settle` before the first request.
//! - Any I/O failure during a request drops the port and returns the link to
//!   [`LinkState::Disconnected`]; the next request reconnects first.
//! - A line that does not arrive within `read_timeout` is reported as
//!   [`Error::NoResponse`] and the port stays open.

pub mod parser;

use crate::core::types::Reading;
use crate::error::{Error, Result};
use crate::reconnect::{LinkState, ReconnectPolicy};
use crate::transport::{Transport, TransportOpener};
use std::thread;
use std::time::{Duration, Instant};

/// Token that asks the microcontroller for one reading
pub const TRIGGER: &[u8] = b".\n";

/// Replies longer than this without a terminator are cut and handed to the parser
const MAX_LINE_LEN: usize = 256;

/// Timing parameters of the link
#[derive(Debug, Clone, Copy)]
pub struct LinkTiming {
    /// Deadline for one reply line
    pub read_timeout: Duration,
    /// Wait after opening the port before the first request
    pub settle: Duration,
}

impl Default for LinkTiming {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(1),
            settle: Duration::from_secs(2),
        }
    }
}

/// Serial session with the local microcontroller
pub struct SensorLink {
    opener: TransportOpener,
    transport: Option<Box<dyn Transport>>,
    policy: ReconnectPolicy,
    timing: LinkTiming,
    state: LinkState,
    /// Bytes received but not yet consumed as a line
    pending: Vec<u8>,
}

impl SensorLink {
    /// Create a disconnected link; call [`connect`](Self::connect) before use
    pub fn new(opener: TransportOpener, policy: ReconnectPolicy, timing: LinkTiming) -> Self {
        Self {
            opener,
            transport: None,
            policy,
            timing,
            state: LinkState::Disconnected,
            pending: Vec::with_capacity(MAX_LINE_LEN),
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Open the serial port, retrying until it succeeds
    pub fn connect(&mut self) {
        self.state = LinkState::Connecting;
        let opener = &mut self.opener;
        let transport = self.policy.retry("serial link", || opener());

        self.transport = Some(transport);
        self.pending.clear();
        self.state = LinkState::Connected;

        if !self.timing.settle.is_zero() {
            log::debug!("Waiting {:?} for microcontroller reset", self.timing.settle);
            thread::sleep(self.timing.settle);
        }
    }

    /// Drop the current port and connect again
    pub fn reconnect(&mut self) {
        self.disconnect();
        self.connect();
    }

    fn disconnect(&mut self) {
        if self.transport.take().is_some() {
            log::warn!("Serial link disconnected");
        }
        self.state = LinkState::Disconnected;
    }

    /// Ask for one reading.
    ///
    /// # Returns
    /// - `Ok(reading)` for a well-formed reply
    /// - `Err(Error::NoResponse)` if no line arrived in time
    /// - `Err(Error::Parse(_))` for a malformed reply
    /// - other errors for I/O failures (the link is disconnected)
    pub fn request_reading(&mut self) -> Result<Reading> {
        if self.transport.is_none() {
            self.connect();
        }

        let line = match self.exchange() {
            Ok(line) => line,
            Err(e) => {
                self.disconnect();
                return Err(e);
            }
        };

        if line.trim().is_empty() {
            return Err(Error::NoResponse);
        }

        log::trace!("Sensor line: {}", line.trim_end());
        Ok(parser::parse_line(&line)?)
    }

    /// Write the trigger and read back one line
    fn exchange(&mut self) -> Result<String> {
        let transport = self
            .transport
            .as_mut()
            .ok_or(Error::NotConnected("serial link"))?;

        transport.write_all(TRIGGER)?;
        transport.flush()?;

        let deadline = Instant::now() + self.timing.read_timeout;
        let mut chunk = [0u8; 64];

        loop {
            if let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = self.pending.drain(..=pos).collect();
                return Ok(String::from_utf8_lossy(&line).into_owned());
            }
            if self.pending.len() >= MAX_LINE_LEN || Instant::now() >= deadline {
                break;
            }

            let n = transport.read(&mut chunk)?;
            if n == 0 {
                thread::sleep(Duration::from_millis(1));
            } else {
                self.pending.extend_from_slice(&chunk[..n]);
            }
        }

        // Timed out (or overlong): hand over whatever arrived
        let partial: Vec<u8> = self.pending.drain(..).collect();
        Ok(String::from_utf8_lossy(&partial).into_owned())
    }
}
