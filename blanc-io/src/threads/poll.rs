//! Sensor poll thread: request, store, forward.
//!
//! Each iteration asks the microcontroller for one reading, writes it to the
//! local slot and forwards it to the paired unit. Requests are suspended
//! while the motors move so that the mechanism does not measure itself.

use crate::core::telemetry::SharedTelemetry;
use crate::drivers::MotionFlag;
use crate::error::Error;
use crate::sensor::SensorLink;
use crate::streaming::UdpSender;
use std::thread;
use std::time::Duration;

/// Pacing of the poll loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Sleep between checks while the motion flag is set
    pub motion_idle: Duration,
    /// Sleep after a request that got no reply
    pub no_response_backoff: Duration,
    /// Consecutive unanswered requests before the serial link is reopened
    pub max_silent_polls: u32,
    /// Sleep after an unexpected failure
    pub error_pause: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            motion_idle: Duration::from_millis(5),
            no_response_backoff: Duration::from_millis(10),
            max_silent_polls: 50,
            error_pause: Duration::from_secs(1),
        }
    }
}

/// What one iteration did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Motors moving, no request made
    Skipped,
    /// Request made, no line came back in time
    NoResponse,
    /// Line came back but did not parse; discarded
    Malformed,
    /// Reading stored locally and handed to the sender
    Forwarded,
    /// Serial or other failure
    Failed,
}

/// Poll loop state (owned by the `sensor-poll` thread)
pub struct PollLoop {
    link: SensorLink,
    sender: UdpSender,
    telemetry: SharedTelemetry,
    motion: MotionFlag,
    settings: PollSettings,
    silent_polls: u32,
}

impl PollLoop {
    pub fn new(
        link: SensorLink,
        sender: UdpSender,
        telemetry: SharedTelemetry,
        motion: MotionFlag,
        settings: PollSettings,
    ) -> Self {
        Self {
            link,
            sender,
            telemetry,
            motion,
            settings,
            silent_polls: 0,
        }
    }

    /// Run forever
    pub fn run(&mut self) {
        log::info!("Sensor poll loop started");
        loop {
            let outcome = self.poll_once();
            self.pace(outcome);
        }
    }

    /// One iteration without any pacing sleep
    pub fn poll_once(&mut self) -> PollOutcome {
        if self.motion.is_moving() {
            return PollOutcome::Skipped;
        }

        match self.link.request_reading() {
            Ok(reading) => {
                self.telemetry.set_local(reading);
                if let Err(e) = self.sender.send(&reading) {
                    log::warn!("Failed to forward {}: {}", reading, e);
                }
                log::debug!("Forwarded local reading {}", reading);
                PollOutcome::Forwarded
            }
            Err(Error::NoResponse) => PollOutcome::NoResponse,
            Err(Error::Parse(e)) => {
                log::debug!("Discarding malformed sensor line: {}", e);
                PollOutcome::Malformed
            }
            Err(e) => {
                log::error!("Sensor poll failed: {}", e);
                PollOutcome::Failed
            }
        }
    }

    fn pace(&mut self, outcome: PollOutcome) {
        match outcome {
            PollOutcome::Skipped => thread::sleep(self.settings.motion_idle),
            PollOutcome::NoResponse => {
                self.silent_polls += 1;
                if self.silent_polls >= self.settings.max_silent_polls {
                    log::warn!(
                        "No reply to {} consecutive requests, reopening serial link",
                        self.silent_polls
                    );
                    self.silent_polls = 0;
                    self.link.reconnect();
                } else {
                    thread::sleep(self.settings.no_response_backoff);
                }
            }
            PollOutcome::Malformed | PollOutcome::Forwarded => self.silent_polls = 0,
            PollOutcome::Failed => {
                self.silent_polls = 0;
                thread::sleep(self.settings.error_pause);
            }
        }
    }
}
