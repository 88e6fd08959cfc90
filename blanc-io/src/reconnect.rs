//! Reconnect policy shared by the serial link and both relay sockets.
//!
//! Every connection in blanc-io follows the same state machine:
//!
//! ```text
//! ┌──────────────┐  connect()  ┌────────────┐   ok   ┌───────────┐
//! │ Disconnected │ ──────────▶ │ Connecting │ ─────▶ │ Connected │
//! └──────────────┘             └────────────┘        └───────────┘
//!        ▲                       │  ▲    err                │
//!        │                       └──┘ (sleep, retry)        │
//!        └────────────────────── I/O failure ───────────────┘
//! ```
//!
//! There is no terminal state: a missing device or an unreachable network is
//! treated as transient, so [`ReconnectPolicy::retry`] never gives up.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::thread;
use std::time::Duration;

/// Connection lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Connected,
}

/// Delay progression between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backoff {
    /// Same delay before every retry
    #[default]
    Fixed,
    /// Delay doubles after every failure, capped at `max_delay`
    Exponential,
}

/// Unbounded retry with a fixed or exponential delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    delay: Duration,
    max_delay: Duration,
    backoff: Backoff,
}

impl ReconnectPolicy {
    /// Same delay between every attempt
    pub fn fixed(delay: Duration) -> Self {
        Self {
            delay,
            max_delay: delay,
            backoff: Backoff::Fixed,
        }
    }

    /// Doubling delay starting at `delay`, never above `max_delay`
    pub fn exponential(delay: Duration, max_delay: Duration) -> Self {
        Self {
            delay,
            max_delay: max_delay.max(delay),
            backoff: Backoff::Exponential,
        }
    }

    pub fn backoff(&self) -> Backoff {
        self.backoff
    }

    /// Delay to wait after the given failed attempt (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Exponential => {
                let shift = attempt.saturating_sub(1).min(31);
                self.delay
                    .checked_mul(1u32 << shift)
                    .unwrap_or(self.max_delay)
                    .min(self.max_delay)
            }
        }
    }

    /// Run `attempt` until it succeeds, sleeping between failures.
    ///
    /// Blocks the calling thread for as long as it takes; failures are only
    /// logged, never returned.
    pub fn retry<T, E, F>(&self, what: &str, mut attempt: F) -> T
    where
        E: Display,
        F: FnMut() -> std::result::Result<T, E>,
    {
        let mut attempts: u32 = 0;
        loop {
            attempts = attempts.saturating_add(1);
            log::info!("Connecting {} (attempt {})", what, attempts);
            match attempt() {
                Ok(value) => {
                    log::info!("Connected {} after {} attempt(s)", what, attempts);
                    return value;
                }
                Err(e) => {
                    let delay = self.delay_for(attempts);
                    log::warn!(
                        "Failed to connect {}: {}. Retrying in {:?}...",
                        what,
                        e,
                        delay
                    );
                    thread::sleep(delay);
                }
            }
        }
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::fixed(Duration::from_secs(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_fixed_delay_never_changes() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(50), Duration::from_secs(2));
        assert_eq!(policy.delay_for(u32::MAX), Duration::from_secs(2));
    }

    #[test]
    fn test_exponential_doubles_and_caps() {
        let policy =
            ReconnectPolicy::exponential(Duration::from_millis(100), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(4), Duration::from_millis(800));
        assert_eq!(policy.delay_for(5), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(400), Duration::from_millis(1000));
    }

    #[test]
    fn test_retry_succeeds_once_resource_appears() {
        let policy = ReconnectPolicy::fixed(Duration::from_millis(5));
        let mut calls = 0;
        let start = Instant::now();

        let value: u32 = policy.retry("test resource", || {
            calls += 1;
            if calls < 4 {
                Err("device absent")
            } else {
                Ok(42)
            }
        });

        assert_eq!(value, 42);
        assert_eq!(calls, 4);
        // Three failures, each followed by the fixed delay
        assert!(start.elapsed() >= Duration::from_millis(15));
    }

    #[test]
    fn test_backoff_deserializes_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            backoff: Backoff,
        }
        let w: Wrapper = toml::from_str("backoff = \"exponential\"").unwrap();
        assert_eq!(w.backoff, Backoff::Exponential);
    }
}
