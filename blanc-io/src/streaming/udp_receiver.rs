//! UDP receiver for readings sent by the paired unit
//!
//! Runs on the main thread for the lifetime of the process. Every inbound
//! `/data` message is decoded and written to the remote slot of the
//! telemetry store. Anything else is dropped: a malformed datagram is
//! indistinguishable from packet loss as far as the installation is
//! concerned.
//!
//! # Socket Lifecycle
//!
//! - `bind()` retries through the [`ReconnectPolicy`] until the port is free
//! - a 500ms read timeout wakes the loop periodically
//! - any socket error other than a timeout drops the socket and rebinds

use crate::core::telemetry::SharedTelemetry;
use crate::error::{Error, Result};
use crate::reconnect::ReconnectPolicy;
use crate::streaming::messages::{DATA_ADDRESS, reading_from_message};
use rosc::{OscMessage, OscPacket, decoder};
use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

/// Largest datagram we accept (one Ethernet MTU)
const MAX_DATAGRAM_SIZE: usize = 1536;

/// Read timeout so the loop never blocks indefinitely
const READ_TIMEOUT: Duration = Duration::from_millis(500);

/// Nested bundles deeper than this are dropped
const MAX_BUNDLE_DEPTH: usize = 8;

/// Result of handling one datagram (or one timeout)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Received {
    /// Number of readings written to the remote slot
    Applied(usize),
    /// Datagram carried nothing usable
    Ignored,
    /// Read timed out with no datagram
    Idle,
}

/// Decode a datagram into its messages, flattening bundles in order.
pub fn decode_datagram(bytes: &[u8]) -> Result<Vec<OscMessage>> {
    let (_, packet) = decoder::decode_udp(bytes)?;
    let mut messages = Vec::new();
    flatten(packet, 0, &mut messages)?;
    Ok(messages)
}

fn flatten(packet: OscPacket, depth: usize, out: &mut Vec<OscMessage>) -> Result<()> {
    match packet {
        OscPacket::Message(msg) => out.push(msg),
        OscPacket::Bundle(bundle) => {
            if depth >= MAX_BUNDLE_DEPTH {
                return Err(Error::InvalidPacket("bundle nesting too deep".into()));
            }
            for element in bundle.content {
                flatten(element, depth + 1, out)?;
            }
        }
    }
    Ok(())
}

/// UDP listener feeding the remote telemetry slot
pub struct UdpReceiver {
    socket: Option<UdpSocket>,
    bind_addr: SocketAddr,
    policy: ReconnectPolicy,
    telemetry: SharedTelemetry,
    /// Reusable receive buffer
    buffer: Vec<u8>,
}

impl UdpReceiver {
    /// Bind the listening socket, retrying until it succeeds
    pub fn bind(
        bind_addr: SocketAddr,
        policy: ReconnectPolicy,
        telemetry: SharedTelemetry,
    ) -> Self {
        let mut receiver = Self {
            socket: None,
            bind_addr,
            policy,
            telemetry,
            buffer: vec![0u8; MAX_DATAGRAM_SIZE],
        };
        receiver.rebind();
        receiver
    }

    fn rebind(&mut self) {
        self.socket = None;

        let addr = self.bind_addr;
        let what = format!("relay receiver on {}", addr);
        let socket = self.policy.retry(&what, || -> Result<UdpSocket> {
            let socket = UdpSocket::bind(addr)?;
            socket.set_read_timeout(Some(READ_TIMEOUT))?;
            Ok(socket)
        });

        if let Ok(local) = socket.local_addr() {
            log::info!("Relay receiver listening on {}", local);
        }
        self.socket = Some(socket);
    }

    /// Address actually bound (resolves port 0)
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }

    /// Dispatch loop; returns once `keep_running` says so
    ///
    /// `keep_running` is checked after every datagram or read timeout.
    pub fn run<F: FnMut() -> bool>(&mut self, mut keep_running: F) {
        log::info!("Relay receiver started");
        while keep_running() {
            self.serve_once();
        }
        log::info!("Relay receiver stopped");
    }

    /// Wait for one datagram (up to the read timeout) and apply it
    pub fn serve_once(&mut self) -> Received {
        let Some(socket) = self.socket.as_ref() else {
            self.rebind();
            return Received::Idle;
        };

        match socket.recv_from(&mut self.buffer) {
            Ok((len, from)) => self.handle_datagram(len, from),
            Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {
                Received::Idle
            }
            // ICMP port unreachable from an earlier send surfaces here on some platforms
            Err(e) if e.kind() == ErrorKind::ConnectionReset => {
                log::debug!("Ignoring connection reset on relay socket");
                Received::Idle
            }
            Err(e) => {
                log::error!("Relay receive error: {}", e);
                self.rebind();
                Received::Idle
            }
        }
    }

    fn handle_datagram(&self, len: usize, from: SocketAddr) -> Received {
        let messages = match decode_datagram(&self.buffer[..len]) {
            Ok(messages) => messages,
            Err(e) => {
                log::debug!("Dropping datagram from {}: {}", from, e);
                return Received::Ignored;
            }
        };

        let mut applied = 0;
        for msg in messages.iter().filter(|m| m.addr == DATA_ADDRESS) {
            match reading_from_message(msg) {
                Ok(reading) => {
                    self.telemetry.set_remote(reading);
                    log::trace!("Received {} from {}", reading, from);
                    applied += 1;
                }
                Err(e) => log::debug!("Dropping message from {}: {}", from, e),
            }
        }

        if applied == 0 {
            Received::Ignored
        } else {
            Received::Applied(applied)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::telemetry::TelemetryStore;
    use crate::core::types::Reading;
    use crate::streaming::messages::encode_reading;
    use rosc::{OscBundle, OscTime, OscType, encoder};
    use std::thread;

    fn local_receiver() -> (UdpReceiver, UdpSocket, SharedTelemetry) {
        let telemetry = TelemetryStore::shared();
        let receiver = UdpReceiver::bind(
            "127.0.0.1:0".parse().unwrap(),
            ReconnectPolicy::fixed(Duration::from_millis(1)),
            telemetry.clone(),
        );
        let client = UdpSocket::bind("127.0.0.1:0").unwrap();
        client.connect(receiver.local_addr().unwrap()).unwrap();
        (receiver, client, telemetry)
    }

    fn message(addr: &str, args: Vec<OscType>) -> OscPacket {
        OscPacket::Message(OscMessage {
            addr: addr.to_string(),
            args,
        })
    }

    fn encode(packet: &OscPacket) -> Vec<u8> {
        encoder::encode(packet).unwrap()
    }

    #[test]
    fn test_data_message_updates_remote_slot() {
        let (mut receiver, client, telemetry) = local_receiver();
        let packet = message(
            "/data",
            vec![OscType::Int(7), OscType::Int(2), OscType::Int(1)],
        );
        client.send(&encode(&packet)).unwrap();

        assert_eq!(receiver.serve_once(), Received::Applied(1));
        assert_eq!(telemetry.remote(), Some(Reading::new(7, 2, true)));
        assert_eq!(telemetry.local(), None);
    }

    #[test]
    fn test_long_axis_is_applied_unchanged() {
        let (mut receiver, client, telemetry) = local_receiver();
        let packet = message(
            "/data",
            vec![OscType::Long(3_000_000_000), OscType::Int(5), OscType::Int(1)],
        );
        client.send(&encode(&packet)).unwrap();

        assert_eq!(receiver.serve_once(), Received::Applied(1));
        assert_eq!(telemetry.remote(), Some(Reading::new(3_000_000_000, 5, true)));
    }

    #[test]
    fn test_malformed_datagram_leaves_remote_unchanged() {
        let (mut receiver, client, telemetry) = local_receiver();
        telemetry.set_remote(Reading::new(1, 1, false));

        client.send(b"not osc at all").unwrap();
        assert_eq!(receiver.serve_once(), Received::Ignored);

        let wrong_shape = message("/data", vec![OscType::Int(9)]);
        client.send(&encode(&wrong_shape)).unwrap();
        assert_eq!(receiver.serve_once(), Received::Ignored);

        let other_address = message(
            "/motor",
            vec![OscType::Int(9), OscType::Int(9), OscType::Int(9)],
        );
        client.send(&encode(&other_address)).unwrap();
        assert_eq!(receiver.serve_once(), Received::Ignored);

        assert_eq!(telemetry.remote(), Some(Reading::new(1, 1, false)));
    }

    #[test]
    fn test_latest_processed_message_wins() {
        let (mut receiver, client, telemetry) = local_receiver();
        for reading in [Reading::new(1, 0, false), Reading::new(2, 0, true)] {
            client.send(&encode_reading(&reading).unwrap()).unwrap();
        }

        assert_eq!(receiver.serve_once(), Received::Applied(1));
        assert_eq!(receiver.serve_once(), Received::Applied(1));
        assert_eq!(telemetry.remote(), Some(Reading::new(2, 0, true)));
        assert_eq!(telemetry.remote_snapshot().unwrap().sequence, 2);
    }

    #[test]
    fn test_bundle_applies_every_data_message_in_order() {
        let (mut receiver, client, telemetry) = local_receiver();
        let bundle = OscPacket::Bundle(OscBundle {
            timetag: OscTime {
                seconds: 0,
                fractional: 1,
            },
            content: vec![
                message(
                    "/data",
                    vec![OscType::Int(1), OscType::Int(1), OscType::Int(0)],
                ),
                message("/other", vec![OscType::Int(5)]),
                message(
                    "/data",
                    vec![OscType::Int(2), OscType::Int(2), OscType::Int(1)],
                ),
            ],
        });
        client.send(&encode(&bundle)).unwrap();

        assert_eq!(receiver.serve_once(), Received::Applied(2));
        assert_eq!(telemetry.remote(), Some(Reading::new(2, 2, true)));
    }

    #[test]
    fn test_deeply_nested_bundle_is_dropped() {
        let mut packet = message(
            "/data",
            vec![OscType::Int(1), OscType::Int(1), OscType::Int(1)],
        );
        for _ in 0..=MAX_BUNDLE_DEPTH {
            packet = OscPacket::Bundle(OscBundle {
                timetag: OscTime {
                    seconds: 0,
                    fractional: 1,
                },
                content: vec![packet],
            });
        }
        assert!(decode_datagram(&encode(&packet)).is_err());
    }

    #[test]
    fn test_bind_waits_for_port_to_be_released() {
        let blocker = UdpSocket::bind("127.0.0.1:0").unwrap();
        let addr = blocker.local_addr().unwrap();
        let release = thread::spawn(move || {
            thread::sleep(Duration::from_millis(60));
            drop(blocker);
        });

        let mut receiver = UdpReceiver::bind(
            addr,
            ReconnectPolicy::fixed(Duration::from_millis(10)),
            TelemetryStore::shared(),
        );
        release.join().unwrap();

        assert_eq!(receiver.local_addr(), Some(addr));
        assert_eq!(receiver.serve_once(), Received::Idle);
    }

    #[test]
    fn test_run_returns_when_told_to_stop() {
        let (mut receiver, client, telemetry) = local_receiver();
        client.send(&encode_reading(&Reading::new(4, 4, false)).unwrap()).unwrap();

        let mut checks = 0;
        receiver.run(|| {
            checks += 1;
            checks <= 1
        });

        assert_eq!(checks, 2);
        assert_eq!(telemetry.remote(), Some(Reading::new(4, 4, false)));
    }
}
