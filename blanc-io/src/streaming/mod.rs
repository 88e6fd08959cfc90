//! UDP relay between the paired units (OSC over UDP, via `rosc`)

pub mod messages;
pub mod udp_receiver;
pub mod udp_sender;

pub use messages::{DATA_ADDRESS, encode_reading, reading_from_message, reading_message};
pub use udp_receiver::{Received, UdpReceiver, decode_datagram};
pub use udp_sender::UdpSender;
