//! Reading messages exchanged between the paired units.
//!
//! One message type: address [`DATA_ADDRESS`] with exactly three ordered
//! arguments `(y, z, pressure)`, pressure as 0/1. Axes go out as `i` when
//! they fit 32 bits and as `h` otherwise. On receive, any numeric or boolean
//! argument is accepted (floats are truncated) and a non-zero pressure means
//! contact.

use crate::core::types::Reading;
use crate::error::{Error, Result};
use rosc::{OscMessage, OscPacket, OscType, encoder};

/// OSC address carrying readings
pub const DATA_ADDRESS: &str = "/data";

/// 2^63, first float past the i64 range
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// Build the outbound message for a reading
pub fn reading_message(reading: &Reading) -> OscMessage {
    OscMessage {
        addr: DATA_ADDRESS.to_string(),
        args: vec![
            axis_arg(reading.y),
            axis_arg(reading.z),
            OscType::Int(reading.pressure_bit()),
        ],
    }
}

/// Encode a reading into one datagram payload
pub fn encode_reading(reading: &Reading) -> Result<Vec<u8>> {
    Ok(encoder::encode(&OscPacket::Message(reading_message(reading)))?)
}

fn axis_arg(value: i64) -> OscType {
    match i32::try_from(value) {
        Ok(v) => OscType::Int(v),
        Err(_) => OscType::Long(value),
    }
}

/// Decode a `/data` message into a reading
pub fn reading_from_message(msg: &OscMessage) -> Result<Reading> {
    if msg.addr != DATA_ADDRESS {
        return Err(Error::InvalidPacket(format!("unexpected address {:?}", msg.addr)));
    }
    let [y, z, pressure] = msg.args.as_slice() else {
        return Err(Error::InvalidPacket(format!(
            "expected 3 arguments, got {}",
            msg.args.len()
        )));
    };

    Ok(Reading {
        y: axis_value("y", y)?,
        z: axis_value("z", z)?,
        pressure: pressure_value(pressure)?,
    })
}

fn axis_value(name: &str, arg: &OscType) -> Result<i64> {
    let value = match *arg {
        OscType::Int(v) => Some(i64::from(v)),
        OscType::Long(v) => Some(v),
        OscType::Float(v) => truncate(f64::from(v)),
        OscType::Double(v) => truncate(v),
        OscType::Bool(b) => Some(i64::from(b)),
        _ => None,
    };
    value.ok_or_else(|| Error::InvalidPacket(format!("bad {} argument: {:?}", name, arg)))
}

fn pressure_value(arg: &OscType) -> Result<bool> {
    match *arg {
        OscType::Bool(b) => Ok(b),
        OscType::Int(v) => Ok(v != 0),
        OscType::Long(v) => Ok(v != 0),
        OscType::Float(v) if v.is_finite() => Ok(v.trunc() != 0.0),
        OscType::Double(v) if v.is_finite() => Ok(v.trunc() != 0.0),
        _ => Err(Error::InvalidPacket(format!("bad pressure argument: {:?}", arg))),
    }
}

fn truncate(v: f64) -> Option<i64> {
    let t = v.trunc();
    (v.is_finite() && (-I64_BOUND..I64_BOUND).contains(&t)).then_some(t as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(args: Vec<OscType>) -> OscMessage {
        OscMessage {
            addr: "/data".to_string(),
            args,
        }
    }

    #[test]
    fn test_encode_data_message_layout() {
        let bytes = encode_reading(&Reading::new(10, 5, false)).unwrap();

        let mut expected = Vec::new();
        expected.extend_from_slice(b"/data\0\0\0");
        expected.extend_from_slice(b",iii\0\0\0\0");
        expected.extend_from_slice(&[0, 0, 0, 10, 0, 0, 0, 5, 0, 0, 0, 0]);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_wide_axis_goes_out_as_long() {
        let msg = reading_message(&Reading::new(3_000_000_000, 5, true));
        assert_eq!(
            msg.args,
            vec![OscType::Long(3_000_000_000), OscType::Int(5), OscType::Int(1)]
        );

        let bytes = encode_reading(&Reading::new(3_000_000_000, 5, true)).unwrap();
        assert_eq!(&bytes[8..16], b",hii\0\0\0\0");
        assert_eq!(bytes.len(), 32);
    }

    #[test]
    fn test_inbound_ints_decode() {
        let msg = data(vec![OscType::Int(7), OscType::Int(2), OscType::Int(1)]);
        assert_eq!(reading_from_message(&msg).unwrap(), Reading::new(7, 2, true));
    }

    #[test]
    fn test_inbound_long_passes_through() {
        let msg = data(vec![
            OscType::Long(3_000_000_000),
            OscType::Int(5),
            OscType::Int(1),
        ]);
        assert_eq!(
            reading_from_message(&msg).unwrap(),
            Reading::new(3_000_000_000, 5, true)
        );
    }

    #[test]
    fn test_inbound_floats_and_bools_decode() {
        let msg = data(vec![
            OscType::Float(-3.7),
            OscType::Double(4.2),
            OscType::Bool(true),
        ]);
        assert_eq!(
            reading_from_message(&msg).unwrap(),
            Reading::new(-3, 4, true)
        );
    }

    #[test]
    fn test_inbound_wrong_shape_rejected() {
        let two_args = data(vec![OscType::Int(1), OscType::Int(2)]);
        assert!(reading_from_message(&two_args).is_err());

        let string_arg = data(vec![
            OscType::String("7".into()),
            OscType::Int(2),
            OscType::Int(1),
        ]);
        assert!(reading_from_message(&string_arg).is_err());

        let nan_arg = data(vec![OscType::Double(f64::NAN), OscType::Int(2), OscType::Int(1)]);
        assert!(reading_from_message(&nan_arg).is_err());

        let other_address = OscMessage {
            addr: "/motor".to_string(),
            args: vec![OscType::Int(7), OscType::Int(2), OscType::Int(1)],
        };
        assert!(reading_from_message(&other_address).is_err());
    }
}
