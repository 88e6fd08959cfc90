//! Parser for the microcontroller's text reply.
//!
//! One reply per trigger, in the form:
//!
//! ```text
//! y: 10.0, z: 5.0, pressure: 0
//! ```
//!
//! Fields are separated by `", "`, key and value by `": "`, in any order.
//! `y` and `z` are decimal numbers truncated toward zero; `pressure` is set
//! only by the exact token `1`. A line is accepted whole or rejected whole.

use crate::core::types::Reading;

const FIELD_SEPARATOR: &str = ", ";
const KEY_SEPARATOR: &str = ": ";

/// 2^63, first float past the i64 range
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// Why a sensor line was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("empty line")]
    Empty,

    #[error("field without key separator: {0:?}")]
    MissingSeparator(String),

    #[error("unknown key: {0:?}")]
    UnknownKey(String),

    #[error("invalid number for {key}: {value:?}")]
    InvalidNumber { key: &'static str, value: String },

    #[error("{key} out of range: {value:?}")]
    OutOfRange { key: &'static str, value: String },

    #[error("missing field: {0}")]
    MissingField(&'static str),
}

/// Parse one reply line into a [`Reading`].
pub fn parse_line(line: &str) -> Result<Reading, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut y = None;
    let mut z = None;
    let mut pressure = None;

    for field in line.split(FIELD_SEPARATOR) {
        let (key, value) = field
            .split_once(KEY_SEPARATOR)
            .filter(|(_, value)| !value.contains(KEY_SEPARATOR))
            .ok_or_else(|| ParseError::MissingSeparator(field.to_string()))?;

        match key {
            "y" => y = Some(parse_axis("y", value)?),
            "z" => z = Some(parse_axis("z", value)?),
            "pressure" => pressure = Some(value == "1"),
            other => return Err(ParseError::UnknownKey(other.to_string())),
        }
    }

    Ok(Reading {
        y: y.ok_or(ParseError::MissingField("y"))?,
        z: z.ok_or(ParseError::MissingField("z"))?,
        pressure: pressure.ok_or(ParseError::MissingField("pressure"))?,
    })
}

/// Decimal number truncated toward zero; anything a 64-bit OSC argument can carry
fn parse_axis(key: &'static str, value: &str) -> Result<i64, ParseError> {
    let number: f64 = value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| ParseError::InvalidNumber {
            key,
            value: value.to_string(),
        })?;

    let truncated = number.trunc();
    if !(-I64_BOUND..I64_BOUND).contains(&truncated) {
        return Err(ParseError::OutOfRange {
            key,
            value: value.to_string(),
        });
    }
    Ok(truncated as i64)
}
