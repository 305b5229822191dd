//! Core types for the CAN log extractor library
//!
//! This module defines the normalized frame record produced by the parser, the
//! canonical identifier type shared by the frame store and the message
//! dictionary, and the decoded output of the dispatcher.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Result type for extractor operations
pub type Result<T> = std::result::Result<T, ExtractorError>;

/// Number of data bytes carried by every normalized frame
pub const FRAME_BYTES: usize = 8;

/// Errors surfaced by the extractor
///
/// Only file-level and dictionary-level failures are errors. Per-line and
/// per-frame anomalies are absorbed where they happen.
#[derive(Debug, thiserror::Error)]
pub enum ExtractorError {
    #[error("Failed to load log file {path:?}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to load message dictionary: {0}")]
    DictionaryLoad(String),

    #[error("Frame store is empty")]
    EmptyStore,

    #[error("No message dictionary loaded")]
    NoDictionary,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid CSV row {row}: {reason}")]
    Import { row: usize, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Canonical CAN identifier: a non-empty uppercase hexadecimal string
///
/// Log IDs keep their digits as written (leading zeros included), dictionary
/// IDs are rendered without padding. `2B0` and `02B0` are different IDs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CanId(String);

impl CanId {
    /// Build an ID from a bare hex token, uppercasing it
    ///
    /// Returns `None` for empty tokens or tokens with non-hex characters.
    pub fn parse(token: &str) -> Option<Self> {
        if token.is_empty() || !token.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        Some(Self(token.to_ascii_uppercase()))
    }

    /// Render a numeric dictionary ID
    pub fn from_raw(raw: u32) -> Self {
        Self(format!("{:X}", raw))
    }

    /// Numeric value of the ID, if it fits in 32 bits
    pub fn to_raw(&self) -> Option<u32> {
        u32::from_str_radix(&self.0, 16).ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl TryFrom<String> for CanId {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        CanId::parse(&value).ok_or_else(|| format!("invalid CAN ID: {:?}", value))
    }
}

impl From<CanId> for String {
    fn from(id: CanId) -> Self {
        id.0
    }
}

/// Transmission direction token of a log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Tx,
    Rx,
}

impl Direction {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "Tx" => Some(Direction::Tx),
            "Rx" => Some(Direction::Rx),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Tx => write!(f, "Tx"),
            Direction::Rx => write!(f, "Rx"),
        }
    }
}

/// One normalized bus message observation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    /// Seconds as written in the log (no monotonicity assumed)
    pub timestamp: f64,
    /// Message identifier
    pub id: CanId,
    /// Declared data length code, not checked against the payload
    pub dlc: u8,
    /// Payload, zero padded to eight bytes
    pub bytes: [u8; FRAME_BYTES],
    /// Channel number, for dialects that carry one
    pub channel: Option<u8>,
    /// Direction token, for dialects that carry one
    pub direction: Option<Direction>,
}

impl Frame {
    /// Create a frame from a byte run, padding with zeros or truncating to 8
    pub fn new(timestamp: f64, id: CanId, dlc: u8, data: &[u8]) -> Self {
        let mut bytes = [0u8; FRAME_BYTES];
        let n = data.len().min(FRAME_BYTES);
        bytes[..n].copy_from_slice(&data[..n]);
        Self {
            timestamp,
            id,
            dlc,
            bytes,
            channel: None,
            direction: None,
        }
    }

    pub fn with_channel(mut self, channel: Option<u8>) -> Self {
        self.channel = channel;
        self
    }

    pub fn with_direction(mut self, direction: Option<Direction>) -> Self {
        self.direction = direction;
        self
    }
}

/// A decoded signal with its value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedSignal {
    /// Signal name from the dictionary
    pub name: String,
    /// Physical value
    pub value: SignalValue,
    /// Engineering unit (e.g., "km/h", "°C", "V")
    pub unit: Option<String>,
    /// Raw value before scaling
    pub raw_value: i64,
}

/// Signal value types produced by decoding
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SignalValue {
    /// Signed integer value
    Integer(i64),
    /// Floating-point value (after scaling/offset)
    Float(f64),
    /// Single-bit value
    Boolean(bool),
}

impl fmt::Display for SignalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalValue::Integer(v) => write!(f, "{}", v),
            SignalValue::Float(v) => write!(f, "{:.3}", v),
            SignalValue::Boolean(v) => write!(f, "{}", if *v { "true" } else { "false" }),
        }
    }
}

impl SignalValue {
    /// Convert signal value to f64 (for plotting series)
    pub fn as_f64(&self) -> f64 {
        match self {
            SignalValue::Integer(v) => *v as f64,
            SignalValue::Float(v) => *v,
            SignalValue::Boolean(v) => if *v { 1.0 } else { 0.0 },
        }
    }
}

/// One row of decoder output: frame time and ID plus its signals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedRow {
    pub timestamp: f64,
    pub id: CanId,
    pub signals: Vec<DecodedSignal>,
}

impl DecodedRow {
    /// Look up a decoded signal by name
    pub fn signal(&self, name: &str) -> Option<&SignalValue> {
        self.signals.iter().find(|s| s.name == name).map(|s| &s.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_id_uppercases_and_keeps_zeros() {
        assert_eq!(CanId::parse("2b0").unwrap().as_str(), "2B0");
        assert_eq!(CanId::parse("02B0").unwrap().as_str(), "02B0");
        assert_ne!(CanId::parse("02B0"), CanId::parse("2B0"));
    }

    #[test]
    fn test_can_id_rejects_non_hex() {
        assert!(CanId::parse("").is_none());
        assert!(CanId::parse("12G").is_none());
        assert!(CanId::parse("0x12").is_none());
    }

    #[test]
    fn test_can_id_raw_conversions() {
        assert_eq!(CanId::from_raw(0x2B0).as_str(), "2B0");
        assert_eq!(CanId::from_raw(0x18FEF100).as_str(), "18FEF100");
        assert_eq!(CanId::parse("02B0").unwrap().to_raw(), Some(0x2B0));
    }

    #[test]
    fn test_frame_pads_and_truncates() {
        let id = CanId::parse("1FF").unwrap();
        let short = Frame::new(1.0, id.clone(), 3, &[0x0A, 0x0B, 0x0C]);
        assert_eq!(short.bytes, [0x0A, 0x0B, 0x0C, 0, 0, 0, 0, 0]);
        assert_eq!(short.dlc, 3);

        let long = Frame::new(1.0, id, 8, &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        assert_eq!(long.bytes, [1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_signal_value_display() {
        assert_eq!(format!("{}", SignalValue::Integer(42)), "42");
        assert_eq!(format!("{}", SignalValue::Float(3.14159)), "3.142");
        assert_eq!(format!("{}", SignalValue::Boolean(true)), "true");
        assert_eq!(SignalValue::Boolean(true).as_f64(), 1.0);
    }
}
