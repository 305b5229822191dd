//! Signal extraction
//!
//! Turns an 8-byte payload into physical signal values using a message
//! definition. Handles bit extraction, endianness, sign extension,
//! multiplexing and factor/offset scaling.

use crate::dictionary::database::{ByteOrder, MessageDefinition, SignalDefinition, ValueType};
use crate::types::{DecodedSignal, SignalValue};

/// Signal decoder - extracts signals from frame payloads
pub struct SignalDecoder;

impl SignalDecoder {
    /// Decode a payload against a message definition
    ///
    /// # Returns
    /// * `Some(signals)` if at least one signal decoded
    /// * `None` if the payload is shorter than the message layout or nothing decoded
    pub fn decode_message(data: &[u8], message_def: &MessageDefinition) -> Option<Vec<DecodedSignal>> {
        if message_def.size > data.len() {
            log::debug!(
                "Message {} needs {} bytes, payload has {}",
                message_def.name,
                message_def.size,
                data.len()
            );
            return None;
        }

        // For multiplexed messages, first extract the multiplexer signal value
        let multiplexer_value = message_def
            .multiplexer_signal
            .as_ref()
            .and_then(|name| message_def.signals.iter().find(|s| s.name == *name))
            .and_then(|mux_signal| Self::extract_signal_value(data, mux_signal))
            .map(|value| value as u64);

        let mut decoded_signals = Vec::new();
        for signal in &message_def.signals {
            if let Some(ref mux_info) = signal.multiplexer_info {
                match multiplexer_value {
                    Some(current) if mux_info.multiplexer_values.contains(&current) => {}
                    _ => continue,
                }
            }

            if let Some(decoded) = Self::decode_signal(data, signal) {
                decoded_signals.push(decoded);
            }
        }

        if decoded_signals.is_empty() {
            return None;
        }
        Some(decoded_signals)
    }

    /// Decode a single signal from frame data
    fn decode_signal(data: &[u8], signal: &SignalDefinition) -> Option<DecodedSignal> {
        let raw_value = Self::extract_signal_value(data, signal)?;
        let physical_value = signal.offset + signal.factor * (raw_value as f64);

        let value = if signal.factor == 1.0 && signal.offset == 0.0 && signal.length == 1 {
            SignalValue::Boolean(raw_value != 0)
        } else if signal.factor != 1.0 || signal.offset != 0.0 {
            SignalValue::Float(physical_value)
        } else {
            SignalValue::Integer(raw_value)
        };

        Some(DecodedSignal {
            name: signal.name.clone(),
            value,
            unit: signal.unit.clone(),
            raw_value,
        })
    }

    /// Extract the raw (sign-extended) value of a signal
    fn extract_signal_value(data: &[u8], signal: &SignalDefinition) -> Option<i64> {
        let start_bit = signal.start_bit as usize;
        let length = signal.length as usize;
        if length == 0 || length > 64 {
            return None;
        }

        let raw_value = match signal.byte_order {
            ByteOrder::LittleEndian => Self::extract_little_endian(data, start_bit, length),
            ByteOrder::BigEndian => Self::extract_big_endian(data, start_bit, length),
        };
        let Some(raw_value) = raw_value else {
            log::debug!(
                "Signal '{}' does not fit in a {} byte payload",
                signal.name,
                data.len()
            );
            return None;
        };

        Some(match signal.value_type {
            ValueType::Unsigned => raw_value as i64,
            ValueType::Signed => Self::sign_extend(raw_value, length),
        })
    }

    /// Intel byte order: start bit is the LSB, bits grow towards higher bytes
    fn extract_little_endian(data: &[u8], start_bit: usize, length: usize) -> Option<u64> {
        if (start_bit + length).div_ceil(8) > data.len() {
            return None;
        }

        let mut result: u64 = 0;
        for i in 0..length {
            let bit_pos = start_bit + i;
            let bit_value = (data[bit_pos / 8] >> (bit_pos % 8)) & 0x01;
            result |= (bit_value as u64) << i;
        }
        Some(result)
    }

    /// Motorola byte order: start bit is the MSB in DBC sawtooth numbering
    ///
    /// Within a byte the walk goes from bit 7 down to bit 0, then continues at
    /// bit 7 of the next byte.
    fn extract_big_endian(data: &[u8], start_bit: usize, length: usize) -> Option<u64> {
        let mut result: u64 = 0;
        let mut bit_pos = start_bit;

        for i in 0..length {
            let byte = *data.get(bit_pos / 8)?;
            let bit_value = (byte >> (bit_pos % 8)) & 0x01;
            result = (result << 1) | bit_value as u64;

            if i + 1 < length {
                bit_pos = if bit_pos % 8 == 0 { bit_pos + 15 } else { bit_pos - 1 };
            }
        }
        Some(result)
    }

    /// Sign-extend a value from N bits to 64 bits
    fn sign_extend(value: u64, bit_length: usize) -> i64 {
        if bit_length >= 64 {
            return value as i64;
        }

        let sign_bit = 1u64 << (bit_length - 1);
        if (value & sign_bit) != 0 {
            let mask = !0u64 << bit_length;
            (value | mask) as i64
        } else {
            value as i64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::database::MultiplexerInfo;

    fn signal(name: &str, start_bit: u16, length: u16, byte_order: ByteOrder) -> SignalDefinition {
        SignalDefinition {
            name: name.to_string(),
            start_bit,
            length,
            byte_order,
            value_type: ValueType::Unsigned,
            factor: 1.0,
            offset: 0.0,
            min: 0.0,
            max: 0.0,
            unit: None,
            multiplexer_info: None,
        }
    }

    fn message(signals: Vec<SignalDefinition>, mux: Option<&str>) -> MessageDefinition {
        MessageDefinition {
            id: 0x200,
            name: "Test".to_string(),
            size: 8,
            sender: None,
            signals,
            is_multiplexed: mux.is_some(),
            multiplexer_signal: mux.map(str::to_string),
        }
    }

    #[test]
    fn test_extract_little_endian_simple() {
        let data = [0xAB, 0xCD, 0xEF, 0x12];
        assert_eq!(SignalDecoder::extract_little_endian(&data, 0, 8), Some(0xAB));
    }

    #[test]
    fn test_extract_little_endian_cross_byte() {
        let data = [0xAB, 0xCD, 0xEF, 0x12];
        assert_eq!(SignalDecoder::extract_little_endian(&data, 0, 16), Some(0xCDAB));
        assert_eq!(SignalDecoder::extract_little_endian(&data, 24, 16), None);
    }

    #[test]
    fn test_extract_big_endian() {
        let data = [0xAB, 0xCD, 0xEF, 0x12];
        assert_eq!(SignalDecoder::extract_big_endian(&data, 7, 8), Some(0xAB));
        assert_eq!(SignalDecoder::extract_big_endian(&data, 7, 16), Some(0xABCD));
        // Upper nibble of byte 1
        assert_eq!(SignalDecoder::extract_big_endian(&data, 15, 4), Some(0xC));
        assert_eq!(SignalDecoder::extract_big_endian(&data, 31, 16), None);
    }

    #[test]
    fn test_sign_extend() {
        assert_eq!(SignalDecoder::sign_extend(0x7F, 8), 127);
        assert_eq!(SignalDecoder::sign_extend(0xFF, 8), -1);
        assert_eq!(SignalDecoder::sign_extend(0x8000, 16), -32768);
    }

    #[test]
    fn test_scaled_and_boolean_signals() {
        let mut temp = signal("Temp", 8, 8, ByteOrder::LittleEndian);
        temp.offset = -40.0;
        let flag = signal("Flag", 0, 1, ByteOrder::LittleEndian);
        let def = message(vec![temp, flag], None);

        let decoded = SignalDecoder::decode_message(&[0x01, 0x5A, 0, 0, 0, 0, 0, 0], &def).unwrap();
        assert_eq!(decoded[0].value, SignalValue::Float(50.0));
        assert_eq!(decoded[0].raw_value, 90);
        assert_eq!(decoded[1].value, SignalValue::Boolean(true));
    }

    #[test]
    fn test_multiplexed_signals() {
        let mode = signal("Mode", 0, 8, ByteOrder::LittleEndian);
        let mut a = signal("SignalA", 8, 8, ByteOrder::LittleEndian);
        a.multiplexer_info = Some(MultiplexerInfo {
            multiplexer_signal: "Mode".to_string(),
            multiplexer_values: vec![0],
        });
        let mut b = signal("SignalB", 8, 8, ByteOrder::LittleEndian);
        b.multiplexer_info = Some(MultiplexerInfo {
            multiplexer_signal: "Mode".to_string(),
            multiplexer_values: vec![1],
        });
        let def = message(vec![mode, a, b], Some("Mode"));

        let decoded = SignalDecoder::decode_message(&[1, 7, 0, 0, 0, 0, 0, 0], &def).unwrap();
        let names: Vec<&str> = decoded.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Mode", "SignalB"]);
        assert_eq!(decoded[1].value, SignalValue::Integer(7));
    }

    #[test]
    fn test_payload_shorter_than_message() {
        let mut def = message(vec![signal("X", 0, 8, ByteOrder::LittleEndian)], None);
        def.size = 12;
        assert!(SignalDecoder::decode_message(&[0; 8], &def).is_none());
    }
}
