//! DBC-backed message dictionary
//!
//! Parses Vector DBC files with the `can-dbc` crate and converts them into the
//! internal message definitions.

use crate::dictionary::database::{
    ByteOrder, DatabaseStats, MessageDefinition, MultiplexerInfo, SignalDatabase,
    SignalDefinition, ValueType,
};
use crate::dictionary::signal_decoder::SignalDecoder;
use crate::dictionary::MessageDictionary;
use crate::types::{CanId, DecodedSignal, ExtractorError, Result, FRAME_BYTES};
use std::collections::BTreeSet;
use std::path::Path;

/// DBC stores extended IDs with bit 31 set
const EXTENDED_ID_MASK: u32 = 0x1FFF_FFFF;

/// A message dictionary loaded from one DBC file
#[derive(Debug)]
pub struct DbcDictionary {
    db: SignalDatabase,
}

impl DbcDictionary {
    /// Load a DBC file
    ///
    /// Fails with [`ExtractorError::DictionaryLoad`] when the file cannot be read
    /// or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let messages = parse_dbc_file(path)?;
        Ok(Self::from_messages(messages))
    }

    /// Parse DBC text already held in memory
    pub fn from_text(content: &str) -> Result<Self> {
        let messages = parse_dbc_str(content, "<memory>")?;
        Ok(Self::from_messages(messages))
    }

    fn from_messages(messages: Vec<MessageDefinition>) -> Self {
        let mut db = SignalDatabase::new();
        for message in messages {
            db.add_message(message);
        }
        Self { db }
    }

    pub fn database(&self) -> &SignalDatabase {
        &self.db
    }

    pub fn stats(&self) -> DatabaseStats {
        self.db.stats()
    }
}

impl MessageDictionary for DbcDictionary {
    fn frame_ids(&self) -> BTreeSet<CanId> {
        self.db
            .get_all_can_ids()
            .into_iter()
            .map(CanId::from_raw)
            .collect()
    }

    fn decode(&self, id: &CanId, bytes: &[u8; FRAME_BYTES]) -> Option<Vec<DecodedSignal>> {
        let message_def = self.db.get_message(id.to_raw()?)?;
        log::trace!("Decoding message: {} (ID {})", message_def.name, id);
        SignalDecoder::decode_message(bytes, message_def)
    }
}

/// Parse a DBC file and return message definitions
pub fn parse_dbc_file(path: &Path) -> Result<Vec<MessageDefinition>> {
    log::info!("Parsing DBC file: {:?}", path);

    let bytes = std::fs::read(path).map_err(|e| {
        ExtractorError::DictionaryLoad(format!("Failed to read file {:?}: {}", path, e))
    })?;

    // Try UTF-8 first, then fall back to Latin-1 (compatible with Windows-1252)
    let dbc_content = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            log::warn!("DBC file is not UTF-8, trying Latin-1 encoding");
            err.into_bytes().iter().map(|&b| b as char).collect()
        }
    };

    let source = path.display().to_string();
    let messages = parse_dbc_str(&dbc_content, &source)?;

    log::info!("Parsed {} messages from {:?}", messages.len(), path);
    Ok(messages)
}

fn parse_dbc_str(content: &str, source: &str) -> Result<Vec<MessageDefinition>> {
    let dbc = can_dbc::DBC::from_slice(content.as_bytes()).map_err(|e| {
        ExtractorError::DictionaryLoad(format!("Failed to parse DBC file {}: {:?}", source, e))
    })?;

    dbc.messages().iter().map(convert_message).collect()
}

/// Convert a can-dbc message to our MessageDefinition
fn convert_message(dbc_msg: &can_dbc::Message) -> Result<MessageDefinition> {
    let mut is_multiplexed = false;
    let mut multiplexer_signal_name: Option<String> = None;

    // First pass: identify multiplexer signal
    for dbc_sig in dbc_msg.signals() {
        match dbc_sig.multiplexer_indicator() {
            can_dbc::MultiplexIndicator::Multiplexor => {
                is_multiplexed = true;
                multiplexer_signal_name = Some(dbc_sig.name().to_string());
                break;
            }
            can_dbc::MultiplexIndicator::MultiplexedSignal(_) => is_multiplexed = true,
            _ => {}
        }
    }

    // Second pass: convert all signals
    let signals = dbc_msg
        .signals()
        .iter()
        .map(|sig| convert_signal(sig, multiplexer_signal_name.as_deref()))
        .collect::<Result<Vec<_>>>()?;

    Ok(MessageDefinition {
        id: dbc_msg.message_id().0 & EXTENDED_ID_MASK,
        name: dbc_msg.message_name().to_string(),
        size: *dbc_msg.message_size() as usize,
        sender: match dbc_msg.transmitter() {
            can_dbc::Transmitter::NodeName(name) => Some(name.to_string()),
            _ => None,
        },
        signals,
        is_multiplexed,
        multiplexer_signal: multiplexer_signal_name,
    })
}

/// Convert a can-dbc signal to our SignalDefinition
fn convert_signal(
    dbc_sig: &can_dbc::Signal,
    multiplexer_signal_name: Option<&str>,
) -> Result<SignalDefinition> {
    let byte_order = match *dbc_sig.byte_order() {
        can_dbc::ByteOrder::LittleEndian => ByteOrder::LittleEndian,
        can_dbc::ByteOrder::BigEndian => ByteOrder::BigEndian,
    };

    let value_type = match *dbc_sig.value_type() {
        can_dbc::ValueType::Signed => ValueType::Signed,
        can_dbc::ValueType::Unsigned => ValueType::Unsigned,
    };

    let multiplexer_info = match *dbc_sig.multiplexer_indicator() {
        can_dbc::MultiplexIndicator::MultiplexedSignal(switch_value) => Some(MultiplexerInfo {
            multiplexer_signal: multiplexer_signal_name
                .ok_or_else(|| {
                    ExtractorError::DictionaryLoad(format!(
                        "Multiplexed signal '{}' but no multiplexer found",
                        dbc_sig.name()
                    ))
                })?
                .to_string(),
            multiplexer_values: vec![switch_value],
        }),
        _ => None,
    };

    Ok(SignalDefinition {
        name: dbc_sig.name().to_string(),
        start_bit: *dbc_sig.start_bit() as u16,
        length: *dbc_sig.signal_size() as u16,
        byte_order,
        value_type,
        factor: *dbc_sig.factor(),
        offset: *dbc_sig.offset(),
        min: *dbc_sig.min(),
        max: *dbc_sig.max(),
        unit: if dbc_sig.unit().is_empty() {
            None
        } else {
            Some(dbc_sig.unit().to_string())
        },
        multiplexer_info,
    })
}
