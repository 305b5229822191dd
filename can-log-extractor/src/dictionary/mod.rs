//! Message dictionary seam
//!
//! The extractor only needs two things from a dictionary: the set of frame IDs
//! it knows and a way to turn a frame's bytes into named signals. The DBC-backed
//! implementation lives in [`dbc`]; the bit-level arithmetic in
//! [`signal_decoder`].

use crate::types::{CanId, DecodedSignal, FRAME_BYTES};
use std::collections::BTreeSet;

pub mod database;
pub mod dbc;
pub mod signal_decoder;

pub use database::{
    ByteOrder, DatabaseStats, MessageDefinition, MultiplexerInfo, SignalDatabase,
    SignalDefinition, ValueType,
};
pub use dbc::DbcDictionary;

/// A catalog of known messages able to decode frame payloads
pub trait MessageDictionary {
    /// IDs known to the dictionary, rendered as canonical hex
    fn frame_ids(&self) -> BTreeSet<CanId>;

    /// Decode one frame payload
    ///
    /// Returns `None` on any mismatch (unknown ID, payload too short for the
    /// message layout). Must not panic.
    fn decode(&self, id: &CanId, bytes: &[u8; FRAME_BYTES]) -> Option<Vec<DecodedSignal>>;
}
