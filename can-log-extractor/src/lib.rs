//! CAN Log Extractor Library
//!
//! Normalizes ASC-style text logs of CAN traffic into a uniform frame table,
//! computes summary statistics, and cross-references observed IDs against a
//! message dictionary to decide which frames to decode.
//!
//! # Architecture
//!
//! - [`grammar`]: ordered line grammars, one per vendor dialect
//! - [`parser`]: drives the grammars over a whole log and builds a [`FrameStore`]
//! - [`store`]: the frame table, query helpers and [`summarize`]
//! - [`xref`]: log IDs vs. dictionary IDs
//! - [`dispatch`]: decodes only frames whose ID both sides know
//! - [`dictionary`]: the [`MessageDictionary`] seam and its DBC implementation
//! - [`export`]: CSV adapter for the frame table
//! - [`session`]: one store plus at most one dictionary
//!
//! Malformed log lines and failed decodes never produce errors; only failing to
//! read a file or load a dictionary does.
//!
//! # Example Usage
//!
//! ```no_run
//! use can_log_extractor::Session;
//! use std::path::Path;
//!
//! let mut session = Session::new();
//! session.load_log(Path::new("trace.asc")).unwrap();
//! if let Err(e) = session.load_dictionary(Path::new("powertrain.dbc")) {
//!     eprintln!("Decoding disabled: {}", e);
//! }
//!
//! println!("{:?}", session.summary());
//! for row in session.decode_all() {
//!     println!("{} {} {} signals", row.timestamp, row.id, row.signals.len());
//! }
//! ```

pub mod config;
pub mod dictionary;
pub mod dispatch;
pub mod export;
pub mod grammar;
pub mod parser;
pub mod session;
pub mod store;
pub mod types;
pub mod xref;

// Re-export main types for convenience
pub use config::ExtractorConfig;
pub use dictionary::{DatabaseStats, DbcDictionary, MessageDictionary};
pub use dispatch::{decode_all, decode_all_with_diagnostics, DecodeCounts, DecodeOutcome};
pub use grammar::Dialect;
pub use parser::{FrameParser, ParseStats};
pub use session::Session;
pub use store::{summarize, FrameStore, Summary};
pub use types::{
    CanId, DecodedRow, DecodedSignal, Direction, ExtractorError, Frame, Result, SignalValue,
};
pub use xref::{compare, CrossReferenceReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_basics() {
        // Smoke test: a fresh session has nothing to summarize
        let session = Session::new();
        assert!(session.store().is_empty());
        assert!(!session.has_dictionary());
    }
}
