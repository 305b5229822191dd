//! Analysis session
//!
//! A session owns exactly one frame store and at most one message dictionary.
//! Loading either replaces it wholesale; every query is recomputed from the
//! current pair.

use crate::config::ExtractorConfig;
use crate::dictionary::{DatabaseStats, DbcDictionary, MessageDictionary};
use crate::dispatch::{self, DecodeOutcome};
use crate::export;
use crate::parser::FrameParser;
use crate::store::{self, FrameStore, Summary};
use crate::types::{DecodedRow, Result};
use crate::xref::{self, CrossReferenceReport};
use std::path::Path;

/// Explicit context for one log analysis
#[derive(Default)]
pub struct Session {
    parser: FrameParser,
    store: FrameStore,
    dictionary: Option<Box<dyn MessageDictionary>>,
    /// Known only for dictionaries loaded through `load_dictionary`
    dictionary_stats: Option<DatabaseStats>,
}

impl Session {
    /// Create a new session with default parser settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session with a custom parser configuration
    pub fn with_config(config: ExtractorConfig) -> Self {
        Self {
            parser: FrameParser::with_config(config),
            ..Self::default()
        }
    }

    /// Parse a log file into a fresh store
    ///
    /// On failure the previous store is discarded and the session is left
    /// with an empty one.
    pub fn load_log(&mut self, path: &Path) -> Result<&FrameStore> {
        self.store = FrameStore::default();
        self.store = self.parser.parse_file(path)?;
        Ok(&self.store)
    }

    /// Parse log text held in memory into a fresh store
    pub fn load_log_str(&mut self, text: &str) -> &FrameStore {
        self.store = self.parser.parse_str(text);
        &self.store
    }

    /// Load a DBC dictionary, replacing the current one
    ///
    /// On failure the session continues without a dictionary.
    pub fn load_dictionary(&mut self, path: &Path) -> Result<DatabaseStats> {
        self.clear_dictionary();
        match DbcDictionary::load(path) {
            Ok(dict) => {
                let stats = dict.stats();
                log::info!(
                    "Dictionary {:?} loaded: {} messages, {} signals",
                    path,
                    stats.num_messages,
                    stats.num_signals
                );
                self.dictionary = Some(Box::new(dict));
                self.dictionary_stats = Some(stats);
                Ok(stats)
            }
            Err(e) => {
                log::warn!("Continuing without a dictionary: {}", e);
                Err(e)
            }
        }
    }

    /// Install any dictionary implementation
    pub fn set_dictionary(&mut self, dictionary: Box<dyn MessageDictionary>) {
        self.dictionary = Some(dictionary);
        self.dictionary_stats = None;
    }

    pub fn clear_dictionary(&mut self) {
        self.dictionary = None;
        self.dictionary_stats = None;
    }

    /// Message and signal counts of the dictionary loaded from disk
    pub fn dictionary_stats(&self) -> Option<DatabaseStats> {
        self.dictionary_stats
    }

    pub fn has_dictionary(&self) -> bool {
        self.dictionary.is_some()
    }

    pub fn store(&self) -> &FrameStore {
        &self.store
    }

    fn dictionary(&self) -> Option<&dyn MessageDictionary> {
        self.dictionary.as_deref()
    }

    pub fn summary(&self) -> Result<Summary> {
        store::summarize(&self.store)
    }

    pub fn cross_reference(&self) -> Result<CrossReferenceReport> {
        xref::compare(&self.store, self.dictionary())
    }

    pub fn decode_all(&self) -> Vec<DecodedRow> {
        dispatch::decode_all(&self.store, self.dictionary())
    }

    pub fn decode_with_diagnostics(&self) -> DecodeOutcome {
        dispatch::decode_all_with_diagnostics(&self.store, self.dictionary())
    }

    pub fn export_csv(&self, path: &Path) -> Result<()> {
        export::export_csv(&self.store, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ExtractorError;

    const DBC: &str = r#"
VERSION ""

NS_ :

BS_:

BU_: ECU1

BO_ 688 EngineData: 8 ECU1
 SG_ EngineSpeed : 0|16@1+ (1,0) [0|8000] "rpm" ECU1
"#;

    #[test]
    fn test_queries_on_fresh_session() {
        let session = Session::new();
        assert!(matches!(session.summary(), Err(ExtractorError::EmptyStore)));
        assert!(matches!(session.cross_reference(), Err(ExtractorError::NoDictionary)));
        assert!(session.decode_all().is_empty());
    }

    #[test]
    fn test_failed_load_leaves_empty_store() {
        let mut session = Session::new();
        session.load_log_str("1.0 1 100 Rx d 1 01\n");
        assert_eq!(session.store().len(), 1);

        assert!(session.load_log(Path::new("/nonexistent/trace.asc")).is_err());
        assert!(session.store().is_empty());
    }

    #[test]
    fn test_failed_dictionary_load_clears_dictionary() {
        let mut session = Session::new();
        session.set_dictionary(Box::new(DbcDictionary::from_text(DBC).unwrap()));
        assert!(session.has_dictionary());

        let err = session
            .load_dictionary(Path::new("/nonexistent/defs.dbc"))
            .unwrap_err();
        assert!(matches!(err, ExtractorError::DictionaryLoad(_)));
        assert!(!session.has_dictionary());
        assert!(session.dictionary_stats().is_none());
    }

    #[test]
    fn test_load_dictionary_records_stats() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DBC.as_bytes()).unwrap();
        file.flush().unwrap();

        let mut session = Session::new();
        let stats = session.load_dictionary(file.path()).unwrap();
        assert_eq!(stats.num_messages, 1);
        assert_eq!(session.dictionary_stats(), Some(stats));

        session.clear_dictionary();
        assert!(session.dictionary_stats().is_none());
    }

    #[test]
    fn test_end_to_end_in_memory() {
        let mut session = Session::new();
        session.load_log_str(
            "100.0 1 2B0 Rx d 8 E8 03 00 00 00 00 00 00\n100.1 1 1FF Rx d 1 01\n",
        );
        session.set_dictionary(Box::new(DbcDictionary::from_text(DBC).unwrap()));

        let report = session.cross_reference().unwrap();
        assert_eq!(report.matched.len(), 1);
        assert_eq!(report.log_only.len(), 1);

        let rows = session.decode_all();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id.as_str(), "2B0");

        session.clear_dictionary();
        assert!(session.decode_all().is_empty());
    }
}
