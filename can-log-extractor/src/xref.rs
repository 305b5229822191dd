//! ID cross-reference between a log and a message dictionary

use crate::dictionary::MessageDictionary;
use crate::store::FrameStore;
use crate::types::{CanId, ExtractorError, Result};
use serde::Serialize;
use std::collections::BTreeSet;

/// Partition of log IDs and dictionary IDs
///
/// `matched ∪ log_only` is the set of log IDs and `matched ∪ dictionary_only`
/// the set of dictionary IDs; the parts are disjoint. IDs are compared as
/// written, so `2B0` and `02B0` do not match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrossReferenceReport {
    /// IDs present in both the log and the dictionary
    pub matched: BTreeSet<CanId>,
    /// IDs only seen in the log
    pub log_only: BTreeSet<CanId>,
    /// IDs only known to the dictionary
    pub dictionary_only: BTreeSet<CanId>,
}

impl CrossReferenceReport {
    /// Build the report from the two ID sets
    pub fn from_sets(log_ids: &BTreeSet<CanId>, dict_ids: &BTreeSet<CanId>) -> Self {
        Self {
            matched: log_ids.intersection(dict_ids).cloned().collect(),
            log_only: log_ids.difference(dict_ids).cloned().collect(),
            dictionary_only: dict_ids.difference(log_ids).cloned().collect(),
        }
    }

    /// Share of log IDs the dictionary covers, in `0.0..=1.0`
    pub fn coverage(&self) -> f64 {
        let log_total = self.matched.len() + self.log_only.len();
        if log_total == 0 {
            return 0.0;
        }
        self.matched.len() as f64 / log_total as f64
    }
}

/// Compare the IDs of a store against a dictionary
///
/// Fails with [`ExtractorError::NoDictionary`] when no dictionary is loaded;
/// callers treat that as "comparison unavailable".
pub fn compare(
    store: &FrameStore,
    dictionary: Option<&dyn MessageDictionary>,
) -> Result<CrossReferenceReport> {
    let dictionary = dictionary.ok_or(ExtractorError::NoDictionary)?;

    let log_ids = store.unique_ids();
    let dict_ids = dictionary.frame_ids();
    let report = CrossReferenceReport::from_sets(&log_ids, &dict_ids);

    log::debug!(
        "Cross-reference: {} matched, {} log only, {} dictionary only",
        report.matched.len(),
        report.log_only.len(),
        report.dictionary_only.len()
    );
    Ok(report)
}
