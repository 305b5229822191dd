//! Decode dispatch
//!
//! Walks the store in log order and hands frames to the dictionary's decoder,
//! but only for IDs the cross-reference found on both sides. Decode failures
//! are routine (dictionaries rarely cover every ID on a bus) and are skipped
//! without an error.

use crate::dictionary::MessageDictionary;
use crate::store::FrameStore;
use crate::types::{CanId, DecodedRow};
use crate::xref;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Per-ID decode accounting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DecodeCounts {
    pub attempted: usize,
    pub failed: usize,
}

/// Decoded rows plus per-ID diagnostics
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DecodeOutcome {
    pub rows: Vec<DecodedRow>,
    /// Frames never offered to the decoder because their ID is not matched
    pub skipped: usize,
    pub per_id: BTreeMap<CanId, DecodeCounts>,
}

impl DecodeOutcome {
    /// IDs for which every decode attempt failed
    pub fn never_decoded(&self) -> Vec<&CanId> {
        self.per_id
            .iter()
            .filter(|(_, c)| c.attempted > 0 && c.failed == c.attempted)
            .map(|(id, _)| id)
            .collect()
    }
}

/// Decode every eligible frame, silently skipping failures
///
/// An empty result means "nothing decodable", not an error.
pub fn decode_all(store: &FrameStore, dictionary: Option<&dyn MessageDictionary>) -> Vec<DecodedRow> {
    decode_all_with_diagnostics(store, dictionary).rows
}

/// Same as [`decode_all`], also reporting what was attempted and what failed
pub fn decode_all_with_diagnostics(
    store: &FrameStore,
    dictionary: Option<&dyn MessageDictionary>,
) -> DecodeOutcome {
    let mut outcome = DecodeOutcome::default();

    let Some(dictionary) = dictionary else {
        log::debug!("No dictionary loaded, nothing to decode");
        return outcome;
    };

    // An empty match set filters nothing
    let allowed: BTreeSet<CanId> = match xref::compare(store, Some(dictionary)) {
        Ok(report) => report.matched,
        Err(_) => BTreeSet::new(),
    };
    if allowed.is_empty() {
        log::debug!("No matched IDs, offering every frame to the decoder");
    }

    for frame in store.frames() {
        if !allowed.is_empty() && !allowed.contains(&frame.id) {
            outcome.skipped += 1;
            continue;
        }

        let counts = outcome.per_id.entry(frame.id.clone()).or_default();
        counts.attempted += 1;

        match dictionary.decode(&frame.id, &frame.bytes) {
            Some(signals) if !signals.is_empty() => outcome.rows.push(DecodedRow {
                timestamp: frame.timestamp,
                id: frame.id.clone(),
                signals,
            }),
            _ => counts.failed += 1,
        }
    }

    log::info!(
        "Decoded {} of {} frames ({} skipped as unmatched)",
        outcome.rows.len(),
        store.len(),
        outcome.skipped
    );
    outcome
}
