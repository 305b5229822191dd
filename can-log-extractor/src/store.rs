//! Frame store and summary statistics
//!
//! The store is built once per parse and is read-only afterwards. The query
//! helpers here produce the data series that charting front ends consume.

use crate::parser::ParseStats;
use crate::types::{CanId, ExtractorError, Frame, Result, FRAME_BYTES};
use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

/// Ordered sequence of normalized frames from one parse
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameStore {
    frames: Vec<Frame>,
    start_time: Option<NaiveDateTime>,
    stats: ParseStats,
}

/// Aggregate statistics over a frame store
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_frames: usize,
    pub unique_ids: usize,
    pub min_time: f64,
    pub max_time: f64,
}

impl FrameStore {
    /// Build a store from frames that did not come from a parse run
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            frames,
            start_time: None,
            stats: ParseStats::default(),
        }
    }

    pub(crate) fn from_parts(
        frames: Vec<Frame>,
        start_time: Option<NaiveDateTime>,
        stats: ParseStats,
    ) -> Self {
        Self {
            frames,
            start_time,
            stats,
        }
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Absolute start time from the log's `date` header, if present
    pub fn start_time(&self) -> Option<NaiveDateTime> {
        self.start_time
    }

    /// Line accounting of the parse that built this store
    pub fn stats(&self) -> &ParseStats {
        &self.stats
    }

    /// Set of distinct IDs seen in the log
    pub fn unique_ids(&self) -> BTreeSet<CanId> {
        self.frames.iter().map(|f| f.id.clone()).collect()
    }

    /// Frames with the given ID, in log order
    pub fn filter_by_id<'a>(&'a self, id: &'a CanId) -> impl Iterator<Item = &'a Frame> + 'a {
        self.frames.iter().filter(move |f| &f.id == id)
    }

    /// Frames with `start <= timestamp <= end`, in log order
    pub fn filter_by_time(&self, start: f64, end: f64) -> impl Iterator<Item = &Frame> + '_ {
        self.frames
            .iter()
            .filter(move |f| f.timestamp >= start && f.timestamp <= end)
    }

    /// Occurrence count per ID, most frequent first (ties by ID)
    pub fn id_frequency(&self) -> Vec<(CanId, usize)> {
        let mut counts: HashMap<&CanId, usize> = HashMap::new();
        for frame in &self.frames {
            *counts.entry(&frame.id).or_insert(0) += 1;
        }

        let mut sorted: Vec<(CanId, usize)> =
            counts.into_iter().map(|(id, n)| (id.clone(), n)).collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        sorted
    }

    /// `(timestamp, id)` pairs in log order
    pub fn timeline(&self) -> Vec<(f64, &CanId)> {
        self.frames.iter().map(|f| (f.timestamp, &f.id)).collect()
    }

    /// `(timestamp, value)` pairs of one byte position, or `None` if out of range
    pub fn byte_series(&self, index: usize) -> Option<Vec<(f64, u8)>> {
        if index >= FRAME_BYTES {
            return None;
        }
        Some(self.frames.iter().map(|f| (f.timestamp, f.bytes[index])).collect())
    }

    /// Wall-clock time of a frame, when the log carried a `date` header
    pub fn absolute_time(&self, frame: &Frame) -> Option<NaiveDateTime> {
        let start = self.start_time?;
        let offset = Duration::microseconds((frame.timestamp * 1_000_000.0).round() as i64);
        start.checked_add_signed(offset)
    }
}

/// Compute aggregate statistics over a store
pub fn summarize(store: &FrameStore) -> Result<Summary> {
    if store.is_empty() {
        return Err(ExtractorError::EmptyStore);
    }

    let (min_time, max_time) = store
        .frames
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), f| {
            (lo.min(f.timestamp), hi.max(f.timestamp))
        });

    Ok(Summary {
        total_frames: store.len(),
        unique_ids: store.unique_ids().len(),
        min_time,
        max_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn frame(ts: f64, id: &str, data: &[u8]) -> Frame {
        Frame::new(ts, CanId::parse(id).unwrap(), data.len() as u8, data)
    }

    fn sample_store() -> FrameStore {
        FrameStore::new(vec![
            frame(2.0, "2B0", &[1, 2]),
            frame(1.0, "2B0", &[3, 4]),
            frame(3.5, "1FF", &[5]),
        ])
    }

    #[test]
    fn test_summary_of_empty_store() {
        let err = summarize(&FrameStore::default()).unwrap_err();
        assert!(matches!(err, ExtractorError::EmptyStore));
    }

    #[test]
    fn test_summary_counts_and_unsorted_times() {
        let summary = summarize(&sample_store()).unwrap();
        assert_eq!(summary.total_frames, 3);
        assert_eq!(summary.unique_ids, 2);
        assert_eq!(summary.min_time, 1.0);
        assert_eq!(summary.max_time, 3.5);
    }

    #[test]
    fn test_filters() {
        let store = sample_store();
        let id = CanId::parse("2B0").unwrap();
        assert_eq!(store.filter_by_id(&id).count(), 2);

        let window: Vec<f64> = store.filter_by_time(1.0, 2.0).map(|f| f.timestamp).collect();
        assert_eq!(window, vec![2.0, 1.0]);
    }

    #[test]
    fn test_id_frequency_order() {
        let freq = sample_store().id_frequency();
        assert_eq!(freq[0], (CanId::parse("2B0").unwrap(), 2));
        assert_eq!(freq[1], (CanId::parse("1FF").unwrap(), 1));
    }

    #[test]
    fn test_byte_series_and_timeline() {
        let store = sample_store();
        assert_eq!(store.byte_series(1), Some(vec![(2.0, 2), (1.0, 4), (3.5, 0)]));
        assert_eq!(store.byte_series(8), None);
        assert_eq!(store.timeline().len(), 3);
        assert_eq!(store.timeline()[2].1.as_str(), "1FF");
    }

    #[test]
    fn test_absolute_time() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let store = FrameStore::from_parts(
            vec![frame(1.5, "100", &[])],
            Some(start),
            ParseStats::default(),
        );
        let expected = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_milli_opt(0, 0, 1, 500)
            .unwrap();
        assert_eq!(store.absolute_time(&store.frames()[0]), Some(expected));
        assert_eq!(sample_store().absolute_time(&sample_store().frames()[0]), None);
    }
}
