//! Multi-dialect log parser
//!
//! Drives the grammar set over a whole text log and builds a [`FrameStore`].
//! Lines that match no grammar are dropped; only failing to read the file at
//! all is reported as an error.

use crate::config::ExtractorConfig;
use crate::grammar::{self, Dialect};
use crate::store::FrameStore;
use crate::types::{ExtractorError, Frame, Result};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

/// Absolute-time formats seen in ASC `date` headers
const DATE_FORMATS: &[&str] = &["%a %b %d %I:%M:%S%.f %p %Y", "%a %b %d %H:%M:%S%.f %Y"];

/// Line accounting for one parse run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseStats {
    /// Total lines read
    pub lines: usize,
    /// Header, comment and section lines skipped before matching
    pub housekeeping: usize,
    /// Lines no grammar accepted
    pub unmatched: usize,
    /// Frames dropped by the channel filter
    pub filtered: usize,
    /// Accepted frames per dialect
    pub by_dialect: BTreeMap<Dialect, usize>,
}

impl ParseStats {
    /// Number of frames accepted across all dialects
    pub fn matched(&self) -> usize {
        self.by_dialect.values().sum()
    }
}

/// Frame parser for ASC-style text logs
#[derive(Debug, Clone, Default)]
pub struct FrameParser {
    config: ExtractorConfig,
}

impl FrameParser {
    /// Create a parser with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser with a custom configuration
    pub fn with_config(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Read and parse a log file
    ///
    /// Non UTF-8 content is decoded lossily so a stray byte costs at most one
    /// line, never the whole file.
    pub fn parse_file(&self, path: &Path) -> Result<FrameStore> {
        log::info!("Parsing log file: {:?}", path);

        let bytes = std::fs::read(path).map_err(|source| ExtractorError::Load {
            path: path.to_path_buf(),
            source,
        })?;
        let text = String::from_utf8_lossy(&bytes);
        let store = self.parse_str(&text);

        log::info!(
            "Parsed {} frames from {:?} ({} lines, {} unmatched)",
            store.len(),
            path,
            store.stats().lines,
            store.stats().unmatched
        );
        Ok(store)
    }

    /// Parse a log from any reader
    pub fn parse_reader<R: Read>(&self, mut reader: R) -> Result<FrameStore> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(self.parse_str(&String::from_utf8_lossy(&bytes)))
    }

    /// Parse log text already held in memory
    pub fn parse_str(&self, text: &str) -> FrameStore {
        let mut frames: Vec<Frame> = Vec::new();
        let mut stats = ParseStats::default();
        let mut start_time: Option<NaiveDateTime> = None;

        for (idx, line) in text.lines().enumerate() {
            if self.config.max_frames.is_some_and(|max| frames.len() >= max) {
                log::debug!("Frame limit reached at line {}", idx + 1);
                break;
            }
            stats.lines += 1;

            if self.config.is_housekeeping(line) {
                stats.housekeeping += 1;
                if start_time.is_none() {
                    start_time = parse_date_header(line);
                }
                continue;
            }

            match grammar::match_line(line) {
                Some((dialect, frame)) => {
                    if !self.config.should_process_channel(frame.channel) {
                        stats.filtered += 1;
                        continue;
                    }
                    *stats.by_dialect.entry(dialect).or_insert(0) += 1;
                    frames.push(frame);
                }
                None => {
                    log::trace!("Dropping line {}: {:?}", idx + 1, line);
                    stats.unmatched += 1;
                }
            }
        }

        for (dialect, count) in &stats.by_dialect {
            log::debug!("{} frames matched the {} dialect", count, dialect);
        }

        FrameStore::from_parts(frames, start_time, stats)
    }
}

/// Extract the absolute start time from a `date` header line
pub fn parse_date_header(line: &str) -> Option<NaiveDateTime> {
    let mut parts = line.split_whitespace();
    if parts.next()? != "date" {
        return None;
    }
    let date_str = parts.collect::<Vec<_>>().join(" ");

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&date_str, fmt).ok())
}
