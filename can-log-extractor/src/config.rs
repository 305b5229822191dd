//! Parser configuration
//!
//! The extractor needs very little configuration: which housekeeping lines to
//! skip, an optional channel filter and an optional frame limit.

use serde::{Deserialize, Serialize};

/// Line prefixes that mark ASC header, comment and section lines
pub const DEFAULT_SKIP_PREFIXES: &[&str] = &["date", "base", "version", "Begin", "End", "//"];

/// Configuration for the frame parser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Lines starting with any of these prefixes are never fed to a grammar
    #[serde(default = "default_skip_prefixes")]
    pub skip_prefixes: Vec<String>,

    /// Optional: only keep frames from these channels (channel-less frames are kept)
    #[serde(default)]
    pub channel_filter: Option<Vec<u8>>,

    /// Optional: stop parsing after this many frames
    #[serde(default)]
    pub max_frames: Option<usize>,
}

fn default_skip_prefixes() -> Vec<String> {
    DEFAULT_SKIP_PREFIXES.iter().map(|p| p.to_string()).collect()
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            skip_prefixes: default_skip_prefixes(),
            channel_filter: None,
            max_frames: None,
        }
    }
}

impl ExtractorConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: add a housekeeping prefix
    pub fn add_skip_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.skip_prefixes.push(prefix.into());
        self
    }

    /// Builder method: set channel filter
    pub fn with_channel_filter(mut self, channels: Vec<u8>) -> Self {
        self.channel_filter = Some(channels);
        self
    }

    /// Builder method: limit the number of parsed frames
    pub fn with_max_frames(mut self, max_frames: usize) -> Self {
        self.max_frames = Some(max_frames);
        self
    }

    /// Check if a line is a header/comment line
    pub fn is_housekeeping(&self, line: &str) -> bool {
        let line = line.trim_start();
        self.skip_prefixes.iter().any(|p| line.starts_with(p.as_str()))
    }

    /// Check if a frame from this channel should be kept
    pub fn should_process_channel(&self, channel: Option<u8>) -> bool {
        match (&self.channel_filter, channel) {
            (Some(channels), Some(ch)) => channels.contains(&ch),
            _ => true,
        }
    }
}
