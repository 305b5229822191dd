//! Line grammars for the supported ASC-style dialects
//!
//! Each grammar is an anchored regular expression over one log line. The set is
//! ordered: the stricter Vector layouts are tried before the looser compact and
//! legacy ones, because a loose grammar can also match a line of a strict
//! dialect. The first grammar that matches decides the line.
//!
//! Example lines, in priority order:
//! ```text
//! 100.123 1 2B0 Tx d 8 01 02 03 04 05 06 07 08
//! 100.123 1 2B0 d 8 01 02 03 04 05 06 07 08
//! 100.123 2B0 8 01 02 03 04 05 06 07 08
//! 100.123 2B0 Rx 8 01 02 03 04 05 06 07 08
//! ```

use crate::types::{CanId, Direction, Frame, FRAME_BYTES};
use regex::{Captures, Regex};
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

const TIMESTAMP: &str = r"(?P<ts>\d+(?:\.\d+)?)";
const CHANNEL: &str = r"(?P<channel>\d+)";
const ID: &str = r"(?P<id>[0-9A-Fa-f]+)";
const DIRECTION: &str = r"(?P<dir>Tx|Rx)";
const DLC: &str = r"(?P<dlc>\d+)";
const DATA: &str = r"(?:\s+(?P<data>[0-9A-Fa-f]{2}(?:\s+[0-9A-Fa-f]{2})*))?";
// Vector appends "Length = ... BitCount = ..." after the payload; nothing else may follow
const TAIL: &str = r"(?:\s+Length\s*=.*)?\s*$";

/// Supported log line dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Dialect {
    /// `<ts> <channel> <id> Tx|Rx d <dlc> <bytes>`
    VectorDirected,
    /// `<ts> <channel> <id> d <dlc> <bytes>`
    VectorUndirected,
    /// `<ts> <id> <dlc> <bytes>`
    Compact,
    /// `<ts> <id> Tx|Rx <dlc> <bytes>`
    Legacy,
}

impl Dialect {
    /// All dialects in matching priority order
    pub const ALL: [Dialect; 4] = [
        Dialect::VectorDirected,
        Dialect::VectorUndirected,
        Dialect::Compact,
        Dialect::Legacy,
    ];

    fn pattern(self) -> String {
        let body = match self {
            Dialect::VectorDirected => {
                format!(r"{TIMESTAMP}\s+{CHANNEL}\s+{ID}\s+{DIRECTION}\s+d\s+{DLC}")
            }
            Dialect::VectorUndirected => format!(r"{TIMESTAMP}\s+{CHANNEL}\s+{ID}\s+d\s+{DLC}"),
            Dialect::Compact => format!(r"{TIMESTAMP}\s+{ID}\s+{DLC}"),
            Dialect::Legacy => format!(r"{TIMESTAMP}\s+{ID}\s+{DIRECTION}\s+{DLC}"),
        };
        format!(r"^\s*{body}{DATA}{TAIL}")
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::VectorDirected => write!(f, "vector"),
            Dialect::VectorUndirected => write!(f, "vector-undirected"),
            Dialect::Compact => write!(f, "compact"),
            Dialect::Legacy => write!(f, "legacy"),
        }
    }
}

/// One dialect grammar: a compiled pattern plus field extraction
pub struct LineGrammar {
    dialect: Dialect,
    regex: Regex,
}

impl LineGrammar {
    fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            regex: Regex::new(&dialect.pattern()).expect("dialect pattern is a valid regex"),
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Check whether the line has this grammar's shape
    pub fn is_match(&self, line: &str) -> bool {
        self.regex.is_match(line)
    }

    /// Attempt to match a line and extract a frame
    ///
    /// `None` means either the shape did not match or a field was malformed.
    pub fn match_line(&self, line: &str) -> Option<Frame> {
        let caps = self.regex.captures(line)?;
        Self::extract(&caps)
    }

    fn extract(caps: &Captures<'_>) -> Option<Frame> {
        let timestamp: f64 = caps.name("ts")?.as_str().parse().ok()?;
        let id = CanId::parse(caps.name("id")?.as_str())?;

        let dlc: u8 = caps.name("dlc")?.as_str().parse().ok()?;
        if dlc as usize > FRAME_BYTES {
            return None;
        }

        let channel = match caps.name("channel") {
            Some(m) => Some(m.as_str().parse::<u8>().ok()?),
            None => None,
        };
        let direction = match caps.name("dir") {
            Some(m) => Some(Direction::parse(m.as_str())?),
            None => None,
        };

        let data = match caps.name("data") {
            Some(m) => parse_data_bytes(m.as_str())?,
            None => Vec::new(),
        };

        Some(
            Frame::new(timestamp, id, dlc, &data)
                .with_channel(channel)
                .with_direction(direction),
        )
    }
}

/// Parse a whitespace separated run of hex byte tokens
pub fn parse_data_bytes(run: &str) -> Option<Vec<u8>> {
    run.split_whitespace()
        .map(|tok| u8::from_str_radix(tok, 16).ok())
        .collect()
}

static GRAMMARS: LazyLock<Vec<LineGrammar>> =
    LazyLock::new(|| Dialect::ALL.iter().map(|d| LineGrammar::new(*d)).collect());

/// The grammar set in priority order
pub fn grammars() -> &'static [LineGrammar] {
    &GRAMMARS
}

/// Run the grammar set over one line
///
/// The first grammar whose shape matches decides the line. If its fields turn
/// out malformed the line is a miss; lower priority grammars are not tried.
pub fn match_line(line: &str) -> Option<(Dialect, Frame)> {
    let grammar = grammars().iter().find(|g| g.is_match(line))?;
    let frame = grammar.match_line(line)?;
    Some((grammar.dialect(), frame))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> CanId {
        CanId::parse(s).unwrap()
    }

    #[test]
    fn test_vector_directed_line() {
        let (dialect, frame) =
            match_line("100.123 1 2B0 Tx d 8 01 02 03 04 05 06 07 08").unwrap();
        assert_eq!(dialect, Dialect::VectorDirected);
        assert_eq!(frame.timestamp, 100.123);
        assert_eq!(frame.id, id("2B0"));
        assert_eq!(frame.dlc, 8);
        assert_eq!(frame.bytes, [1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(frame.channel, Some(1));
        assert_eq!(frame.direction, Some(Direction::Tx));
    }

    #[test]
    fn test_short_payload_is_zero_padded() {
        let (_, frame) = match_line("100.456 1 1FF Tx d 3 0A 0B 0C").unwrap();
        assert_eq!(frame.id, id("1FF"));
        assert_eq!(frame.dlc, 3);
        assert_eq!(frame.bytes, [0x0A, 0x0B, 0x0C, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_vector_undirected_line() {
        let (dialect, frame) = match_line("0.5 2 123 d 2 FF 10").unwrap();
        assert_eq!(dialect, Dialect::VectorUndirected);
        assert_eq!(frame.channel, Some(2));
        assert_eq!(frame.direction, None);
        assert_eq!(frame.bytes[..2], [0xFF, 0x10]);
    }

    #[test]
    fn test_compact_line() {
        let (dialect, frame) = match_line("12.000100 7df 8 02 01 0D 00 00 00 00 00").unwrap();
        assert_eq!(dialect, Dialect::Compact);
        assert_eq!(frame.id, id("7DF"));
        assert_eq!(frame.channel, None);
        assert_eq!(frame.bytes[2], 0x0D);
    }

    #[test]
    fn test_legacy_line() {
        let (dialect, frame) = match_line("3.25 18FEF100 Rx 4 AA BB CC DD").unwrap();
        assert_eq!(dialect, Dialect::Legacy);
        assert_eq!(frame.id, id("18FEF100"));
        assert_eq!(frame.direction, Some(Direction::Rx));
        assert_eq!(frame.bytes, [0xAA, 0xBB, 0xCC, 0xDD, 0, 0, 0, 0]);
    }

    #[test]
    fn test_zero_length_frame() {
        let (_, frame) = match_line("1.0 1 100 Rx d 0").unwrap();
        assert_eq!(frame.dlc, 0);
        assert_eq!(frame.bytes, [0; 8]);
    }

    #[test]
    fn test_vector_suffix_is_ignored() {
        let line = "0.050000 1  123             Rx   d 8 01 02 03 04 05 06 07 08 Length = 228000 BitCount = 118 ID = 291";
        let (dialect, frame) = match_line(line).unwrap();
        assert_eq!(dialect, Dialect::VectorDirected);
        assert_eq!(frame.bytes, [1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_priority_prefers_vector_over_compact() {
        // Numeric IDs make the line ambiguous for the compact grammar
        let (dialect, frame) = match_line("1.5 1 200 d 2 01 02").unwrap();
        assert_eq!(dialect, Dialect::VectorUndirected);
        assert_eq!(frame.id, id("200"));
        assert_eq!(frame.channel, Some(1));
    }

    #[test]
    fn test_dlc_above_eight_is_a_miss() {
        assert!(match_line("0.1 2 1F334410 Tx d 12 11 22 33 44 55 66 77 88 99 AA BB CC").is_none());
    }

    #[test]
    fn test_excess_bytes_are_truncated() {
        let (_, frame) = match_line("0.1 ABC 8 01 02 03 04 05 06 07 08 09").unwrap();
        assert_eq!(frame.bytes, [1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_malformed_byte_token_is_a_miss() {
        assert!(match_line("1.0 100 8 01 0G 03 04").is_none());
        assert!(match_line("1.0 1 2B0 Tx d 3 0A ZZ 0C").is_none());
        assert!(match_line("1.0 2B0 Rx 2 0A 0B0").is_none());
    }

    #[test]
    fn test_single_digit_bytes_are_a_miss() {
        assert!(match_line("1.0 100 3 1 2 3").is_none());
        assert!(match_line("1.0 1 100 d 2 1 2").is_none());
    }

    #[test]
    fn test_remote_frame_is_not_read_as_compact() {
        assert!(match_line("0.5 1 5 Rx r").is_none());
        assert!(match_line("0.5 1 5 r").is_none());
    }

    #[test]
    fn test_unknown_trailing_text_is_a_miss() {
        assert!(match_line("1.0 100 2 01 02 trailing").is_none());
        assert!(match_line("1.0 100 2 trailing").is_none());
        // Trailing whitespace alone is fine
        let (_, frame) = match_line("1.0 100 2 01 02  \r").unwrap();
        assert_eq!(frame.bytes[..2], [1, 2]);
    }

    #[test]
    fn test_non_frame_lines_do_not_match() {
        assert!(match_line("").is_none());
        assert!(match_line("   ").is_none());
        assert!(match_line("internal events logged").is_none());
        assert!(match_line("1.000 CAN 1 Status:chip status error active").is_none());
        assert!(match_line("1.5 1 Statistic: D 0 R 0 XD 0").is_none());
    }

    #[test]
    fn test_grammars_are_in_priority_order() {
        let order: Vec<Dialect> = grammars().iter().map(|g| g.dialect()).collect();
        assert_eq!(order, Dialect::ALL.to_vec());
    }
}
