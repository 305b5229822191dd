//! Report generation
//!
//! Collects everything one run produced and renders it as plain text or JSON.

use anyhow::Result;
use can_log_extractor::{
    CanId, CrossReferenceReport, DatabaseStats, DecodedRow, ParseStats, Session, Summary,
};
use serde::Serialize;
use std::collections::BTreeSet;

/// Everything printed for one log
#[derive(Debug, Serialize)]
pub struct Report {
    pub parse: ParseStats,
    /// `None` when the log produced no frames
    pub summary: Option<Summary>,
    pub dictionary: Option<DatabaseStats>,
    /// `None` when no dictionary is loaded
    pub cross_reference: Option<CrossReferenceReport>,
    pub decoded_total: usize,
    pub decoded_rows: Vec<DecodedRow>,
    /// IDs offered to the decoder that never decoded
    pub never_decoded: Vec<CanId>,
    pub frequency: Option<Vec<(CanId, usize)>>,
}

impl Report {
    /// Build the report from a loaded session
    pub fn collect(session: &Session, decoded_rows: usize, frequency: bool) -> Self {
        let outcome = session.decode_with_diagnostics();
        let never_decoded = outcome.never_decoded().into_iter().cloned().collect();
        let decoded_total = outcome.rows.len();

        Self {
            parse: session.store().stats().clone(),
            summary: session.summary().ok(),
            dictionary: session.dictionary_stats(),
            cross_reference: session.cross_reference().ok(),
            decoded_total,
            decoded_rows: outcome.rows.into_iter().take(decoded_rows).collect(),
            never_decoded,
            frequency: frequency.then(|| session.store().id_frequency()),
        }
    }

    pub fn render_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn render_txt(&self) -> String {
        let mut out = String::new();
        let rule = "───────────────────────────────────────────────\n";

        out.push_str("Summary\n");
        out.push_str(rule);
        match &self.summary {
            Some(s) => {
                out.push_str(&format!("  Frames:     {}\n", s.total_frames));
                out.push_str(&format!("  Unique IDs: {}\n", s.unique_ids));
                out.push_str(&format!("  Time span:  {} .. {} s\n", s.min_time, s.max_time));
            }
            None => out.push_str("  No frames parsed\n"),
        }
        out.push_str(&format!(
            "  Lines:      {} ({} header, {} unmatched, {} filtered)\n",
            self.parse.lines, self.parse.housekeeping, self.parse.unmatched, self.parse.filtered
        ));
        for (dialect, count) in &self.parse.by_dialect {
            out.push_str(&format!("    {:<18} {}\n", dialect.to_string(), count));
        }

        out.push_str("\nCross-reference\n");
        out.push_str(rule);
        match &self.cross_reference {
            Some(xref) => {
                if let Some(stats) = &self.dictionary {
                    out.push_str(&format!(
                        "  Dictionary: {} messages, {} signals\n",
                        stats.num_messages, stats.num_signals
                    ));
                }
                out.push_str(&format!("  Matched:         {}\n", join_ids(&xref.matched)));
                out.push_str(&format!("  Log only:        {}\n", join_ids(&xref.log_only)));
                out.push_str(&format!(
                    "  Dictionary only: {}\n",
                    join_ids(&xref.dictionary_only)
                ));
                out.push_str(&format!("  Coverage:        {:.1}%\n", xref.coverage() * 100.0));
            }
            None => out.push_str("  Unavailable (no dictionary loaded)\n"),
        }

        out.push_str(&format!("\nDecoded rows: {}\n", self.decoded_total));
        for row in &self.decoded_rows {
            let signals: Vec<String> = row
                .signals
                .iter()
                .map(|s| match &s.unit {
                    Some(unit) => format!("{}={} {}", s.name, s.value, unit),
                    None => format!("{}={}", s.name, s.value),
                })
                .collect();
            out.push_str(&format!(
                "  {:>12.6} {:>8}  {}\n",
                row.timestamp,
                row.id,
                signals.join(", ")
            ));
        }
        if !self.never_decoded.is_empty() {
            let ids: Vec<&str> = self.never_decoded.iter().map(CanId::as_str).collect();
            out.push_str(&format!("  Never decoded: {}\n", ids.join(" ")));
        }

        if let Some(freq) = &self.frequency {
            out.push_str("\nID frequency\n");
            out.push_str(rule);
            for (id, count) in freq {
                out.push_str(&format!("  {:>8}  {}\n", id, count));
            }
        }
        out
    }
}

fn join_ids(ids: &BTreeSet<CanId>) -> String {
    if ids.is_empty() {
        return "-".to_string();
    }
    ids.iter().map(CanId::as_str).collect::<Vec<_>>().join(" ")
}
