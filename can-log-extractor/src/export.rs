//! Tabular export of a frame store
//!
//! Columns: `timestamp,id,dlc,byte_0 … byte_7`, one row per frame in parse
//! order. Bytes are written as two uppercase hex digits. Channel and direction
//! are not part of the table.

use crate::store::FrameStore;
use crate::types::{CanId, ExtractorError, Frame, Result, FRAME_BYTES};
use std::io::{Read, Write};
use std::path::Path;

/// Column header of the exported table
pub fn header() -> Vec<String> {
    let mut cols = vec!["timestamp".to_string(), "id".to_string(), "dlc".to_string()];
    cols.extend((0..FRAME_BYTES).map(|i| format!("byte_{}", i)));
    cols
}

/// Write the store as CSV to any writer
pub fn write_csv<W: Write>(store: &FrameStore, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(header())?;

    for frame in store.frames() {
        let mut record = vec![
            frame.timestamp.to_string(),
            frame.id.to_string(),
            frame.dlc.to_string(),
        ];
        record.extend(frame.bytes.iter().map(|b| format!("{:02X}", b)));
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Export the store to a CSV file
pub fn export_csv(store: &FrameStore, path: &Path) -> Result<()> {
    log::info!("Exporting {} frames to {:?}", store.len(), path);
    let file = std::fs::File::create(path)?;
    write_csv(store, file)
}

/// Read a table previously written by [`write_csv`]
///
/// Unlike log parsing, a malformed row is an error: the table is
/// machine-written and a bad row means the file is not what it claims to be.
pub fn read_csv<R: Read>(reader: R) -> Result<FrameStore> {
    let mut rdr = csv::Reader::from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(ToString::to_string).collect();
    if headers != header() {
        return Err(ExtractorError::Import {
            row: 0,
            reason: format!("unexpected header {:?}", headers),
        });
    }

    let mut frames = Vec::new();
    for (i, rec) in rdr.records().enumerate() {
        let record = rec?;
        let row = i + 1;
        let field = |idx: usize| record.get(idx).unwrap_or_default();
        let bad = |what: &str| ExtractorError::Import {
            row,
            reason: format!("invalid {}", what),
        };

        let timestamp: f64 = field(0).parse().map_err(|_| bad("timestamp"))?;
        let id = CanId::parse(field(1)).ok_or_else(|| bad("id"))?;
        let dlc: u8 = field(2).parse().map_err(|_| bad("dlc"))?;

        let mut bytes = [0u8; FRAME_BYTES];
        for (k, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(field(3 + k), 16).map_err(|_| bad("byte"))?;
        }

        frames.push(Frame::new(timestamp, id, dlc, &bytes));
    }

    Ok(FrameStore::new(frames))
}

/// Import a CSV file written by [`export_csv`]
pub fn import_csv(path: &Path) -> Result<FrameStore> {
    let file = std::fs::File::open(path).map_err(|source| ExtractorError::Load {
        path: path.to_path_buf(),
        source,
    })?;
    read_csv(file)
}
