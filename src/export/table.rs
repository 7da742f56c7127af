//! Tabular (CSV) report.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use csv::Writer;

use super::format_timestamp;
use crate::error::{IoResultExt, Result};
use crate::DerivedSample;

/// Column order of the report.
pub const CSV_HEADER: [&str; 12] = [
    "ID",
    "latitude",
    "longitude",
    "timestamp",
    "original_row",
    "previous_row",
    "prev_latitude",
    "prev_longitude",
    "prev_timestamp",
    "time_diff_seconds",
    "distance_km",
    "speed_kmh",
];

/// Write the report to a file.
pub fn write_csv(path: &Path, samples: &[DerivedSample]) -> Result<()> {
    let file = File::create(path).with_path(path)?;
    write_csv_to(BufWriter::new(file), samples)?;
    log::info!("[Export] Wrote {} rows to {}", samples.len(), path.display());
    Ok(())
}

/// Write the report to any sink.
///
/// Floats use six decimal places. Predecessor columns are left blank for a
/// sample without a predecessor.
pub fn write_csv_to<W: Write>(sink: W, samples: &[DerivedSample]) -> Result<()> {
    let mut writer = Writer::from_writer(sink);
    writer.write_record(CSV_HEADER)?;

    for sample in samples {
        writer.write_record(row(sample))?;
    }

    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

fn row(derived: &DerivedSample) -> [String; 12] {
    let s = &derived.sample;
    let (prev_lat, prev_lon, prev_ts) = match &derived.predecessor {
        Some(p) => (
            format!("{:.6}", p.latitude),
            format!("{:.6}", p.longitude),
            format_timestamp(&p.timestamp),
        ),
        None => (String::new(), String::new(), String::new()),
    };

    [
        s.device_id.clone(),
        format!("{:.6}", s.latitude),
        format!("{:.6}", s.longitude),
        format_timestamp(&s.timestamp),
        s.row.to_string(),
        derived.predecessor_row().to_string(),
        prev_lat,
        prev_lon,
        prev_ts,
        format!("{:.6}", derived.elapsed_seconds),
        format!("{:.6}", derived.distance_km),
        format!("{:.6}", derived.speed_kmh),
    ]
}
