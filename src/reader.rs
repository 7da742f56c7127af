//! CSV input.
//!
//! Reads raw samples from a CSV file with a header row. Column roles are
//! located by exact header name from a [`ColumnMapping`]. Any unparsable
//! latitude, longitude or timestamp aborts the whole read; no partial sample
//! list is ever returned.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::DateTime;
use csv::{ReaderBuilder, StringRecord};
use log::{debug, info, warn};

use crate::config::ColumnMapping;
use crate::error::{IoResultExt, Result, TrackError};
use crate::{Sample, Timestamp};

/// Header positions of the four column roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnIndices {
    id: usize,
    latitude: usize,
    longitude: usize,
    timestamp: usize,
}

impl ColumnIndices {
    fn locate(header: &StringRecord, columns: &ColumnMapping) -> Result<Self> {
        // Last match wins when a header name repeats
        let find = |name: &str| {
            header
                .iter()
                .enumerate()
                .filter(|(_, h)| *h == name)
                .last()
                .map(|(i, _)| i)
        };

        match (
            find(&columns.id),
            find(&columns.latitude),
            find(&columns.longitude),
            find(&columns.timestamp),
        ) {
            (Some(id), Some(latitude), Some(longitude), Some(timestamp)) => Ok(Self {
                id,
                latitude,
                longitude,
                timestamp,
            }),
            _ => Err(TrackError::MissingColumns {
                id: columns.id.clone(),
                latitude: columns.latitude.clone(),
                longitude: columns.longitude.clone(),
                timestamp: columns.timestamp.clone(),
            }),
        }
    }
}

/// Read all samples from a CSV file.
pub fn read_samples(path: &Path, columns: &ColumnMapping) -> Result<Vec<Sample>> {
    info!("[Reader] Reading {}", path.display());
    let file = File::open(path).with_path(path)?;
    let samples = read_samples_from(BufReader::new(file), columns)?;
    info!("[Reader] Read {} records from {}", samples.len(), path.display());
    Ok(samples)
}

/// Read all samples from any CSV byte source.
///
/// Rows are numbered from 1 in file order, not counting the header.
///
/// # Example
/// ```
/// use track_processor::{read_samples_from, ColumnMapping};
///
/// let data = "ID,latitude,longitude,timestamp\n\
///             d1,40.0,-74.0,2023-03-01T12:00:00Z\n";
/// let samples = read_samples_from(data.as_bytes(), &ColumnMapping::default()).unwrap();
/// assert_eq!(samples.len(), 1);
/// assert_eq!(samples[0].row, 1);
/// ```
pub fn read_samples_from<R: Read>(input: R, columns: &ColumnMapping) -> Result<Vec<Sample>> {
    // Short rows are reported per field below rather than as a CSV shape error
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input);

    let header = reader.headers()?.clone();
    let indices = ColumnIndices::locate(&header, columns)?;
    debug!("[Reader] Column positions: {:?}", indices);

    let mut samples = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        samples.push(parse_record(&record, &indices, i as u64 + 1)?);
    }
    Ok(samples)
}

fn parse_record(record: &StringRecord, indices: &ColumnIndices, row: u64) -> Result<Sample> {
    let device_id = field(record, indices.id, row, "ID")?;
    let latitude = parse_coordinate(field(record, indices.latitude, row, "latitude")?, row, "latitude")?;
    let longitude =
        parse_coordinate(field(record, indices.longitude, row, "longitude")?, row, "longitude")?;
    let timestamp = parse_timestamp(field(record, indices.timestamp, row, "timestamp")?, row)?;

    let sample = Sample::new(device_id, latitude, longitude, timestamp, row);
    if !sample.point().is_valid() {
        warn!(
            "[Reader] Row {} has out-of-range coordinates ({}, {})",
            row, latitude, longitude
        );
    }
    Ok(sample)
}

fn field<'r>(
    record: &'r StringRecord,
    index: usize,
    row: u64,
    name: &'static str,
) -> Result<&'r str> {
    record.get(index).ok_or_else(|| TrackError::InvalidField {
        row,
        field: name,
        value: String::new(),
        message: format!("row has no column {}", index + 1),
    })
}

fn parse_coordinate(value: &str, row: u64, name: &'static str) -> Result<f64> {
    let invalid = |message: String| TrackError::InvalidField {
        row,
        field: name,
        value: value.to_string(),
        message,
    };
    let parsed = value.parse::<f64>().map_err(|e| invalid(e.to_string()))?;
    if !parsed.is_finite() {
        return Err(invalid("not a finite number".to_string()));
    }
    Ok(parsed)
}

fn parse_timestamp(value: &str, row: u64) -> Result<Timestamp> {
    DateTime::parse_from_rfc3339(value).map_err(|e| TrackError::InvalidField {
        row,
        field: "timestamp",
        value: value.to_string(),
        message: e.to_string(),
    })
}
