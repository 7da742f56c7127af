//! # Output Writers
//!
//! Serializes the motion-filtered samples. Writers never alter the samples
//! they are given; the KML writer only regroups and re-sorts its own view.
//!
//! - [`write_csv`]: one row per sample with predecessor and kinematics columns
//! - [`write_kml`]: one folder per device with a path and annotated points
//! - [`write_outputs`]: both of the above next to the input, all or nothing

mod kml;
mod table;

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::SecondsFormat;

use crate::error::{IoResultExt, Result};
use crate::{DerivedSample, Timestamp};

pub use kml::{write_kml, write_kml_to};
pub use table::{write_csv, write_csv_to, CSV_HEADER};

/// Output file kinds produced for one input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Kml,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Kml => "kml",
        }
    }
}

/// Output path for an input file: `<input without extension>_processed.<ext>`.
///
/// # Example
/// ```
/// use std::path::{Path, PathBuf};
/// use track_processor::{output_path, OutputFormat};
///
/// assert_eq!(
///     output_path(Path::new("data/tracks.csv"), OutputFormat::Kml),
///     PathBuf::from("data/tracks_processed.kml")
/// );
/// ```
pub fn output_path(input: &Path, format: OutputFormat) -> PathBuf {
    let mut name: OsString = input.with_extension("").into_os_string();
    name.push("_processed.");
    name.push(format.extension());
    PathBuf::from(name)
}

/// Files produced by [`write_outputs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub csv: PathBuf,
    pub kml: PathBuf,
}

/// Write both the CSV report and the KML document next to `input`.
///
/// Both documents are rendered in memory first. If writing either file fails,
/// whatever was already written is removed, so a failed run leaves no output.
pub fn write_outputs(input: &Path, samples: &[DerivedSample]) -> Result<OutputPaths> {
    let paths = OutputPaths {
        csv: output_path(input, OutputFormat::Csv),
        kml: output_path(input, OutputFormat::Kml),
    };

    let mut csv_doc = Vec::new();
    write_csv_to(&mut csv_doc, samples)?;
    let mut kml_doc = Vec::new();
    write_kml_to(&mut kml_doc, samples).with_path(&paths.kml)?;

    if let Err(e) = fs::write(&paths.csv, &csv_doc).with_path(&paths.csv) {
        let _ = fs::remove_file(&paths.csv);
        return Err(e);
    }
    if let Err(e) = fs::write(&paths.kml, &kml_doc).with_path(&paths.kml) {
        let _ = fs::remove_file(&paths.csv);
        let _ = fs::remove_file(&paths.kml);
        return Err(e);
    }

    log::info!(
        "[Export] Wrote {} rows to {} and {}",
        samples.len(),
        paths.csv.display(),
        paths.kml.display()
    );
    Ok(paths)
}

/// RFC 3339 at whole-second precision, `Z` for UTC.
pub(crate) fn format_timestamp(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrackError;
    use crate::kinematics::derive_kinematics;
    use crate::Sample;
    use chrono::{DateTime, Duration};

    fn two_fixes() -> Vec<DerivedSample> {
        let t0 = DateTime::parse_from_rfc3339("2023-03-01T12:00:00Z").unwrap();
        derive_kinematics(&[
            Sample::new("d1", 40.0, -74.0, t0, 1),
            Sample::new("d1", 40.01, -74.0, t0 + Duration::seconds(60), 2),
        ])
    }

    #[test]
    fn test_write_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("trips.csv");
        let paths = write_outputs(&input, &two_fixes()[1..]).unwrap();

        assert_eq!(paths.csv, dir.path().join("trips_processed.csv"));
        assert_eq!(paths.kml, dir.path().join("trips_processed.kml"));
        assert_eq!(fs::read_to_string(&paths.csv).unwrap().lines().count(), 2);
        assert!(fs::read_to_string(&paths.kml).unwrap().contains("<name>Device d1</name>"));
    }

    #[test]
    fn test_failed_kml_write_leaves_no_csv() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("trips.csv");
        // A directory in the KML's place makes that write fail
        fs::create_dir(dir.path().join("trips_processed.kml")).unwrap();

        let result = write_outputs(&input, &two_fixes()[1..]);
        assert!(matches!(result, Err(TrackError::Io { .. })));
        assert!(!dir.path().join("trips_processed.csv").exists());
    }

    #[test]
    fn test_output_path() {
        assert_eq!(
            output_path(Path::new("tracks.csv"), OutputFormat::Csv),
            PathBuf::from("tracks_processed.csv")
        );
        assert_eq!(
            output_path(Path::new("tracks"), OutputFormat::Kml),
            PathBuf::from("tracks_processed.kml")
        );
        assert_eq!(
            output_path(Path::new("run.2023.csv"), OutputFormat::Csv),
            PathBuf::from("run.2023_processed.csv")
        );
    }

    #[test]
    fn test_format_timestamp() {
        let utc = DateTime::parse_from_rfc3339("2023-03-01T12:00:00.750+00:00").unwrap();
        assert_eq!(format_timestamp(&utc), "2023-03-01T12:00:00Z");

        let cet = DateTime::parse_from_rfc3339("2023-03-01T13:00:00+01:00").unwrap();
        assert_eq!(format_timestamp(&cet), "2023-03-01T13:00:00+01:00");
    }
}
