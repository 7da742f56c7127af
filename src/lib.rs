//! # Track Processor
//!
//! GPS trajectory reconstruction and kinematics for multi-device sample logs.
//!
//! This library provides:
//! - Grouping of raw samples into per-device trajectories
//! - Stable chronological ordering of each trajectory
//! - Per-sample kinematics (elapsed time, haversine distance, speed)
//! - Motion filtering by a minimum speed threshold
//! - CSV and KML writers for the filtered result
//!
//! ## Features
//!
//! - **`parallel`** - Derive device groups on the rayon thread pool
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::DateTime;
//! use track_processor::{process, Sample};
//!
//! let t0 = DateTime::parse_from_rfc3339("2023-03-01T12:00:00Z").unwrap();
//! let t1 = DateTime::parse_from_rfc3339("2023-03-01T12:01:00Z").unwrap();
//!
//! let samples = vec![
//!     Sample::new("d1", 40.0, -74.0, t0, 2),
//!     Sample::new("d1", 40.01, -74.0, t1, 3),
//! ];
//!
//! let output = process(samples, 0.0);
//! assert_eq!(output.derived.len(), 2);
//! assert_eq!(output.filtered.kept.len(), 1);
//! println!("speed: {:.1} km/h", output.filtered.kept[0].speed_kmh);
//! ```

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{IoResultExt, Result, TrackError};

// Geographic utilities (haversine distance, path length)
pub mod geo_utils;
pub use geo_utils::{haversine_distance, EARTH_RADIUS_KM};

// Per-device grouping
pub mod grouping;
pub use grouping::{group_by_device, DeviceGroups};

// Stable chronological ordering
pub mod sequencing;
pub use sequencing::sort_chronologically;

// Elapsed time / distance / speed derivation
pub mod kinematics;
pub use kinematics::{derive_kinematics, speed_kmh};

// Minimum speed filtering
pub mod filter;
pub use filter::{filter_by_speed, FilterOutcome, MotionFilter};

// Stage orchestration
pub mod pipeline;
#[cfg(feature = "parallel")]
pub use pipeline::process_parallel;
pub use pipeline::{process, PipelineOutput, ProcessingSummary};

// YAML configuration
pub mod config;
pub use config::{ColumnMapping, Config, Parameters};

// CSV input
pub mod reader;
pub use reader::{read_samples, read_samples_from};

// Input/config auto-discovery
pub mod discovery;
pub use discovery::find_single_file;

// CSV and KML writers
pub mod export;
pub use export::{
    output_path, write_csv, write_csv_to, write_kml, write_kml_to, write_outputs, OutputFormat,
    OutputPaths, CSV_HEADER,
};

// ============================================================================
// Core Types
// ============================================================================

/// Instant with the UTC offset it was recorded in.
pub type Timestamp = DateTime<FixedOffset>;

/// A GPS coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use track_processor::GpsPoint;
/// let point = GpsPoint::new(40.7128, -74.0060); // New York
/// assert!(point.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// One raw GPS fix as read from the input table.
///
/// Immutable once read. `row` is the position in the source file and is only
/// used for traceability, never for ordering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    /// Device/track identifier (grouping key, matched exactly)
    pub device_id: String,
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Fix time
    pub timestamp: Timestamp,
    /// Original 1-based position in the input (unique, never 0)
    pub row: u64,
}

impl Sample {
    /// Create a new sample.
    pub fn new(
        device_id: impl Into<String>,
        latitude: f64,
        longitude: f64,
        timestamp: Timestamp,
        row: u64,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            latitude,
            longitude,
            timestamp,
            row,
        }
    }

    /// Position of this sample as a [`GpsPoint`].
    pub fn point(&self) -> GpsPoint {
        GpsPoint::new(self.latitude, self.longitude)
    }
}

/// The chronologically preceding sample of the same device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Predecessor {
    /// Original input position of the predecessor
    pub row: u64,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: Timestamp,
}

impl From<&Sample> for Predecessor {
    fn from(sample: &Sample) -> Self {
        Self {
            row: sample.row,
            latitude: sample.latitude,
            longitude: sample.longitude,
            timestamp: sample.timestamp,
        }
    }
}

/// A sample together with the kinematics relative to its predecessor.
///
/// The first sample of every device group has no predecessor and all derived
/// quantities set to zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedSample {
    #[serde(flatten)]
    pub sample: Sample,
    /// `None` for the first sample of a device group
    pub predecessor: Option<Predecessor>,
    /// Seconds since the predecessor's fix
    pub elapsed_seconds: f64,
    /// Great-circle distance from the predecessor in kilometres
    pub distance_km: f64,
    /// Average speed since the predecessor in km/h
    pub speed_kmh: f64,
}

impl DerivedSample {
    /// Derived sample for the first fix of a group (no predecessor).
    pub fn first(sample: Sample) -> Self {
        Self {
            sample,
            predecessor: None,
            elapsed_seconds: 0.0,
            distance_km: 0.0,
            speed_kmh: 0.0,
        }
    }

    pub fn device_id(&self) -> &str {
        &self.sample.device_id
    }

    pub fn timestamp(&self) -> Timestamp {
        self.sample.timestamp
    }

    /// Predecessor's original position, or 0 when there is none.
    pub fn predecessor_row(&self) -> u64 {
        self.predecessor.as_ref().map_or(0, |p| p.row)
    }

    pub fn has_predecessor(&self) -> bool {
        self.predecessor.is_some()
    }
}

// ============================================================================
// Tests
// ============================================================================
