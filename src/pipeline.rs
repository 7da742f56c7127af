//! # Pipeline Orchestration
//!
//! Runs the trajectory stages in order:
//!
//! 1. Group raw samples by device
//! 2. Sort each group chronologically (stable)
//! 3. Derive kinematics per group
//! 4. Flatten in device-id order
//! 5. Apply the motion filter
//!
//! Each stage consumes its input and returns a new owned sequence, so no
//! storage is shared between the raw and derived views.

use std::time::Duration;

use log::{debug, info};
use serde::Serialize;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::filter::{FilterOutcome, MotionFilter};
use crate::grouping::{group_by_device, sample_count, DeviceGroups};
use crate::kinematics::derive_kinematics;
use crate::sequencing::sort_chronologically;
use crate::{DerivedSample, Sample};

/// Everything the pipeline produced for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineOutput {
    /// Number of raw samples received
    pub raw_count: usize,
    /// Number of distinct device identifiers
    pub device_count: usize,
    /// One derived sample per raw sample, device-then-chronological order
    pub derived: Vec<DerivedSample>,
    /// Motion filter result over `derived`
    pub filtered: FilterOutcome,
}

impl PipelineOutput {
    /// Build a run summary from this output.
    pub fn summary(&self, filter: &MotionFilter, elapsed: Duration) -> ProcessingSummary {
        ProcessingSummary {
            input_records: self.raw_count,
            unique_devices: self.device_count,
            derived_records: self.derived.len(),
            output_records: self.filtered.kept.len(),
            dropped_first_of_group: self.filtered.dropped_first,
            dropped_below_threshold: self.filtered.dropped_slow,
            threshold_kmh: filter.min_speed_kmh,
            processing_seconds: elapsed.as_secs_f64(),
        }
    }
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingSummary {
    pub input_records: usize,
    pub unique_devices: usize,
    pub derived_records: usize,
    pub output_records: usize,
    pub dropped_first_of_group: usize,
    pub dropped_below_threshold: usize,
    pub threshold_kmh: f64,
    pub processing_seconds: f64,
}

/// Run the full pipeline over raw samples.
///
/// Output order is deterministic: devices in sorted identifier order, each
/// device's samples in stable chronological order. Never fails; an empty
/// input produces an empty output.
pub fn process(samples: Vec<Sample>, threshold_kmh: f64) -> PipelineOutput {
    let groups = group_stage(samples);
    let raw_count = sample_count(&groups);
    let device_count = groups.len();

    info!("[Pipeline] Deriving kinematics for {} devices", device_count);
    let derived: Vec<DerivedSample> = groups
        .into_values()
        .flat_map(|group| derive_kinematics(&sort_chronologically(group)))
        .collect();

    finish(raw_count, device_count, derived, threshold_kmh)
}

/// Parallel version of [`process`].
///
/// Device groups are derived on the rayon pool. Results are merged in
/// device-id order, not completion order, so the output is identical to
/// [`process`].
#[cfg(feature = "parallel")]
pub fn process_parallel(samples: Vec<Sample>, threshold_kmh: f64) -> PipelineOutput {
    let groups = group_stage(samples);
    let raw_count = sample_count(&groups);
    let device_count = groups.len();

    info!(
        "[Pipeline] Deriving kinematics for {} devices (parallel)",
        device_count
    );
    let groups: Vec<Vec<Sample>> = groups.into_values().collect();
    let per_device: Vec<Vec<DerivedSample>> = groups
        .into_par_iter()
        .map(|group| derive_kinematics(&sort_chronologically(group)))
        .collect();
    let derived = per_device.into_iter().flatten().collect();

    finish(raw_count, device_count, derived, threshold_kmh)
}

fn group_stage(samples: Vec<Sample>) -> DeviceGroups {
    info!("[Pipeline] Grouping {} records by device", samples.len());
    let groups = group_by_device(samples);
    for (device_id, group) in &groups {
        debug!("[Pipeline] Device '{}': {} records", device_id, group.len());
    }
    info!("[Pipeline] Found {} unique device IDs", groups.len());
    groups
}

fn finish(
    raw_count: usize,
    device_count: usize,
    derived: Vec<DerivedSample>,
    threshold_kmh: f64,
) -> PipelineOutput {
    let filter = MotionFilter::new(threshold_kmh);
    let filtered = filter.apply(&derived);

    info!(
        "[Pipeline] Filtered from {} to {} records",
        derived.len(),
        filtered.kept.len()
    );
    if filter.filters_speed() {
        info!(
            "[Pipeline] Speed filter applied: removed {} records below {:.1} km/h",
            filtered.dropped_slow, threshold_kmh
        );
    }

    PipelineOutput {
        raw_count,
        device_count,
        derived,
        filtered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration as ChronoDuration};

    fn t(offset_secs: i64) -> crate::Timestamp {
        DateTime::parse_from_rfc3339("2023-03-01T12:00:00Z").unwrap()
            + ChronoDuration::seconds(offset_secs)
    }

    fn mixed_input() -> Vec<Sample> {
        vec![
            Sample::new("b", 10.0, 10.0, t(60), 2),
            Sample::new("a", 40.0, -74.0, t(120), 3),
            Sample::new("b", 10.01, 10.0, t(120), 4),
            Sample::new("a", 40.01, -74.0, t(0), 5),
            Sample::new("a", 40.02, -74.0, t(60), 6),
            Sample::new("b", 10.0, 10.0, t(0), 7),
        ]
    }

    #[test]
    fn test_empty_input() {
        let output = process(Vec::new(), 1.0);
        assert_eq!(output.raw_count, 0);
        assert_eq!(output.device_count, 0);
        assert!(output.derived.is_empty());
        assert!(output.filtered.kept.is_empty());
        assert_eq!(output.filtered.input_count, 0);
    }

    #[test]
    fn test_device_then_chronological_order() {
        let output = process(mixed_input(), 0.0);
        let order: Vec<(&str, u64)> = output
            .derived
            .iter()
            .map(|d| (d.device_id(), d.sample.row))
            .collect();
        assert_eq!(
            order,
            vec![("a", 5), ("a", 6), ("a", 3), ("b", 7), ("b", 2), ("b", 4)]
        );
    }

    #[test]
    fn test_predecessor_follows_time_not_file_order() {
        let output = process(mixed_input(), 0.0);
        let preds: Vec<u64> = output.derived.iter().map(|d| d.predecessor_row()).collect();
        assert_eq!(preds, vec![0, 5, 6, 0, 7, 2]);
    }

    #[test]
    fn test_counts() {
        let output = process(mixed_input(), 0.0);
        assert_eq!(output.raw_count, 6);
        assert_eq!(output.device_count, 2);
        assert_eq!(output.derived.len(), 6);
        assert_eq!(output.filtered.dropped_first, 2);
        assert_eq!(output.filtered.kept.len(), 4);

        // b's row 2 is stationary, so any positive threshold drops it
        let output = process(mixed_input(), 0.5);
        assert_eq!(output.filtered.dropped_slow, 1);
        assert_eq!(output.filtered.kept.len(), 3);
    }

    #[test]
    fn test_repeat_runs_are_identical() {
        let first = process(mixed_input(), 1.0);
        let second = process(mixed_input(), 1.0);
        assert_eq!(first, second);
    }

    #[test]
    fn test_summary() {
        let output = process(mixed_input(), 1.0);
        let filter = MotionFilter::new(1.0);
        let summary = output.summary(&filter, Duration::from_millis(1500));

        assert_eq!(summary.input_records, 6);
        assert_eq!(summary.unique_devices, 2);
        assert_eq!(summary.derived_records, 6);
        assert_eq!(summary.output_records, output.filtered.kept.len());
        assert_eq!(summary.dropped_first_of_group, 2);
        assert_eq!(
            summary.dropped_first_of_group + summary.dropped_below_threshold + summary.output_records,
            summary.derived_records
        );
        assert_eq!(summary.threshold_kmh, 1.0);
        assert!((summary.processing_seconds - 1.5).abs() < 1e-9);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() {
        let input: Vec<Sample> = (0..200)
            .map(|i| {
                let device = format!("dev-{:02}", i % 13);
                Sample::new(device, 45.0 + i as f64 * 0.001, 7.0, t((i * 37 % 500) as i64), i + 2)
            })
            .collect();

        let sequential = process(input.clone(), 1.0);
        let parallel = process_parallel(input, 1.0);
        assert_eq!(sequential, parallel);
    }
}
