//! Motion filtering.
//!
//! Removes the first fix of every device group (it has no predecessor, so its
//! kinematics are meaningless) and any fix whose derived speed is below a
//! minimum threshold.

use serde::Serialize;

use crate::DerivedSample;

/// Minimum-speed filter over derived samples.
///
/// A threshold of 0 or below disables speed filtering, but group-initial
/// samples are still removed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MotionFilter {
    /// Minimum speed in km/h for a sample to be kept
    pub min_speed_kmh: f64,
}

impl MotionFilter {
    pub fn new(min_speed_kmh: f64) -> Self {
        Self { min_speed_kmh }
    }

    /// Whether speed filtering is active at all.
    pub fn filters_speed(&self) -> bool {
        self.min_speed_kmh > 0.0
    }

    /// Whether a single derived sample survives the filter.
    pub fn keeps(&self, sample: &DerivedSample) -> bool {
        sample.has_predecessor()
            && (!self.filters_speed() || sample.speed_kmh >= self.min_speed_kmh)
    }

    /// Select the surviving samples, preserving input order.
    pub fn apply(&self, samples: &[DerivedSample]) -> FilterOutcome {
        let mut kept = Vec::with_capacity(samples.len());
        let mut dropped_first = 0;
        let mut dropped_slow = 0;

        for sample in samples {
            if !sample.has_predecessor() {
                dropped_first += 1;
            } else if self.keeps(sample) {
                kept.push(sample.clone());
            } else {
                dropped_slow += 1;
            }
        }

        FilterOutcome {
            input_count: samples.len(),
            kept,
            dropped_first,
            dropped_slow,
        }
    }
}

impl Default for MotionFilter {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_FILTER_ABOVE_KPH)
    }
}

/// Result of applying a [`MotionFilter`].
///
/// `input_count == 0` means there was nothing to filter; an empty `kept` with
/// a non-zero `input_count` means everything was filtered out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOutcome {
    /// Number of derived samples offered to the filter
    pub input_count: usize,
    /// Surviving samples in their original order
    pub kept: Vec<DerivedSample>,
    /// Samples removed for being first in their device group
    pub dropped_first: usize,
    /// Samples removed for falling below the speed threshold
    pub dropped_slow: usize,
}

impl FilterOutcome {
    /// True when there was input but nothing survived.
    pub fn all_filtered(&self) -> bool {
        self.input_count > 0 && self.kept.is_empty()
    }
}

/// Filter derived samples by minimum speed.
///
/// Keeps samples that have a predecessor and a speed of at least `threshold_kmh`.
pub fn filter_by_speed(samples: &[DerivedSample], threshold_kmh: f64) -> FilterOutcome {
    MotionFilter::new(threshold_kmh).apply(samples)
}
