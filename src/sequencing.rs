//! Chronological ordering of a single device trajectory.

use crate::Sample;

/// Sort one device's samples by ascending timestamp.
///
/// The sort is stable: samples with equal timestamps keep their input order.
/// Kinematics derivation defines "predecessor" purely in terms of this order.
/// Timestamps are compared as instants, so fixes recorded with different UTC
/// offsets interleave correctly.
pub fn sort_chronologically(mut samples: Vec<Sample>) -> Vec<Sample> {
    samples.sort_by_key(|s| s.timestamp);
    samples
}
