//! Trajectory grouping.
//!
//! Partitions an unordered sample stream into per-device trajectories. The
//! key is the device identifier compared byte-for-byte, with no trimming or
//! case folding.

use std::collections::BTreeMap;

use crate::Sample;

/// Samples bucketed by device identifier.
///
/// A `BTreeMap` so that iterating the groups is always in sorted device-id
/// order, which keeps the flattened pipeline output reproducible run to run.
pub type DeviceGroups = BTreeMap<String, Vec<Sample>>;

/// Group samples by device identifier.
///
/// Within each bucket samples keep their relative input order, which the
/// stable chronological sort relies on to break timestamp ties. An empty
/// input yields an empty map.
///
/// # Example
/// ```
/// use chrono::DateTime;
/// use track_processor::{group_by_device, Sample};
///
/// let t = DateTime::parse_from_rfc3339("2023-03-01T12:00:00Z").unwrap();
/// let groups = group_by_device(vec![
///     Sample::new("b", 1.0, 1.0, t, 2),
///     Sample::new("a", 2.0, 2.0, t, 3),
///     Sample::new("b", 3.0, 3.0, t, 4),
/// ]);
///
/// assert_eq!(groups.keys().collect::<Vec<_>>(), ["a", "b"]);
/// assert_eq!(groups["b"].len(), 2);
/// ```
pub fn group_by_device<I>(samples: I) -> DeviceGroups
where
    I: IntoIterator<Item = Sample>,
{
    let mut groups = DeviceGroups::new();
    for sample in samples {
        groups
            .entry(sample.device_id.clone())
            .or_default()
            .push(sample);
    }
    groups
}

/// Total number of samples across all groups.
pub fn sample_count(groups: &DeviceGroups) -> usize {
    groups.values().map(Vec::len).sum()
}
