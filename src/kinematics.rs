//! Kinematics derivation.
//!
//! Walks a chronologically ordered trajectory and computes, for every fix
//! after the first, the elapsed time, great-circle distance and average speed
//! relative to the immediately preceding fix.

use chrono::TimeDelta;

use crate::geo_utils::haversine_distance;
use crate::{DerivedSample, Predecessor, Sample};

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Derive kinematics for one device's chronologically ordered samples.
///
/// Returns exactly one [`DerivedSample`] per input sample, in the same order.
/// The first gets no predecessor and zeroed kinematics. Every later sample
/// points at its immediate predecessor by the predecessor's original row.
///
/// Order is not validated: out-of-order input produces negative elapsed time,
/// which [`speed_kmh`] maps to a speed of 0.
pub fn derive_kinematics(samples: &[Sample]) -> Vec<DerivedSample> {
    let mut derived = Vec::with_capacity(samples.len());

    let Some(first) = samples.first() else {
        return derived;
    };
    derived.push(DerivedSample::first(first.clone()));

    for pair in samples.windows(2) {
        let (prev, current) = (&pair[0], &pair[1]);

        let elapsed_seconds = elapsed_seconds(current.timestamp - prev.timestamp);
        let distance_km = haversine_distance(&prev.point(), &current.point());

        derived.push(DerivedSample {
            sample: current.clone(),
            predecessor: Some(Predecessor::from(prev)),
            elapsed_seconds,
            distance_km,
            speed_kmh: speed_kmh(distance_km, elapsed_seconds),
        });
    }

    derived
}

/// Average speed in km/h for a distance covered over an elapsed time.
///
/// Zero or negative elapsed time yields 0 rather than an infinite or
/// backwards velocity.
///
/// # Example
/// ```
/// use track_processor::speed_kmh;
///
/// assert_eq!(speed_kmh(1.0, 3600.0), 1.0);
/// assert_eq!(speed_kmh(5.0, 0.0), 0.0);
/// assert_eq!(speed_kmh(5.0, -10.0), 0.0);
/// ```
pub fn speed_kmh(distance_km: f64, elapsed_seconds: f64) -> f64 {
    if elapsed_seconds > 0.0 {
        distance_km / (elapsed_seconds / SECONDS_PER_HOUR)
    } else {
        0.0
    }
}

/// Fractional seconds of a time delta, at nanosecond precision where it fits.
fn elapsed_seconds(delta: TimeDelta) -> f64 {
    match delta.num_nanoseconds() {
        Some(nanos) => nanos as f64 / 1e9,
        None => delta.num_seconds() as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration};

    fn t0() -> crate::Timestamp {
        DateTime::parse_from_rfc3339("2023-03-01T12:00:00Z").unwrap()
    }

    #[test]
    fn test_empty_trajectory() {
        assert!(derive_kinematics(&[]).is_empty());
    }

    #[test]
    fn test_single_sample_has_no_predecessor() {
        let derived = derive_kinematics(&[Sample::new("d1", 40.0, -74.0, t0(), 2)]);
        assert_eq!(derived.len(), 1);
        assert_eq!(derived[0].predecessor_row(), 0);
        assert_eq!(derived[0].speed_kmh, 0.0);
    }

    #[test]
    fn test_two_samples_one_minute_apart() {
        let samples = vec![
            Sample::new("d1", 40.0, -74.0, t0(), 2),
            Sample::new("d1", 40.01, -74.0, t0() + Duration::seconds(60), 3),
        ];
        let derived = derive_kinematics(&samples);

        assert_eq!(derived.len(), 2);
        let second = &derived[1];
        assert_eq!(second.elapsed_seconds, 60.0);
        assert!((second.distance_km - 1.1119).abs() < 0.001);
        assert!((second.speed_kmh - 66.7).abs() < 0.1);
        assert_eq!(second.predecessor_row(), 2);

        let pred = second.predecessor.as_ref().unwrap();
        assert_eq!(pred.latitude, 40.0);
        assert_eq!(pred.longitude, -74.0);
        assert_eq!(pred.timestamp, t0());
    }

    #[test]
    fn test_predecessor_uses_original_row_not_index() {
        let samples = vec![
            Sample::new("d1", 0.0, 0.0, t0(), 17),
            Sample::new("d1", 0.0, 0.01, t0() + Duration::seconds(10), 4),
            Sample::new("d1", 0.0, 0.02, t0() + Duration::seconds(20), 9),
        ];
        let derived = derive_kinematics(&samples);
        let preds: Vec<u64> = derived.iter().map(|d| d.predecessor_row()).collect();
        assert_eq!(preds, vec![0, 17, 4]);
    }

    #[test]
    fn test_equal_timestamps_yield_zero_speed() {
        let samples = vec![
            Sample::new("d1", 40.0, -74.0, t0(), 2),
            Sample::new("d1", 40.01, -74.0, t0(), 3),
        ];
        let derived = derive_kinematics(&samples);
        assert_eq!(derived[1].elapsed_seconds, 0.0);
        assert!(derived[1].distance_km > 0.0);
        assert_eq!(derived[1].speed_kmh, 0.0);
    }

    #[test]
    fn test_unordered_input_gives_negative_elapsed() {
        let samples = vec![
            Sample::new("d1", 40.0, -74.0, t0() + Duration::seconds(30), 2),
            Sample::new("d1", 40.01, -74.0, t0(), 3),
        ];
        let derived = derive_kinematics(&samples);
        assert_eq!(derived[1].elapsed_seconds, -30.0);
        assert_eq!(derived[1].speed_kmh, 0.0);
    }

    #[test]
    fn test_sub_second_elapsed() {
        let samples = vec![
            Sample::new("d1", 0.0, 0.0, t0(), 2),
            Sample::new("d1", 0.0, 0.0, t0() + Duration::milliseconds(250), 3),
        ];
        let derived = derive_kinematics(&samples);
        assert!((derived[1].elapsed_seconds - 0.25).abs() < 1e-12);
    }
}
