//! Enumeration of the points a light table is sampled at.
//!
//! The order of the returned points is part of the contract: simulations are
//! launched and results read back in exactly this order.

use log::debug;
use lt_core::{DetectorSpec, ErrorInfo, LtError, Pitch, SamplePoint, SignalKind, TableKind};

/// Upper bound on the points of one tracking table.
pub const MAX_TRACKING_POINTS: i64 = 10_000_000;

/// Samples the points of a table of the given kind.
pub fn sample_points(
    detector: &DetectorSpec,
    table: TableKind,
    signal: SignalKind,
    pitch: &Pitch,
    max_radial_distance: f64,
) -> Result<Vec<SamplePoint>, LtError> {
    let points = match table {
        TableKind::Energy => sample_energy_points(detector, signal, pitch)?,
        TableKind::Tracking => sample_tracking_points(detector, pitch, max_radial_distance)?,
    };
    debug!("sampled {} {table} points", points.len());
    Ok(points)
}

/// Cartesian grid over the active cross section.
///
/// Points on the active radius itself are excluded. S2 tables get a single
/// depth in the middle of the EL gap; S1 tables repeat every (x, y) over the
/// whole drift length.
pub fn sample_energy_points(
    detector: &DetectorSpec,
    signal: SignalKind,
    pitch: &Pitch,
) -> Result<Vec<SamplePoint>, LtError> {
    let pitch = pitch.quantize()?;
    let radius = detector.active_radius.trunc() as i64;
    let length = detector.drift_length().trunc() as i64;
    let s2_depth = -(detector.el_gap.trunc()) / 2.0;

    let mut points = Vec::new();
    for x in stepped(-radius, radius, pitch.x) {
        for y in stepped(-radius, radius, pitch.y) {
            if x * x + y * y >= radius * radius {
                continue;
            }
            match signal {
                SignalKind::S2 => points.push(SamplePoint::new(x as f64, y as f64, s2_depth)),
                SignalKind::S1 => {
                    for z in stepped(0, length, pitch.z) {
                        points.push(SamplePoint::new(x as f64, y as f64, z as f64));
                    }
                }
            }
        }
    }
    Ok(points)
}

/// Radial line starting at the reference sensor, sliced in depth across the
/// EL gap.
///
/// Radial offsets run from 0 up to the first multiple of the pitch reaching
/// `max_radial_distance`. Only slices that fit entirely inside the gap are
/// sampled, each at its centre.
pub fn sample_tracking_points(
    detector: &DetectorSpec,
    pitch: &Pitch,
    max_radial_distance: f64,
) -> Result<Vec<SamplePoint>, LtError> {
    let pitch = pitch.quantize()?;
    let el_gap = detector.el_gap.trunc() as i64;
    if pitch.x != pitch.y {
        return Err(LtError::invalid_pitch(format!(
            "pitch_x ({}) must be equal to pitch_y ({}) for tracking tables",
            pitch.x, pitch.y
        )));
    }
    if pitch.z > el_gap {
        return Err(LtError::invalid_pitch(format!(
            "pitch_z ({}) must be equal or lower than the EL gap ({el_gap})",
            pitch.z
        )));
    }
    if !(max_radial_distance.is_finite() && max_radial_distance >= 0.0) {
        return Err(LtError::Config(
            ErrorInfo::new("invalid-distance", "maximum radial distance must be non-negative")
                .with_context("value", max_radial_distance.to_string()),
        ));
    }

    let steps = (max_radial_distance / pitch.x as f64).ceil() + 1.0;
    let slices = el_gap / pitch.z;
    let total = (steps <= MAX_TRACKING_POINTS as f64)
        .then(|| (steps as i64).checked_mul(slices))
        .flatten()
        .filter(|total| *total <= MAX_TRACKING_POINTS);
    let Some(total) = total else {
        return Err(LtError::Config(
            ErrorInfo::new("invalid-distance", "maximum radial distance gives too many points")
                .with_context("value", max_radial_distance.to_string())
                .with_context("limit", MAX_TRACKING_POINTS.to_string()),
        ));
    };
    let radial_steps = steps as i64;
    let sensor = detector.ref_sensor;

    let mut points = Vec::with_capacity(total as usize);
    for step in 0..radial_steps {
        let offset = (step * pitch.x) as f64;
        for slice in 0..slices {
            let depth = pitch.z as f64 / 2.0 + (slice * pitch.z) as f64;
            points.push(SamplePoint::new(sensor.x + offset, sensor.y, -depth));
        }
    }
    Ok(points)
}

fn stepped(start: i64, end: i64, step: i64) -> impl Iterator<Item = i64> {
    (start..end).step_by(step as usize)
}

#[cfg(test)]
mod tests {
    use lt_core::RefSensor;

    use super::*;

    fn detector(radius: f64) -> DetectorSpec {
        DetectorSpec {
            active_radius: radius,
            active_length: 30.0,
            buffer_length: 5.0,
            el_gap: 6.0,
            ref_sensor: RefSensor {
                id: 1,
                x: 25.0,
                y: 25.0,
            },
        }
    }

    #[test]
    fn boundary_points_are_excluded() {
        let points =
            sample_energy_points(&detector(10.0), SignalKind::S2, &Pitch::new(10.0, 10.0, 10.0))
                .expect("points");
        assert_eq!(points, vec![SamplePoint::new(0.0, 0.0, -3.0)]);
    }

    #[test]
    fn s1_points_cover_the_drift_length() {
        let points =
            sample_energy_points(&detector(10.0), SignalKind::S1, &Pitch::new(10.0, 10.0, 10.0))
                .expect("points");
        let depths: Vec<f64> = points.iter().map(|p| p.z).collect();
        assert_eq!(depths, vec![0.0, 10.0, 20.0, 30.0]);
    }

    #[test]
    fn energy_order_is_x_then_y_then_z() {
        let points =
            sample_energy_points(&detector(20.0), SignalKind::S1, &Pitch::new(10.0, 10.0, 20.0))
                .expect("points");
        let mut sorted = points.clone();
        sorted.sort_by(|a, b| {
            (a.x, a.y, a.z)
                .partial_cmp(&(b.x, b.y, b.z))
                .expect("finite coordinates")
        });
        assert_eq!(points, sorted);
        assert_eq!(points[0], SamplePoint::new(-10.0, -10.0, 0.0));
    }

    #[test]
    fn tracking_points_start_at_the_reference_sensor() {
        let points = sample_tracking_points(&detector(10.0), &Pitch::new(5.0, 5.0, 2.0), 10.0)
            .expect("points");
        assert_eq!(points.len(), 3 * 3);
        assert_eq!(points[0], SamplePoint::new(25.0, 25.0, -1.0));
        assert_eq!(points[2], SamplePoint::new(25.0, 25.0, -5.0));
        assert_eq!(points[8], SamplePoint::new(35.0, 25.0, -5.0));
    }

    #[test]
    fn tracking_distance_overshoots_to_cover_the_boundary() {
        let points = sample_tracking_points(&detector(10.0), &Pitch::new(4.0, 4.0, 6.0), 10.0)
            .expect("points");
        let offsets: Vec<f64> = points.iter().map(|p| p.x - 25.0).collect();
        assert_eq!(offsets, vec![0.0, 4.0, 8.0, 12.0]);
    }

    #[test]
    fn tracking_rejects_unbounded_distances() {
        for distance in [1.0e300, f64::MAX, 2.0e7] {
            let err = sample_tracking_points(&detector(10.0), &Pitch::new(1.0, 1.0, 1.0), distance)
                .unwrap_err();
            assert_eq!(err.info().code, "invalid-distance");
        }
    }

    #[test]
    fn tracking_rejects_inconsistent_pitch() {
        let err = sample_tracking_points(&detector(10.0), &Pitch::new(2.0, 3.0, 1.0), 10.0)
            .unwrap_err();
        assert_eq!(err.info().code, "invalid-pitch");
        let err = sample_tracking_points(&detector(10.0), &Pitch::new(2.0, 2.0, 7.0), 10.0)
            .unwrap_err();
        assert_eq!(err.info().code, "invalid-pitch");
    }
}
