//! Closed-loop waypoint paths and distance-based interpolation.
//!
//! A path visits its points in order and then returns from the last point to
//! the first, so a moving obstacle patrols it continuously.

use crate::models::{AerialPosition, ModelError};

#[derive(Debug, Clone, PartialEq)]
pub struct WaypointPath {
    points: Vec<AerialPosition>,
    /// `cumulative_ft[i]` is the distance from the first point to the start of
    /// segment `i`; the final entry is the loop length.
    cumulative_ft: Vec<f64>,
}

impl WaypointPath {
    /// Build a closed loop over `points` (already in traversal order).
    pub fn closed_loop(points: Vec<AerialPosition>) -> Result<Self, ModelError> {
        if points.is_empty() {
            return Err(ModelError::NoWaypoints);
        }

        let count = points.len();
        let mut cumulative_ft = Vec::with_capacity(count + 1);
        let mut total = 0.0;
        cumulative_ft.push(total);
        for index in 0..count {
            let start = &points[index];
            let end = &points[(index + 1) % count];
            total += start.distance_3d(end);
            cumulative_ft.push(total);
        }

        Ok(Self {
            points,
            cumulative_ft,
        })
    }

    pub fn points(&self) -> &[AerialPosition] {
        &self.points
    }

    /// Number of segments, including the closing one.
    pub fn segment_count(&self) -> usize {
        self.points.len()
    }

    /// Length of one full loop in feet.
    pub fn total_length_ft(&self) -> f64 {
        self.cumulative_ft.last().copied().unwrap_or(0.0)
    }

    /// Endpoints of segment `index`.
    pub fn segment(&self, index: usize) -> Option<(&AerialPosition, &AerialPosition)> {
        let count = self.points.len();
        if index >= count {
            return None;
        }
        Some((&self.points[index], &self.points[(index + 1) % count]))
    }

    /// Position after travelling `distance_ft` along the loop from the first
    /// point. Distances beyond one loop wrap; negative distances wrap backwards.
    ///
    /// A loop with zero length (all points coincident) reports the first point.
    pub fn position_at_distance(&self, distance_ft: f64) -> AerialPosition {
        let first = self.points[0];
        let total = self.total_length_ft();
        if total <= 0.0 || !distance_ft.is_finite() {
            return first;
        }

        let mut travelled = distance_ft.rem_euclid(total);
        if travelled >= total {
            travelled = 0.0;
        }

        let count = self.points.len();
        let segment = self
            .cumulative_ft
            .partition_point(|&start| start <= travelled)
            .saturating_sub(1)
            .min(count - 1);

        let Some((start, end)) = self.segment(segment) else {
            return first;
        };
        let segment_start = self.cumulative_ft[segment];
        let length = self.cumulative_ft[segment + 1] - segment_start;
        if length <= 0.0 {
            return *start;
        }

        start.lerp(end, (travelled - segment_start) / length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GpsPosition;

    fn aerial(lat: f64, lon: f64, alt: f64) -> AerialPosition {
        AerialPosition::new(GpsPosition::new(lat, lon).unwrap(), alt).unwrap()
    }

    fn assert_close(left: f64, right: f64, tolerance: f64) {
        let delta = (left - right).abs();
        assert!(
            delta <= tolerance,
            "expected {left} ~= {right} within {tolerance}, delta={delta}"
        );
    }

    #[test]
    fn loop_length_includes_return_leg() {
        let a = aerial(38.0, -76.0, 0.0);
        let b = aerial(38.0, -76.0, 400.0);
        let path = WaypointPath::closed_loop(vec![a, b]).unwrap();
        assert_eq!(path.segment_count(), 2);
        assert_close(path.total_length_ft(), 800.0, 1e-9);
    }

    #[test]
    fn interpolates_within_segment() {
        let a = aerial(38.0, -76.0, 0.0);
        let b = aerial(38.0, -76.0, 400.0);
        let path = WaypointPath::closed_loop(vec![a, b]).unwrap();

        assert_close(path.position_at_distance(100.0).altitude_msl(), 100.0, 1e-9);
        assert_close(path.position_at_distance(400.0).altitude_msl(), 400.0, 1e-9);
        // Return leg descends back towards the first point.
        assert_close(path.position_at_distance(700.0).altitude_msl(), 100.0, 1e-9);
    }

    #[test]
    fn wraps_beyond_one_loop_and_backwards() {
        let a = aerial(38.0, -76.0, 0.0);
        let b = aerial(38.0, -76.0, 400.0);
        let path = WaypointPath::closed_loop(vec![a, b]).unwrap();

        assert_close(path.position_at_distance(8_100.0).altitude_msl(), 100.0, 1e-6);
        assert_close(path.position_at_distance(-100.0).altitude_msl(), 100.0, 1e-9);
        assert_eq!(path.position_at_distance(800.0), a);
    }

    #[test]
    fn horizontal_interpolation_is_linear_in_coordinates() {
        let a = aerial(38.0, -76.0, 100.0);
        let b = aerial(38.01, -76.0, 100.0);
        let path = WaypointPath::closed_loop(vec![a, b]).unwrap();
        let half = path.total_length_ft() / 4.0;

        let position = path.position_at_distance(half);
        assert_close(position.latitude(), 38.005, 1e-9);
        assert_close(position.longitude(), -76.0, 1e-12);
    }

    #[test]
    fn single_point_path_stays_put() {
        let a = aerial(38.0, -76.0, 250.0);
        let path = WaypointPath::closed_loop(vec![a]).unwrap();
        assert_eq!(path.total_length_ft(), 0.0);
        assert_eq!(path.position_at_distance(12_345.0), a);
    }

    #[test]
    fn coincident_points_do_not_divide_by_zero() {
        let a = aerial(38.0, -76.0, 250.0);
        let path = WaypointPath::closed_loop(vec![a, a, a]).unwrap();
        assert_eq!(path.position_at_distance(99.0), a);
    }

    #[test]
    fn skips_zero_length_segments() {
        let a = aerial(38.0, -76.0, 0.0);
        let b = aerial(38.0, -76.0, 200.0);
        let path = WaypointPath::closed_loop(vec![a, a, b]).unwrap();
        assert_close(path.position_at_distance(50.0).altitude_msl(), 50.0, 1e-9);
        assert_close(path.position_at_distance(300.0).altitude_msl(), 100.0, 1e-9);
    }

    #[test]
    fn empty_path_rejected() {
        assert_eq!(
            WaypointPath::closed_loop(Vec::new()),
            Err(ModelError::NoWaypoints)
        );
    }
}
