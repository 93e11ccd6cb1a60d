//! Spatial math for obstacle distances.
//!
//! All distances are in feet to match the competition's obstacle units.

/// Mean earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Feet per meter.
pub const FEET_PER_METER: f64 = 3.280_839_895;

/// Feet per second for one knot.
pub const FEET_PER_SEC_PER_KNOT: f64 = 1.687_809_857;

/// Calculate distance between two points in meters using Haversine formula.
///
/// # Arguments
/// * `lat1`, `lon1` - First point coordinates in decimal degrees
/// * `lat2`, `lon2` - Second point coordinates in decimal degrees
///
/// # Returns
/// Distance in meters
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Great-circle distance between two points in feet.
pub fn haversine_distance_ft(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    haversine_distance(lat1, lon1, lat2, lon2) * FEET_PER_METER
}

/// Straight-line combination of a horizontal and a vertical separation.
pub fn distance_3d(horizontal: f64, vertical: f64) -> f64 {
    horizontal.hypot(vertical)
}

/// Convert an average speed in knots to feet per second.
pub fn knots_to_feet_per_sec(knots: f64) -> f64 {
    knots * FEET_PER_SEC_PER_KNOT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haversine_zero_for_same_point() {
        assert_eq!(haversine_distance(38.14, -76.43, 38.14, -76.43), 0.0);
    }

    #[test]
    fn haversine_one_degree_latitude() {
        let dist = haversine_distance(38.0, -76.0, 39.0, -76.0);
        // One degree of arc on a 6371 km sphere.
        assert!((dist - 111_194.9).abs() < 1.0, "got {dist}");
        let dist_ft = haversine_distance_ft(38.0, -76.0, 39.0, -76.0);
        assert!((dist_ft - dist * FEET_PER_METER).abs() < 1e-6);
    }

    #[test]
    fn distance_3d_is_pythagorean() {
        assert!((distance_3d(300.0, 400.0) - 500.0).abs() < 1e-9);
    }

    #[test]
    fn knots_conversion() {
        assert!((knots_to_feet_per_sec(40.0) - 67.512_394_28).abs() < 1e-6);
    }
}
