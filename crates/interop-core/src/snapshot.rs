//! Obstacle snapshots: every obstacle resolved to a single instant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{MovingObstacle, StationaryObstacle};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationaryObstacleView {
    pub latitude: f64,
    pub longitude: f64,
    pub cylinder_radius: f64,
    pub cylinder_height: f64,
}

impl From<&StationaryObstacle> for StationaryObstacleView {
    fn from(obstacle: &StationaryObstacle) -> Self {
        Self {
            latitude: obstacle.centroid().latitude(),
            longitude: obstacle.centroid().longitude(),
            cylinder_radius: obstacle.cylinder_radius(),
            cylinder_height: obstacle.cylinder_height(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovingObstacleView {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_msl: f64,
    pub sphere_radius: f64,
}

impl MovingObstacleView {
    pub fn resolve(obstacle: &MovingObstacle, now: DateTime<Utc>, epoch: DateTime<Utc>) -> Self {
        let position = obstacle.position_at(now, epoch);
        Self {
            latitude: position.latitude(),
            longitude: position.longitude(),
            altitude_msl: position.altitude_msl(),
            sphere_radius: obstacle.sphere_radius(),
        }
    }
}

/// Response payload of the obstacle endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleSnapshot {
    pub stationary_obstacles: Vec<StationaryObstacleView>,
    pub moving_obstacles: Vec<MovingObstacleView>,
}

/// Resolve all obstacles at `now`. Pure: the same inputs always produce the
/// same snapshot, so concurrent callers at one instant agree.
pub fn build_snapshot(
    stationary: &[StationaryObstacle],
    moving: &[MovingObstacle],
    now: DateTime<Utc>,
    epoch: DateTime<Utc>,
) -> ObstacleSnapshot {
    ObstacleSnapshot {
        stationary_obstacles: stationary.iter().map(StationaryObstacleView::from).collect(),
        moving_obstacles: moving
            .iter()
            .map(|obstacle| MovingObstacleView::resolve(obstacle, now, epoch))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::default_obstacle_epoch;
    use crate::models::{AerialPosition, GpsPosition, Waypoint};
    use chrono::{Duration, TimeZone};

    fn stationary(lat: f64, lon: f64, radius: f64, height: f64) -> StationaryObstacle {
        StationaryObstacle::new(GpsPosition::new(lat, lon).unwrap(), radius, height).unwrap()
    }

    fn moving(points: &[(f64, f64, f64)]) -> MovingObstacle {
        let waypoints = points
            .iter()
            .enumerate()
            .map(|(order, &(lat, lon, alt))| {
                let gps = GpsPosition::new(lat, lon).unwrap();
                Waypoint::new(order as i64, AerialPosition::new(gps, alt).unwrap())
            })
            .collect();
        MovingObstacle::new(100.0, 40.0, waypoints).unwrap()
    }

    fn competition_obstacles() -> (Vec<StationaryObstacle>, Vec<MovingObstacle>) {
        let stationary = vec![
            stationary(38.142233, -76.434082, 300.0, 500.0),
            stationary(38.442233, -76.834082, 100.0, 750.0),
        ];
        let moving = vec![
            moving(&[(38.142233, -76.434082, 300.0), (38.141878, -76.425198, 700.0)]),
            moving(&[
                (38.145405, -76.428310, 100.0),
                (38.146582, -76.424099, 200.0),
                (38.144662, -76.427634, 300.0),
                (38.147729, -76.419185, 200.0),
                (38.147573, -76.420832, 100.0),
                (38.148522, -76.419507, 750.0),
            ]),
        ];
        (stationary, moving)
    }

    /// Distance from `position` to the nearest point of the loop, sampled finely.
    fn distance_to_path(obstacle: &MovingObstacle, view: &MovingObstacleView) -> f64 {
        let gps = GpsPosition::new(view.latitude, view.longitude).unwrap();
        let point = AerialPosition::new(gps, view.altitude_msl).unwrap();
        let path = obstacle.path();
        let steps = 20_000;
        (0..steps)
            .map(|step| {
                let distance = path.total_length_ft() * step as f64 / steps as f64;
                path.position_at_distance(distance).distance_3d(&point)
            })
            .fold(f64::INFINITY, f64::min)
    }

    #[test]
    fn stationary_values_are_passed_through() {
        let (stationary, moving) = competition_obstacles();
        let now = Utc.with_ymd_and_hms(2015, 6, 1, 12, 0, 0).unwrap();
        let snapshot = build_snapshot(&stationary, &moving, now, default_obstacle_epoch());

        assert_eq!(snapshot.stationary_obstacles.len(), 2);
        assert_eq!(
            snapshot.stationary_obstacles[1],
            StationaryObstacleView {
                latitude: 38.442233,
                longitude: -76.834082,
                cylinder_radius: 100.0,
                cylinder_height: 750.0,
            }
        );
    }

    #[test]
    fn moving_positions_lie_on_path() {
        let (stationary, moving) = competition_obstacles();
        let epoch = default_obstacle_epoch();
        let start = Utc.with_ymd_and_hms(2015, 6, 1, 12, 0, 0).unwrap();

        for offset_secs in [0, 3, 17, 61, 600, 3_601] {
            let now = start + Duration::seconds(offset_secs);
            let snapshot = build_snapshot(&stationary, &moving, now, epoch);
            assert_eq!(snapshot.moving_obstacles.len(), 2);
            for (obstacle, view) in moving.iter().zip(&snapshot.moving_obstacles) {
                assert_eq!(view.sphere_radius, 100.0);
                let off_path = distance_to_path(obstacle, view);
                assert!(off_path < 5.0, "position {off_path} ft off path at +{offset_secs}s");
            }
        }
    }

    #[test]
    fn moving_obstacle_advances_at_average_speed() {
        let (_, moving) = competition_obstacles();
        let epoch = Utc.with_ymd_and_hms(2015, 6, 1, 12, 0, 0).unwrap();
        let obstacle = &moving[0];
        // 40 knots is about 67.5 ft/s; the first leg is well over 2,500 ft long.
        let first = obstacle.position_at(epoch, epoch);
        let later = obstacle.position_at(epoch + Duration::seconds(10), epoch);
        let travelled = first.distance_3d(&later);
        assert!((travelled - 675.1).abs() < 5.0, "travelled {travelled} ft");
    }

    #[test]
    fn same_instant_yields_identical_snapshots() {
        let (stationary, moving) = competition_obstacles();
        let epoch = default_obstacle_epoch();
        let now = Utc.with_ymd_and_hms(2015, 6, 1, 12, 34, 56).unwrap();
        let expected = build_snapshot(&stationary, &moving, now, epoch);

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| build_snapshot(&stationary, &moving, now, epoch)))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });
    }

    #[test]
    fn serializes_with_wire_field_names() {
        let (stationary, moving) = competition_obstacles();
        let now = Utc.with_ymd_and_hms(2015, 6, 1, 12, 0, 0).unwrap();
        let json =
            serde_json::to_value(build_snapshot(&stationary, &moving, now, now)).unwrap();

        let first_stationary = &json["stationary_obstacles"][0];
        for field in ["latitude", "longitude", "cylinder_radius", "cylinder_height"] {
            assert!(first_stationary.get(field).is_some(), "missing {field}");
        }
        let first_moving = &json["moving_obstacles"][0];
        for field in ["latitude", "longitude", "altitude_msl", "sphere_radius"] {
            assert!(first_moving.get(field).is_some(), "missing {field}");
        }
        assert_eq!(first_moving["altitude_msl"], 300.0);
    }
}
