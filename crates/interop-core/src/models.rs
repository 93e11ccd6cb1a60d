//! Core data models for the interoperability server.
//!
//! Units: latitude/longitude in decimal degrees, altitudes and obstacle
//! dimensions in feet (MSL for altitudes), obstacle speeds in knots.
//! Every constructor validates its inputs so invalid records never exist.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::path::WaypointPath;
use crate::spatial::{distance_3d, haversine_distance_ft, knots_to_feet_per_sec};

/// Rejection reasons for invalid model values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("latitude {0} is outside [-90, 90]")]
    InvalidLatitude(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    InvalidLongitude(f64),
    #[error("altitude {0} is not a finite number")]
    InvalidAltitude(f64),
    #[error("{field} must be strictly positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },
    #[error("moving obstacle requires at least one waypoint")]
    NoWaypoints,
    #[error("duplicate waypoint order {0}")]
    DuplicateWaypointOrder(i64),
    #[error("team message is {0} characters, limit is {max}", max = MAX_TEAM_MSG_CHARS)]
    MessageTooLong(usize),
}

/// Longest team message a [`ServerInfo`] may carry.
pub const MAX_TEAM_MSG_CHARS: usize = 100;

fn require_positive(field: &'static str, value: f64) -> Result<f64, ModelError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ModelError::NonPositive { field, value })
    }
}

/// Latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GpsPosition {
    latitude: f64,
    longitude: f64,
}

impl GpsPosition {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ModelError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(ModelError::InvalidLatitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(ModelError::InvalidLongitude(longitude));
        }
        Ok(Self { latitude, longitude })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Great-circle distance to another position in feet.
    pub fn distance_to(&self, other: &GpsPosition) -> f64 {
        haversine_distance_ft(self.latitude, self.longitude, other.latitude, other.longitude)
    }
}

/// GPS position with an altitude in feet above mean sea level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AerialPosition {
    gps_position: GpsPosition,
    altitude_msl: f64,
}

impl AerialPosition {
    pub fn new(gps_position: GpsPosition, altitude_msl: f64) -> Result<Self, ModelError> {
        if !altitude_msl.is_finite() {
            return Err(ModelError::InvalidAltitude(altitude_msl));
        }
        Ok(Self {
            gps_position,
            altitude_msl,
        })
    }

    pub fn gps_position(&self) -> &GpsPosition {
        &self.gps_position
    }

    pub fn latitude(&self) -> f64 {
        self.gps_position.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.gps_position.longitude
    }

    pub fn altitude_msl(&self) -> f64 {
        self.altitude_msl
    }

    /// Straight-line distance in feet, combining great-circle and altitude separation.
    pub fn distance_3d(&self, other: &AerialPosition) -> f64 {
        distance_3d(
            self.gps_position.distance_to(&other.gps_position),
            self.altitude_msl - other.altitude_msl,
        )
    }

    /// Linear blend between two positions, `ratio` in `[0, 1]`.
    /// Convex combinations of valid coordinates stay in range.
    pub(crate) fn lerp(&self, other: &AerialPosition, ratio: f64) -> AerialPosition {
        let ratio = ratio.clamp(0.0, 1.0);
        let blend = |a: f64, b: f64| a + (b - a) * ratio;
        AerialPosition {
            gps_position: GpsPosition {
                latitude: blend(self.latitude(), other.latitude()),
                longitude: blend(self.longitude(), other.longitude()),
            },
            altitude_msl: blend(self.altitude_msl, other.altitude_msl),
        }
    }
}

/// One ordered point of a moving obstacle's patrol path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Waypoint {
    pub order: i64,
    pub position: AerialPosition,
}

impl Waypoint {
    pub fn new(order: i64, position: AerialPosition) -> Self {
        Self { order, position }
    }
}

/// Fixed cylinder standing on the ground.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationaryObstacle {
    centroid: GpsPosition,
    cylinder_radius: f64,
    cylinder_height: f64,
}

impl StationaryObstacle {
    pub fn new(
        centroid: GpsPosition,
        cylinder_radius: f64,
        cylinder_height: f64,
    ) -> Result<Self, ModelError> {
        Ok(Self {
            centroid,
            cylinder_radius: require_positive("cylinder_radius", cylinder_radius)?,
            cylinder_height: require_positive("cylinder_height", cylinder_height)?,
        })
    }

    pub fn centroid(&self) -> &GpsPosition {
        &self.centroid
    }

    pub fn cylinder_radius(&self) -> f64 {
        self.cylinder_radius
    }

    pub fn cylinder_height(&self) -> f64 {
        self.cylinder_height
    }

    /// Whether the point lies inside the cylinder (edges inclusive).
    pub fn contains_position(&self, point: &AerialPosition) -> bool {
        let altitude = point.altitude_msl();
        if altitude < 0.0 || altitude > self.cylinder_height {
            return false;
        }
        self.centroid.distance_to(point.gps_position()) <= self.cylinder_radius
    }
}

/// Sphere patrolling a closed waypoint loop at a constant average speed.
///
/// The current position is never stored; it is derived from the path for a
/// given instant with [`MovingObstacle::position_at`].
#[derive(Debug, Clone, PartialEq)]
pub struct MovingObstacle {
    sphere_radius: f64,
    speed_avg: f64,
    waypoints: Vec<Waypoint>,
    path: WaypointPath,
}

impl MovingObstacle {
    /// Build a moving obstacle. Waypoints may be given in any order; they are
    /// sorted by `order`, which must be unique.
    pub fn new(
        sphere_radius: f64,
        speed_avg: f64,
        mut waypoints: Vec<Waypoint>,
    ) -> Result<Self, ModelError> {
        let sphere_radius = require_positive("sphere_radius", sphere_radius)?;
        let speed_avg = require_positive("speed_avg", speed_avg)?;
        if waypoints.is_empty() {
            return Err(ModelError::NoWaypoints);
        }

        waypoints.sort_by_key(|waypoint| waypoint.order);
        if let Some(pair) = waypoints.windows(2).find(|pair| pair[0].order == pair[1].order) {
            return Err(ModelError::DuplicateWaypointOrder(pair[0].order));
        }

        let path = WaypointPath::closed_loop(waypoints.iter().map(|w| w.position).collect())?;
        Ok(Self {
            sphere_radius,
            speed_avg,
            waypoints,
            path,
        })
    }

    pub fn sphere_radius(&self) -> f64 {
        self.sphere_radius
    }

    /// Average speed in knots.
    pub fn speed_avg(&self) -> f64 {
        self.speed_avg
    }

    /// Waypoints sorted by traversal order.
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn path(&self) -> &WaypointPath {
        &self.path
    }

    /// Position at `now`, measuring travel time from the shared `epoch` anchor.
    pub fn position_at(&self, now: DateTime<Utc>, epoch: DateTime<Utc>) -> AerialPosition {
        let elapsed = now - epoch;
        let elapsed_secs = match elapsed.num_microseconds() {
            Some(micros) => micros as f64 / 1_000_000.0,
            None => elapsed.num_milliseconds() as f64 / 1_000.0,
        };
        let travelled_ft = knots_to_feet_per_sec(self.speed_avg) * elapsed_secs;
        self.path.position_at_distance(travelled_ft)
    }

    /// Whether the point lies inside the sphere at `now`.
    pub fn contains_position(
        &self,
        now: DateTime<Utc>,
        epoch: DateTime<Utc>,
        point: &AerialPosition,
    ) -> bool {
        self.position_at(now, epoch).distance_3d(point) <= self.sphere_radius
    }
}

/// Append-only record of one obstacle data access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleAccessLog {
    pub user_id: i64,
    pub timestamp: DateTime<Utc>,
}

/// Append-only record of one server info access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerInfoAccessLog {
    pub user_id: i64,
    pub timestamp: DateTime<Utc>,
}

/// Static message that teams must retrieve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub timestamp: DateTime<Utc>,
    pub team_msg: String,
}

/// Wire form of [`ServerInfo`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerInfoResponse {
    pub message: String,
    pub message_timestamp: String,
}

impl ServerInfo {
    pub fn new(team_msg: impl Into<String>, timestamp: DateTime<Utc>) -> Result<Self, ModelError> {
        let team_msg = team_msg.into();
        let chars = team_msg.chars().count();
        if chars > MAX_TEAM_MSG_CHARS {
            return Err(ModelError::MessageTooLong(chars));
        }
        Ok(Self {
            timestamp,
            team_msg,
        })
    }

    pub fn to_response(&self) -> ServerInfoResponse {
        ServerInfoResponse {
            message: self.team_msg.clone(),
            message_timestamp: self.timestamp.to_rfc3339(),
        }
    }
}
