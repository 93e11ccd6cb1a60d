//! Domain core of the interoperability server: obstacle models, closed-loop
//! path interpolation, snapshots, and access-control decisions.

pub mod access;
pub mod clock;
pub mod models;
pub mod path;
pub mod snapshot;
pub mod spatial;

pub use access::{require_principal, resolve_logging, AccessError, Principal};
pub use clock::{default_obstacle_epoch, Clock, FixedClock, SystemClock};
pub use models::{
    AerialPosition, GpsPosition, ModelError, MovingObstacle, ObstacleAccessLog, ServerInfo,
    ServerInfoAccessLog, ServerInfoResponse, StationaryObstacle, Waypoint,
};
pub use path::WaypointPath;
pub use snapshot::{build_snapshot, MovingObstacleView, ObstacleSnapshot, StationaryObstacleView};
pub use spatial::haversine_distance;
