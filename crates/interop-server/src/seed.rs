//! Competition seed documents.
//!
//! A seed document lists the users, the full obstacle set and an optional
//! team message. Applying it is all-or-nothing: the document is validated
//! through the core constructors first, then written in a single transaction.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use interop_core::{
    AerialPosition, GpsPosition, MovingObstacle, ServerInfo, StationaryObstacle, Waypoint,
};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::persistence::{self, obstacles, server_info, users};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SeedDocument {
    pub users: Vec<SeedUser>,
    pub stationary_obstacles: Vec<SeedStationary>,
    pub moving_obstacles: Vec<SeedMoving>,
    pub server_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SeedUser {
    pub username: String,
    pub session_token: String,
    #[serde(default)]
    pub is_superuser: bool,
}

#[derive(Debug, Deserialize)]
pub struct SeedStationary {
    pub latitude: f64,
    pub longitude: f64,
    pub cylinder_radius: f64,
    pub cylinder_height: f64,
}

#[derive(Debug, Deserialize)]
pub struct SeedMoving {
    pub sphere_radius: f64,
    pub speed_avg: f64,
    pub waypoints: Vec<SeedWaypoint>,
}

#[derive(Debug, Deserialize)]
pub struct SeedWaypoint {
    /// Defaults to the waypoint's index in the list.
    pub order: Option<i64>,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_msl: f64,
}

impl SeedStationary {
    fn to_model(&self) -> Result<StationaryObstacle> {
        let centroid = GpsPosition::new(self.latitude, self.longitude)?;
        Ok(StationaryObstacle::new(
            centroid,
            self.cylinder_radius,
            self.cylinder_height,
        )?)
    }
}

impl SeedMoving {
    fn to_model(&self) -> Result<MovingObstacle> {
        let waypoints = self
            .waypoints
            .iter()
            .enumerate()
            .map(|(index, wp)| -> Result<Waypoint> {
                let gps = GpsPosition::new(wp.latitude, wp.longitude)?;
                let position = AerialPosition::new(gps, wp.altitude_msl)?;
                Ok(Waypoint::new(wp.order.unwrap_or(index as i64), position))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(MovingObstacle::new(self.sphere_radius, self.speed_avg, waypoints)?)
    }
}

/// A seed document that passed validation.
#[derive(Debug)]
pub struct SeedPlan {
    pub users: Vec<SeedUser>,
    pub stationary: Vec<StationaryObstacle>,
    pub moving: Vec<MovingObstacle>,
    pub message: Option<ServerInfo>,
}

impl SeedDocument {
    /// Validate every entry. `now` stamps the team message.
    pub fn into_plan(self, now: DateTime<Utc>) -> Result<SeedPlan> {
        let stationary = self
            .stationary_obstacles
            .iter()
            .enumerate()
            .map(|(i, o)| o.to_model().with_context(|| format!("stationary obstacle #{}", i)))
            .collect::<Result<Vec<_>>>()?;
        let moving = self
            .moving_obstacles
            .iter()
            .enumerate()
            .map(|(i, o)| o.to_model().with_context(|| format!("moving obstacle #{}", i)))
            .collect::<Result<Vec<_>>>()?;
        let message = self
            .server_message
            .map(|msg| ServerInfo::new(msg, now))
            .transpose()?;

        Ok(SeedPlan {
            users: self.users,
            stationary,
            moving,
            message,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub stationary: usize,
    pub moving: usize,
    pub message: bool,
}

/// Write a validated plan in one transaction.
///
/// Obstacles are replaced by the plan's set. Users are matched by username,
/// so their ids and access records survive a re-seed. With `reset`, every
/// table is emptied first, audit records included.
pub async fn apply_seed(pool: &SqlitePool, plan: &SeedPlan, reset: bool) -> Result<SeedSummary> {
    let mut tx = pool.begin().await?;

    if reset {
        persistence::clear_all_tx(&mut tx).await?;
    } else {
        obstacles::clear_obstacles_tx(&mut tx).await?;
    }

    for user in &plan.users {
        users::upsert_user_tx(&mut tx, &user.username, &user.session_token, user.is_superuser)
            .await
            .with_context(|| format!("storing user {}", user.username))?;
    }
    for (i, obstacle) in plan.stationary.iter().enumerate() {
        obstacles::create_stationary_obstacle_tx(&mut tx, obstacle)
            .await
            .with_context(|| format!("storing stationary obstacle #{}", i))?;
    }
    for (i, obstacle) in plan.moving.iter().enumerate() {
        obstacles::create_moving_obstacle_tx(&mut tx, obstacle)
            .await
            .with_context(|| format!("storing moving obstacle #{}", i))?;
    }
    if let Some(info) = &plan.message {
        server_info::create_server_info_tx(&mut tx, info).await?;
    }

    tx.commit().await?;
    tracing::info!(
        users = plan.users.len(),
        stationary = plan.stationary.len(),
        moving = plan.moving.len(),
        "Seed applied"
    );

    Ok(SeedSummary {
        users: plan.users.len(),
        stationary: plan.stationary.len(),
        moving: plan.moving.len(),
        message: plan.message.is_some(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{access_logs, init_database};
    use chrono::TimeZone;
    use interop_core::ObstacleAccessLog;

    const DOCUMENT: &str = r#"{
        "users": [
            { "username": "team-alpha", "session_token": "alpha" },
            { "username": "judge", "session_token": "judge", "is_superuser": true }
        ],
        "stationary_obstacles": [
            { "latitude": 38.142233, "longitude": -76.434082, "cylinder_radius": 300, "cylinder_height": 500 }
        ],
        "moving_obstacles": [
            {
                "sphere_radius": 100,
                "speed_avg": 40,
                "waypoints": [
                    { "latitude": 38.142233, "longitude": -76.434082, "altitude_msl": 300 },
                    { "latitude": 38.141878, "longitude": -76.425198, "altitude_msl": 700 }
                ]
            }
        ],
        "server_message": "Fly safe"
    }"#;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2015, 6, 1, 12, 0, 0).unwrap()
    }

    fn plan(json: &str) -> SeedPlan {
        serde_json::from_str::<SeedDocument>(json)
            .unwrap()
            .into_plan(now())
            .unwrap()
    }

    #[tokio::test]
    async fn reseeding_replaces_obstacles_and_keeps_users() {
        let db = init_database(":memory:", 1).await.unwrap();
        let pool = db.pool();
        let plan = plan(DOCUMENT);

        let summary = apply_seed(pool, &plan, false).await.unwrap();
        assert_eq!(
            summary,
            SeedSummary {
                users: 2,
                stationary: 1,
                moving: 1,
                message: true
            }
        );
        let first_users = users::load_all_users(pool).await.unwrap();
        access_logs::record_obstacle_access(
            pool,
            &ObstacleAccessLog {
                user_id: first_users[0].id,
                timestamp: now(),
            },
        )
        .await
        .unwrap();

        apply_seed(pool, &plan, false).await.unwrap();

        let (stationary, moving) = obstacles::load_obstacles(pool).await.unwrap();
        assert_eq!(stationary, plan.stationary);
        assert_eq!(moving, plan.moving);
        let users_after = users::load_all_users(pool).await.unwrap();
        let ids = |rows: &[users::UserRow]| rows.iter().map(|u| u.id).collect::<Vec<_>>();
        assert_eq!(ids(&users_after), ids(&first_users));
        assert_eq!(access_logs::count_obstacle_accesses(pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn reset_clears_audit_records() {
        let db = init_database(":memory:", 1).await.unwrap();
        let pool = db.pool();
        let plan = plan(DOCUMENT);

        apply_seed(pool, &plan, false).await.unwrap();
        let user_id = users::load_all_users(pool).await.unwrap()[0].id;
        access_logs::record_obstacle_access(pool, &ObstacleAccessLog { user_id, timestamp: now() })
            .await
            .unwrap();

        apply_seed(pool, &plan, true).await.unwrap();
        assert_eq!(access_logs::count_obstacle_accesses(pool).await.unwrap(), 0);
        assert_eq!(users::load_all_users(pool).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn failed_seed_leaves_previous_data() {
        let db = init_database(":memory:", 1).await.unwrap();
        let pool = db.pool();
        let original = plan(DOCUMENT);
        apply_seed(pool, &original, false).await.unwrap();

        // The second user reuses a session token, which fails only after the
        // obstacle tables were cleared inside the transaction.
        let broken = plan(
            r#"{
                "users": [
                    { "username": "a", "session_token": "same" },
                    { "username": "b", "session_token": "same" }
                ],
                "stationary_obstacles": [
                    { "latitude": 38.0, "longitude": -76.0, "cylinder_radius": 50, "cylinder_height": 100 }
                ],
                "server_message": "hello"
            }"#,
        );
        let err = apply_seed(pool, &broken, false).await.unwrap_err();
        assert!(format!("{err:#}").contains("storing user b"), "{err:#}");

        assert_eq!(users::load_all_users(pool).await.unwrap().len(), 2);
        let (stationary, moving) = obstacles::load_obstacles(pool).await.unwrap();
        assert_eq!(stationary, original.stationary);
        assert_eq!(moving, original.moving);
        let info = server_info::latest_server_info(pool).await.unwrap().unwrap();
        assert_eq!(info.team_msg, "Fly safe");
    }

    #[test]
    fn invalid_obstacle_is_rejected_before_writing() {
        let document: SeedDocument = serde_json::from_str(
            r#"{ "moving_obstacles": [ { "sphere_radius": 10, "speed_avg": 5, "waypoints": [] } ] }"#,
        )
        .unwrap();
        let err = document.into_plan(now()).unwrap_err();
        assert!(format!("{err:#}").contains("moving obstacle #0"), "{err:#}");
    }
}
