//! Obstacle persistence operations.
//!
//! Obstacles are written by the administrative seeding process and only read
//! on the request path.

use anyhow::{Context, Result};
use interop_core::{
    AerialPosition, GpsPosition, MovingObstacle, StationaryObstacle, Waypoint,
};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::collections::HashMap;

/// Insert a stationary obstacle and return its row id.
pub async fn create_stationary_obstacle(
    pool: &SqlitePool,
    obstacle: &StationaryObstacle,
) -> Result<i64> {
    let mut tx = pool.begin().await?;
    let id = create_stationary_obstacle_tx(&mut tx, obstacle).await?;
    tx.commit().await?;
    Ok(id)
}

pub async fn create_stationary_obstacle_tx(
    tx: &mut Transaction<'_, Sqlite>,
    obstacle: &StationaryObstacle,
) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO stationary_obstacles (latitude, longitude, cylinder_radius, cylinder_height)
        VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(obstacle.centroid().latitude())
    .bind(obstacle.centroid().longitude())
    .bind(obstacle.cylinder_radius())
    .bind(obstacle.cylinder_height())
    .execute(&mut **tx)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Insert a moving obstacle and its waypoints in one transaction.
pub async fn create_moving_obstacle(pool: &SqlitePool, obstacle: &MovingObstacle) -> Result<i64> {
    let mut tx = pool.begin().await?;
    let id = create_moving_obstacle_tx(&mut tx, obstacle).await?;
    tx.commit().await?;
    Ok(id)
}

pub async fn create_moving_obstacle_tx(
    tx: &mut Transaction<'_, Sqlite>,
    obstacle: &MovingObstacle,
) -> Result<i64> {
    let result =
        sqlx::query("INSERT INTO moving_obstacles (sphere_radius, speed_avg) VALUES (?1, ?2)")
            .bind(obstacle.sphere_radius())
            .bind(obstacle.speed_avg())
            .execute(&mut **tx)
            .await?;
    let obstacle_id = result.last_insert_rowid();

    for waypoint in obstacle.waypoints() {
        sqlx::query(
            r#"
            INSERT INTO moving_obstacle_waypoints (obstacle_id, waypoint_order, latitude, longitude, altitude_msl)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(obstacle_id)
        .bind(waypoint.order)
        .bind(waypoint.position.latitude())
        .bind(waypoint.position.longitude())
        .bind(waypoint.position.altitude_msl())
        .execute(&mut **tx)
        .await?;
    }

    Ok(obstacle_id)
}

/// Remove every obstacle. Waypoints go with their obstacle.
pub async fn clear_obstacles_tx(tx: &mut Transaction<'_, Sqlite>) -> Result<()> {
    sqlx::query("DELETE FROM moving_obstacle_waypoints").execute(&mut **tx).await?;
    sqlx::query("DELETE FROM moving_obstacles").execute(&mut **tx).await?;
    sqlx::query("DELETE FROM stationary_obstacles").execute(&mut **tx).await?;
    Ok(())
}

/// Load every obstacle from a single read transaction, so one snapshot never
/// mixes two states of the table set.
pub async fn load_obstacles(
    pool: &SqlitePool,
) -> Result<(Vec<StationaryObstacle>, Vec<MovingObstacle>)> {
    let mut tx = pool.begin().await?;
    let stationary = load_stationary_tx(&mut tx).await?;
    let moving = load_moving_tx(&mut tx).await?;
    tx.commit().await?;
    Ok((stationary, moving))
}

/// Load all stationary obstacles.
pub async fn load_stationary_obstacles(pool: &SqlitePool) -> Result<Vec<StationaryObstacle>> {
    let mut tx = pool.begin().await?;
    let obstacles = load_stationary_tx(&mut tx).await?;
    tx.commit().await?;
    Ok(obstacles)
}

/// Load all moving obstacles with their waypoints.
pub async fn load_moving_obstacles(pool: &SqlitePool) -> Result<Vec<MovingObstacle>> {
    let mut tx = pool.begin().await?;
    let obstacles = load_moving_tx(&mut tx).await?;
    tx.commit().await?;
    Ok(obstacles)
}

async fn load_stationary_tx(tx: &mut Transaction<'_, Sqlite>) -> Result<Vec<StationaryObstacle>> {
    let rows = sqlx::query_as::<_, StationaryObstacleRow>(
        "SELECT id, latitude, longitude, cylinder_radius, cylinder_height FROM stationary_obstacles ORDER BY id",
    )
    .fetch_all(&mut **tx)
    .await?;

    rows.into_iter().map(|r| r.try_into()).collect()
}

async fn load_moving_tx(tx: &mut Transaction<'_, Sqlite>) -> Result<Vec<MovingObstacle>> {
    let obstacles = sqlx::query_as::<_, MovingObstacleRow>(
        "SELECT id, sphere_radius, speed_avg FROM moving_obstacles ORDER BY id",
    )
    .fetch_all(&mut **tx)
    .await?;

    let waypoint_rows = sqlx::query_as::<_, WaypointRow>(
        r#"
        SELECT obstacle_id, waypoint_order, latitude, longitude, altitude_msl
        FROM moving_obstacle_waypoints
        ORDER BY obstacle_id, waypoint_order
        "#,
    )
    .fetch_all(&mut **tx)
    .await?;

    let mut waypoints: HashMap<i64, Vec<Waypoint>> = HashMap::new();
    for row in waypoint_rows {
        let obstacle_id = row.obstacle_id;
        waypoints
            .entry(obstacle_id)
            .or_default()
            .push(row.try_into()?);
    }

    obstacles
        .into_iter()
        .map(|row| {
            let path = waypoints.remove(&row.id).unwrap_or_default();
            MovingObstacle::new(row.sphere_radius, row.speed_avg, path)
                .with_context(|| format!("moving obstacle {} is invalid", row.id))
        })
        .collect()
}

// Internal row types for SQLx
#[derive(sqlx::FromRow)]
struct StationaryObstacleRow {
    id: i64,
    latitude: f64,
    longitude: f64,
    cylinder_radius: f64,
    cylinder_height: f64,
}

impl TryFrom<StationaryObstacleRow> for StationaryObstacle {
    type Error = anyhow::Error;

    fn try_from(row: StationaryObstacleRow) -> Result<Self> {
        let centroid = GpsPosition::new(row.latitude, row.longitude)
            .with_context(|| format!("stationary obstacle {} has a bad centroid", row.id))?;
        StationaryObstacle::new(centroid, row.cylinder_radius, row.cylinder_height)
            .with_context(|| format!("stationary obstacle {} is invalid", row.id))
    }
}

#[derive(sqlx::FromRow)]
struct MovingObstacleRow {
    id: i64,
    sphere_radius: f64,
    speed_avg: f64,
}

#[derive(sqlx::FromRow)]
struct WaypointRow {
    obstacle_id: i64,
    waypoint_order: i64,
    latitude: f64,
    longitude: f64,
    altitude_msl: f64,
}

impl TryFrom<WaypointRow> for Waypoint {
    type Error = anyhow::Error;

    fn try_from(row: WaypointRow) -> Result<Self> {
        let gps = GpsPosition::new(row.latitude, row.longitude)?;
        let position = AerialPosition::new(gps, row.altitude_msl).with_context(|| {
            format!(
                "waypoint {} of moving obstacle {} is invalid",
                row.waypoint_order, row.obstacle_id
            )
        })?;
        Ok(Waypoint::new(row.waypoint_order, position))
    }
}
