//! Append-only access audit records.
//!
//! Each access is a single-row insert, so concurrent requests never touch a
//! shared row. Timestamps are stored as fixed-width RFC 3339 UTC text, which
//! keeps lexical and chronological order identical.

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use interop_core::{ObstacleAccessLog, ServerInfoAccessLog};
use serde::Serialize;
use sqlx::SqlitePool;

pub(crate) fn encode_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_timestamp(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)
        .with_context(|| format!("bad access log timestamp {:?}", value))?
        .with_timezone(&Utc))
}

/// Append one obstacle access record.
pub async fn record_obstacle_access(pool: &SqlitePool, log: &ObstacleAccessLog) -> Result<i64> {
    let result =
        sqlx::query("INSERT INTO obstacle_access_logs (user_id, timestamp) VALUES (?1, ?2)")
            .bind(log.user_id)
            .bind(encode_timestamp(log.timestamp))
            .execute(pool)
            .await?;

    Ok(result.last_insert_rowid())
}

/// Append one server info access record.
pub async fn record_server_info_access(
    pool: &SqlitePool,
    log: &ServerInfoAccessLog,
) -> Result<i64> {
    let result =
        sqlx::query("INSERT INTO server_info_access_logs (user_id, timestamp) VALUES (?1, ?2)")
            .bind(log.user_id)
            .bind(encode_timestamp(log.timestamp))
            .execute(pool)
            .await?;

    Ok(result.last_insert_rowid())
}

pub async fn count_obstacle_accesses(pool: &SqlitePool) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM obstacle_access_logs")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn count_obstacle_accesses_for_user(pool: &SqlitePool, user_id: i64) -> Result<i64> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM obstacle_access_logs WHERE user_id = ?1")
            .bind(user_id)
            .fetch_one(pool)
            .await?;
    Ok(count)
}

pub async fn count_server_info_accesses(pool: &SqlitePool) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM server_info_access_logs")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Obstacle access records of one user, oldest first.
pub async fn obstacle_accesses_for_user(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Vec<ObstacleAccessLog>> {
    let rows: Vec<(i64, String)> = sqlx::query_as(
        "SELECT user_id, timestamp FROM obstacle_access_logs WHERE user_id = ?1 ORDER BY timestamp, id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|(user_id, timestamp)| -> Result<ObstacleAccessLog> {
            Ok(ObstacleAccessLog {
                user_id,
                timestamp: decode_timestamp(&timestamp)?,
            })
        })
        .collect()
}

/// Per-user polling statistics over the obstacle access log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessRateSummary {
    pub user_id: i64,
    pub username: String,
    pub access_count: i64,
    pub first_access: Option<DateTime<Utc>>,
    pub last_access: Option<DateTime<Utc>>,
    /// Mean accesses per second between the first and last access.
    pub average_rate_hz: Option<f64>,
}

#[derive(sqlx::FromRow)]
struct AccessRateRow {
    user_id: i64,
    username: String,
    access_count: i64,
    first_access: Option<String>,
    last_access: Option<String>,
}

/// Summaries for every user, including users that never polled.
pub async fn obstacle_access_rates(pool: &SqlitePool) -> Result<Vec<AccessRateSummary>> {
    let rows = sqlx::query_as::<_, AccessRateRow>(
        r#"
        SELECT users.id AS user_id,
               users.username AS username,
               COUNT(logs.id) AS access_count,
               MIN(logs.timestamp) AS first_access,
               MAX(logs.timestamp) AS last_access
        FROM users
        LEFT JOIN obstacle_access_logs AS logs ON logs.user_id = users.id
        GROUP BY users.id, users.username
        ORDER BY users.id
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(AccessRateSummary::try_from).collect()
}

impl TryFrom<AccessRateRow> for AccessRateSummary {
    type Error = anyhow::Error;

    fn try_from(row: AccessRateRow) -> Result<Self> {
        let first_access = row.first_access.as_deref().map(decode_timestamp).transpose()?;
        let last_access = row.last_access.as_deref().map(decode_timestamp).transpose()?;
        Ok(AccessRateSummary {
            average_rate_hz: average_rate_hz(row.access_count, first_access, last_access),
            user_id: row.user_id,
            username: row.username,
            access_count: row.access_count,
            first_access,
            last_access,
        })
    }
}

/// `count - 1` intervals spread over the observed span.
fn average_rate_hz(
    count: i64,
    first: Option<DateTime<Utc>>,
    last: Option<DateTime<Utc>>,
) -> Option<f64> {
    let (first, last) = (first?, last?);
    if count < 2 {
        return None;
    }
    let span_ms = (last - first).num_milliseconds();
    if span_ms <= 0 {
        return None;
    }
    Some((count - 1) as f64 / (span_ms as f64 / 1000.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn timestamps_sort_lexically() {
        let early = Utc.with_ymd_and_hms(2015, 6, 1, 9, 59, 59).unwrap();
        let late = early + Duration::milliseconds(1);
        assert!(encode_timestamp(early) < encode_timestamp(late));
        assert_eq!(decode_timestamp(&encode_timestamp(late)).unwrap(), late);
    }

    #[test]
    fn average_rate_needs_two_distinct_accesses() {
        let start = Utc.with_ymd_and_hms(2015, 6, 1, 10, 0, 0).unwrap();
        assert_eq!(average_rate_hz(1, Some(start), Some(start)), None);
        assert_eq!(average_rate_hz(3, Some(start), Some(start)), None);
        assert_eq!(average_rate_hz(0, None, None), None);
        assert_eq!(
            average_rate_hz(11, Some(start), Some(start + Duration::seconds(5))),
            Some(2.0)
        );
    }
}
