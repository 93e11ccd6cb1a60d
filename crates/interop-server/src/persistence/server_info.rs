//! Server info persistence.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use interop_core::ServerInfo;
use sqlx::{Sqlite, SqlitePool, Transaction};

use super::access_logs::encode_timestamp;

/// Store a new team message. The most recent one is served.
pub async fn create_server_info(pool: &SqlitePool, info: &ServerInfo) -> Result<i64> {
    let mut tx = pool.begin().await?;
    let id = create_server_info_tx(&mut tx, info).await?;
    tx.commit().await?;
    Ok(id)
}

pub async fn create_server_info_tx(
    tx: &mut Transaction<'_, Sqlite>,
    info: &ServerInfo,
) -> Result<i64> {
    let result = sqlx::query("INSERT INTO server_info (team_msg, timestamp) VALUES (?1, ?2)")
        .bind(&info.team_msg)
        .bind(encode_timestamp(info.timestamp))
        .execute(&mut **tx)
        .await?;

    Ok(result.last_insert_rowid())
}

/// Latest stored server info, if any.
pub async fn latest_server_info(pool: &SqlitePool) -> Result<Option<ServerInfo>> {
    let row = sqlx::query_as::<_, ServerInfoRow>(
        "SELECT team_msg, timestamp FROM server_info ORDER BY id DESC LIMIT 1",
    )
    .fetch_optional(pool)
    .await?;

    row.map(ServerInfo::try_from).transpose()
}

#[derive(sqlx::FromRow)]
struct ServerInfoRow {
    team_msg: String,
    timestamp: String,
}

impl TryFrom<ServerInfoRow> for ServerInfo {
    type Error = anyhow::Error;

    fn try_from(row: ServerInfoRow) -> Result<Self> {
        let timestamp = DateTime::parse_from_rfc3339(&row.timestamp)
            .with_context(|| format!("bad server info timestamp {:?}", row.timestamp))?
            .with_timezone(&Utc);
        Ok(ServerInfo::new(row.team_msg, timestamp)?)
    }
}
