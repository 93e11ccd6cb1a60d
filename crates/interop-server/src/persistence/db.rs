//! Database connection and initialization.

use anyhow::{Context, Result};
use sqlx::{sqlite::SqlitePoolOptions, Sqlite, SqlitePool, Transaction};
use std::path::Path;
use tracing::info;

/// Database connection wrapper.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Get the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Clear all persisted competition data, including users and audit records.
pub async fn clear_all(pool: &SqlitePool) -> Result<()> {
    let mut tx = pool.begin().await?;
    clear_all_tx(&mut tx).await?;
    tx.commit().await?;
    Ok(())
}

pub async fn clear_all_tx(tx: &mut Transaction<'_, Sqlite>) -> Result<()> {
    sqlx::query("DELETE FROM obstacle_access_logs").execute(&mut **tx).await?;
    sqlx::query("DELETE FROM server_info_access_logs").execute(&mut **tx).await?;
    sqlx::query("DELETE FROM server_info").execute(&mut **tx).await?;
    super::obstacles::clear_obstacles_tx(tx).await?;
    sqlx::query("DELETE FROM users").execute(&mut **tx).await?;
    Ok(())
}

/// Initialize the SQLite database.
///
/// Creates the database file if it doesn't exist, runs migrations,
/// and returns a connection pool.
pub async fn init_database(db_path: &str, max_connections: u32) -> Result<Database> {
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path);

    info!("Connecting to database: {}", db_path);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect(&db_url)
        .await?;

    run_migrations(&pool).await?;

    Ok(Database { pool })
}

async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    info!("Running database migrations...");
    run_script(pool, include_str!("../../migrations/001_init.sql")).await?;
    info!("Database migrations complete");
    Ok(())
}

async fn run_script(pool: &SqlitePool, sql: &str) -> Result<()> {
    for statement in migration_statements(sql) {
        sqlx::query(&statement)
            .execute(pool)
            .await
            .with_context(|| format!("Migration statement failed: {}", statement))?;
    }
    Ok(())
}

/// Split a migration script into statements. Comments are stripped first so a
/// `;` inside a comment never ends a statement.
fn migration_statements(sql: &str) -> Vec<String> {
    let without_comments = sql
        .lines()
        .map(|line| match line.find("--") {
            Some(start) => &line[..start],
            None => line,
        })
        .collect::<Vec<_>>()
        .join("\n");

    without_comments
        .split(';')
        .map(str::trim)
        .filter(|statement| !statement.is_empty())
        .map(str::to_string)
        .collect()
}
