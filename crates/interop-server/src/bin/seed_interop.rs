//! Load competition users, obstacles and the team message into the database.

use anyhow::{Context, Result};
use clap::Parser;
use interop_server::config::Config;
use interop_server::persistence::{self, obstacles};
use interop_server::seed::{apply_seed, SeedDocument};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Seed document (JSON)
    #[arg(long)]
    file: PathBuf,

    /// Database path (defaults to INTEROP_DATABASE_PATH)
    #[arg(long)]
    database: Option<String>,

    /// Delete all existing data, including users and access logs, before
    /// seeding. Without it, obstacles are replaced and users are updated.
    #[arg(long, default_value_t = false)]
    reset: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::from_env();
    let database_path = args.database.unwrap_or(config.database_path);

    let raw = std::fs::read_to_string(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let document: SeedDocument = serde_json::from_str(&raw).context("parsing seed document")?;
    let plan = document.into_plan(chrono::Utc::now())?;

    let db = persistence::init_database(&database_path, 1).await?;
    let pool = db.pool();
    if args.reset {
        println!("Clearing existing data in {}", database_path);
    }
    let summary = apply_seed(pool, &plan, args.reset).await?;

    for user in &plan.users {
        println!("User {} (superuser: {})", user.username, user.is_superuser);
    }
    if let Some(info) = &plan.message {
        println!("Server message: {}", info.team_msg);
    }

    let (stored_stationary, stored_moving) = obstacles::load_obstacles(pool).await?;
    println!(
        "Seeded {} users; database now holds {} stationary and {} moving obstacles",
        summary.users,
        stored_stationary.len(),
        stored_moving.len()
    );

    Ok(())
}
