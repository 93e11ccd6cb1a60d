//! Persistence layer for the interoperability server.
//!
//! SQLite-backed storage with typed create/query operations per entity.
//! Relations are loaded explicitly; nothing is fetched lazily.

pub mod access_logs;
pub mod db;
pub mod obstacles;
pub mod server_info;
pub mod users;

pub use db::{clear_all, clear_all_tx, init_database, Database};
