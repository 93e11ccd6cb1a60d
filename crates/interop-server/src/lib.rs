//! Shared library surface for the interoperability server and its tools.

pub mod api;
pub mod config;
pub mod identity;
pub mod persistence;
pub mod seed;
pub mod state;
