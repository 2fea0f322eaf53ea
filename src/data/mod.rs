//! Data fetching and storage
//!
//! Stats-API client and SQLite database management.

pub mod api;
pub mod database;

pub use api::StatsApi;
pub use database::Database;
