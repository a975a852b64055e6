//! Data ingestion and storage
//!
//! CSV loaders for the raw input tables and SQLite storage for the
//! cleaned history.

pub mod database;
pub mod ingest;

pub use database::Database;
