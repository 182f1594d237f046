//! Durable membership store
//!
//! SQLite-backed records for participants and matches. This store is the
//! single source of truth for membership; the live roster in `core_roster`
//! only mirrors it.

pub mod migrations;
pub mod store;

pub use store::{SqlStore, StoreError};
