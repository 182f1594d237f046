//! Core library for the skirmish match coordinator.
//!
//! A match is a bounded-capacity multiplayer session with exactly one admin.
//! This crate owns the durable membership truth (`core_store`), the lifecycle
//! state machine that mutates it (`core_match`), and the ephemeral live
//! roster that mirrors it for connected clients (`core_roster`). The two
//! stores are deliberately independent: a roster bug can never corrupt
//! durable membership, and vice versa.

pub mod config;
pub mod core_match;
pub mod core_roster;
pub mod core_store;
pub mod logging;
pub mod shutdown;
