//! Real-time roster synchronization
//!
//! Tracks which live connections sit in which match session and fans out
//! roster and scoreboard updates to every connection in the session.

pub mod broadcaster;

pub use broadcaster::{
    ConnectionId, PlayerDescriptor, RosterBroadcaster, RosterEntry, RosterUpdate,
};
