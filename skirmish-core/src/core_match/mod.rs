//! Match lifecycle: data model and state machine
//!
//! A participant belongs to at most one match at a time and carries a role
//! that is only meaningful while affiliated. A match holds between one and
//! `max_players` members, exactly one of whom is the admin. The engine in
//! this module is the only code path that mutates either record.

pub mod engine;
pub mod locks;
pub mod matches;
pub mod player;
pub mod types;

pub use engine::{LeaveOutcome, MatchEngine, MatchError};
pub use locks::LockTable;
pub use matches::Match;
pub use player::{Player, Role};
pub use types::{MatchId, PlayerId, Timestamp};
