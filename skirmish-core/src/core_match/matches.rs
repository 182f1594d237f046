//! Match records

use super::player::{Player, Role};
use super::types::{MatchId, PlayerId, Timestamp};
use serde::{Deserialize, Serialize};

/// A bounded-capacity session with one admin and zero-or-more players.
///
/// The member list is a snapshot loaded alongside the match row; membership
/// truth lives on the participant records (`Player::match_id`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    /// Unique identifier
    pub id: MatchId,

    /// Human-readable title
    pub title: String,

    /// The participant who created the match; exactly one match per creator
    pub creator_id: PlayerId,

    /// Maximum member count, fixed at creation
    pub max_players: usize,

    /// Current members, admin included
    pub players: Vec<Player>,

    /// When the match was created
    pub created_at: Timestamp,
}

impl Match {
    /// Create a new match shell; the creator is added by the engine
    pub fn new(title: String, creator_id: PlayerId, max_players: usize) -> Self {
        Match {
            id: MatchId::generate(),
            title,
            creator_id,
            max_players,
            players: Vec::new(),
            created_at: Timestamp::now(),
        }
    }

    pub fn member_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.max_players
    }

    pub fn is_member(&self, player_id: &PlayerId) -> bool {
        self.players.iter().any(|p| &p.id == player_id)
    }

    /// The member holding the admin role, if the snapshot contains one
    pub fn admin(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.role == Role::Admin)
    }
}
