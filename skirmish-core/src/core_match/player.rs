//! Participant records and match affiliation

use super::types::{MatchId, PlayerId, Timestamp};
use serde::{Deserialize, Serialize};

/// Role a participant holds within their current match.
///
/// The role is an attribute of the membership relation, not of the
/// participant: it only means something while `match_id` is set, and it is
/// reset to `Player` whenever the affiliation ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Created the match; may kick members, and dissolves the match on leave
    Admin,
    /// Regular member
    Player,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Player => "Player",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "Admin" => Role::Admin,
            _ => Role::Player,
        }
    }
}

/// A registered participant.
///
/// Affiliation is exclusive: `match_id` refers to at most one match, and
/// every transition in or out of a match goes through the lifecycle engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Unique identifier
    pub id: PlayerId,

    /// Display name, unique across participants
    pub nickname: String,

    /// Current match, if any
    pub match_id: Option<MatchId>,

    /// Role within the current match
    pub role: Role,

    /// Score accumulated in the current match
    pub score: i64,

    /// When the participant registered
    pub created_at: Timestamp,

    /// Last mutation time
    pub updated_at: Timestamp,
}

impl Player {
    /// Create a new unaffiliated participant
    pub fn new(nickname: String) -> Self {
        let now = Timestamp::now();
        Player {
            id: PlayerId::generate(),
            nickname,
            match_id: None,
            role: Role::Player,
            score: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the participant currently belongs to any match
    pub fn is_affiliated(&self) -> bool {
        self.match_id.is_some()
    }

    /// Whether the participant is a member of the given match
    pub fn is_member_of(&self, match_id: &MatchId) -> bool {
        self.match_id.as_ref() == Some(match_id)
    }

    /// Enter a match with the given role
    pub fn enter_match(&mut self, match_id: MatchId, role: Role) {
        self.match_id = Some(match_id);
        self.role = role;
        self.updated_at = Timestamp::now();
    }

    /// Clear the affiliation: no match, neutral role, score back to zero
    pub fn clear_membership(&mut self) {
        self.match_id = None;
        self.role = Role::Player;
        self.score = 0;
        self.updated_at = Timestamp::now();
    }
}
