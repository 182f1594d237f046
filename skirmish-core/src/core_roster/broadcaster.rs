//! Session roster broadcaster
//!
//! One `SessionRoster` per live match session, keyed by match id. A
//! connection joins a session, receives roster updates over an unbounded
//! channel, and is removed again on disconnect. Sessions that see no
//! activity for the configured TTL are evicted by a background sweep.

use crate::config::RosterConfig;
use crate::core_match::{MatchId, PlayerId};
use crate::shutdown::ShutdownCoordinator;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

/// Identifier of a live connection, distinct from the participant it
/// authenticated as (the same participant may reconnect with a new one).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub String);

impl ConnectionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a participant as shown to other session members
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerDescriptor {
    pub id: PlayerId,
    pub nickname: String,
}

/// One seat in a session roster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterEntry {
    pub connection_id: ConnectionId,
    pub player: PlayerDescriptor,
    pub score: i64,
}

/// Update fanned out to every connection in a session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "roster")]
pub enum RosterUpdate {
    /// Membership changed; carries the full roster
    #[serde(rename = "players-update")]
    Players(Vec<RosterEntry>),
    /// A score changed; carries the full roster with current scores
    #[serde(rename = "scoreboard")]
    Scoreboard(Vec<RosterEntry>),
}

struct SessionRoster {
    entries: Vec<RosterEntry>,
    senders: HashMap<ConnectionId, UnboundedSender<RosterUpdate>>,
    last_activity: Instant,
}

impl SessionRoster {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            senders: HashMap::new(),
            last_activity: Instant::now(),
        }
    }

    fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    fn broadcast(&self, update: RosterUpdate) {
        for sender in self.senders.values() {
            // A closed receiver just means the connection is going away;
            // disconnect will prune it.
            let _ = sender.send(update.clone());
        }
    }
}

/// Fan-out hub for session rosters
pub struct RosterBroadcaster {
    sessions: RwLock<HashMap<MatchId, SessionRoster>>,
    config: RosterConfig,
}

impl RosterBroadcaster {
    pub fn new(config: RosterConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Add a connection to a match session, returning its update stream.
    ///
    /// A second join by the same connection replaces its previous entry, so
    /// a reconnecting client never appears twice.
    pub async fn join_room(
        &self,
        connection_id: ConnectionId,
        match_id: &MatchId,
        player: PlayerDescriptor,
        score: i64,
    ) -> UnboundedReceiver<RosterUpdate> {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut sessions = self.sessions.write().await;
        let session = sessions
            .entry(match_id.clone())
            .or_insert_with(SessionRoster::new);

        session.entries.retain(|e| e.connection_id != connection_id);
        session.entries.push(RosterEntry {
            connection_id: connection_id.clone(),
            player,
            score,
        });
        session.senders.insert(connection_id.clone(), tx);
        session.touch();

        debug!(r#match = %match_id, connection = %connection_id, members = session.entries.len(), "connection joined session");
        session.broadcast(RosterUpdate::Players(session.entries.clone()));
        rx
    }

    /// Record a new score for a participant and fan out the scoreboard.
    /// Silently a no-op when no entry for the participant is in the session.
    ///
    /// Matching is by participant id, not connection: a participant who
    /// reconnected keeps receiving score updates addressed to them, and
    /// every entry they hold (one per live connection) mirrors the score.
    pub async fn update_score(&self, match_id: &MatchId, player_id: &PlayerId, score: i64) {
        let mut sessions = self.sessions.write().await;
        let Some(session) = sessions.get_mut(match_id) else {
            return;
        };

        let mut matched = false;
        for entry in session
            .entries
            .iter_mut()
            .filter(|e| &e.player.id == player_id)
        {
            entry.score = score;
            matched = true;
        }
        if !matched {
            return;
        }

        session.touch();
        session.broadcast(RosterUpdate::Scoreboard(session.entries.clone()));
    }

    /// Remove a connection from every session it appears in. Idempotent;
    /// each affected session gets a fresh roster update, and sessions left
    /// empty are dropped.
    pub async fn disconnect(&self, connection_id: &ConnectionId) {
        let mut sessions = self.sessions.write().await;

        let mut emptied = Vec::new();
        for (match_id, session) in sessions.iter_mut() {
            let before = session.entries.len();
            session.entries.retain(|e| &e.connection_id != connection_id);
            session.senders.remove(connection_id);
            if session.entries.len() == before {
                continue;
            }

            session.touch();
            if session.entries.is_empty() {
                emptied.push(match_id.clone());
            } else {
                session.broadcast(RosterUpdate::Players(session.entries.clone()));
            }
            debug!(r#match = %match_id, connection = %connection_id, "connection left session");
        }

        for match_id in emptied {
            sessions.remove(&match_id);
        }
    }

    /// Drop sessions idle longer than the configured TTL, returning how
    /// many were evicted
    pub async fn evict_idle(&self) -> usize {
        let ttl = self.config.idle_session_ttl;
        let mut sessions = self.sessions.write().await;

        let stale: Vec<MatchId> = sessions
            .iter()
            .filter(|(_, s)| s.last_activity.elapsed() > ttl)
            .map(|(id, _)| id.clone())
            .collect();

        for match_id in &stale {
            sessions.remove(match_id);
            info!(r#match = %match_id, "idle session evicted");
        }
        stale.len()
    }

    /// Number of live sessions
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Current roster of a session, if one exists
    pub async fn roster(&self, match_id: &MatchId) -> Option<Vec<RosterEntry>> {
        self.sessions
            .read()
            .await
            .get(match_id)
            .map(|s| s.entries.clone())
    }

    /// Periodic eviction sweep; exits on shutdown
    pub async fn run_eviction(self: Arc<Self>, shutdown: Arc<ShutdownCoordinator>) {
        let mut interval = tokio::time::interval(self.config.eviction_interval);
        let mut shutdown_rx = shutdown.subscribe();

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let evicted = self.evict_idle().await;
                    if evicted > 0 {
                        debug!(evicted, "eviction sweep completed");
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("roster eviction task stopping");
                    return;
                }
            }
        }
    }
}
