//! Match lifecycle engine
//!
//! Every operation is atomic with respect to the membership store: it
//! acquires the lock keys for the records it touches (ascending order, see
//! `locks`), re-checks its preconditions under those locks, and commits all
//! mutations in one store transaction. `list` is a non-locking snapshot.

use super::locks::LockTable;
use super::matches::Match;
use super::player::{Player, Role};
use super::types::{MatchId, PlayerId};
use crate::config::MatchConfig;
use crate::core_store::{SqlStore, StoreError};
use thiserror::Error;
use tracing::{debug, info};

/// Lifecycle operation errors; each maps onto one kind of the error
/// taxonomy surfaced at the request boundary.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("match not found")]
    NotFound,

    #[error("already in an active match")]
    AlreadyInMatch,

    #[error("already created a match")]
    AlreadyCreator,

    #[error("match is full")]
    MatchFull,

    #[error("not a member of this match")]
    NotAMember,

    #[error("not in a match")]
    NotInMatch,

    #[error("only the match admin may do this")]
    Forbidden,

    #[error("player is not in your match")]
    NotATeammate,

    #[error("cannot kick yourself")]
    CannotKickSelf,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl MatchError {
    /// Whether the caller may safely retry with backoff
    pub fn is_transient(&self) -> bool {
        matches!(self, MatchError::Store(e) if e.is_transient())
    }
}

/// Outcome of a `leave` operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// The participant left; the match persists
    Left,
    /// The admin left; the match was dissolved and every member cleared
    Dissolved,
}

/// The state machine governing create/join/leave/kick/score operations.
pub struct MatchEngine {
    store: SqlStore,
    locks: LockTable,
    config: MatchConfig,
}

impl MatchEngine {
    pub fn new(store: SqlStore, config: MatchConfig) -> Self {
        Self {
            store,
            locks: LockTable::new(),
            config,
        }
    }

    /// Read-only access to the underlying store
    pub fn store(&self) -> &SqlStore {
        &self.store
    }

    // ===== Participant lifecycle =====

    /// Register a new participant
    pub fn register_player(&self, nickname: &str) -> Result<Player, MatchError> {
        let nickname = nickname.trim();
        if nickname.is_empty() {
            return Err(MatchError::InvalidArgument(
                "nickname must not be empty".to_string(),
            ));
        }

        let player = Player::new(nickname.to_string());
        self.store.create_player(&player)?;
        info!(player = %player.id, nickname, "participant registered");
        Ok(player)
    }

    /// Change a participant's display name
    pub async fn update_nickname(
        &self,
        player_id: &PlayerId,
        nickname: &str,
    ) -> Result<Player, MatchError> {
        let nickname = nickname.trim();
        if nickname.is_empty() {
            return Err(MatchError::InvalidArgument(
                "nickname must not be empty".to_string(),
            ));
        }

        let _guards = self.locks.acquire(&[player_id.as_str()]).await;
        let mut player = self.store.get_player(player_id)?;
        player.nickname = nickname.to_string();
        player.updated_at = super::types::Timestamp::now();
        self.store.update_player(&player)?;
        Ok(player)
    }

    /// Destroy a participant record, clearing any match membership first.
    ///
    /// If the participant is the admin of a match the whole match is
    /// dissolved, exactly as if they had left it.
    pub async fn delete_participant(&self, player_id: &PlayerId) -> Result<(), MatchError> {
        for _ in 0..PIN_ATTEMPTS {
            let snapshot = self.store.get_player(player_id)?;
            match snapshot.match_id.clone() {
                None => {
                    let _guards = self.locks.acquire(&[player_id.as_str()]).await;
                    let player = self.store.get_player(player_id)?;
                    if player.match_id.is_some() {
                        continue; // joined a match meanwhile; pin again
                    }
                    self.store.delete_player(player_id)?;
                    info!(player = %player_id, "participant deleted");
                    return Ok(());
                }
                Some(match_id) => {
                    let _guards = self
                        .locks
                        .acquire(&[match_id.as_str(), player_id.as_str()])
                        .await;
                    let mut player = self.store.get_player(player_id)?;
                    if player.match_id.as_ref() != Some(&match_id) {
                        continue;
                    }
                    if player.role == Role::Admin {
                        self.store.dissolve_match(&match_id)?;
                        info!(player = %player_id, r#match = %match_id, "admin deleted; match dissolved");
                    } else {
                        player.clear_membership();
                        self.store.update_player(&player)?;
                        self.store.delete_match_if_empty(&match_id)?;
                    }
                    self.store.delete_player(player_id)?;
                    info!(player = %player_id, "participant deleted");
                    return Ok(());
                }
            }
        }
        Err(contended())
    }

    // ===== Match lifecycle =====

    /// Create a match and seat the caller as its admin
    pub async fn create(&self, player_id: &PlayerId, title: &str) -> Result<Match, MatchError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(MatchError::InvalidArgument(
                "title must not be empty".to_string(),
            ));
        }
        if title.len() > self.config.max_title_len {
            return Err(MatchError::InvalidArgument(format!(
                "title longer than {} characters",
                self.config.max_title_len
            )));
        }

        let _guards = self.locks.acquire(&[player_id.as_str()]).await;

        let mut player = self.store.get_player(player_id)?;
        if player.is_affiliated() {
            return Err(MatchError::AlreadyInMatch);
        }
        // Distinct from current membership: one created match per creator,
        // even if the creator is no longer in it.
        if self.store.find_match_by_creator(player_id)?.is_some() {
            return Err(MatchError::AlreadyCreator);
        }

        let m = Match::new(title.to_string(), player_id.clone(), self.config.max_players);
        player.enter_match(m.id.clone(), Role::Admin);
        self.store.create_match_with_admin(&m, &player)?;

        info!(r#match = %m.id, admin = %player_id, title, "match created");
        Ok(self.store.get_match(&m.id)?)
    }

    /// Join an existing match as a player
    pub async fn join(&self, player_id: &PlayerId, match_id: &MatchId) -> Result<Match, MatchError> {
        let _guards = self
            .locks
            .acquire(&[match_id.as_str(), player_id.as_str()])
            .await;

        // Check-and-increment under the match lock: of two joins racing for
        // the last slot, the loser re-reads a full match here.
        let m = self.store.get_match(match_id).map_err(match_lookup)?;
        let mut player = self.store.get_player(player_id)?;

        if player.is_affiliated() {
            return Err(MatchError::AlreadyInMatch);
        }
        if m.is_full() {
            return Err(MatchError::MatchFull);
        }

        player.enter_match(match_id.clone(), Role::Player);
        self.store.update_player(&player)?;

        info!(r#match = %match_id, player = %player_id, "player joined");
        Ok(self.store.get_match(match_id).map_err(match_lookup)?)
    }

    /// Leave a match. Admins dissolve the match for everyone; players just
    /// step out (the match is deleted if that left it empty).
    pub async fn leave(
        &self,
        player_id: &PlayerId,
        match_id: &MatchId,
    ) -> Result<LeaveOutcome, MatchError> {
        let _guards = self
            .locks
            .acquire(&[match_id.as_str(), player_id.as_str()])
            .await;

        let mut player = self.store.get_player(player_id)?;
        if !player.is_member_of(match_id) {
            return Err(MatchError::NotAMember);
        }

        if player.role == Role::Admin {
            self.store.dissolve_match(match_id).map_err(match_lookup)?;
            info!(r#match = %match_id, admin = %player_id, "admin left; match dissolved");
            return Ok(LeaveOutcome::Dissolved);
        }

        player.clear_membership();
        self.store.update_player(&player)?;
        if self.store.delete_match_if_empty(match_id)? {
            debug!(r#match = %match_id, "empty match deleted");
        }

        info!(r#match = %match_id, player = %player_id, "player left");
        Ok(LeaveOutcome::Left)
    }

    /// Remove a member from the caller's match. Admin only; the target must
    /// be a teammate and not the admin themselves.
    ///
    /// Holds the match key and both participant keys, so a concurrent write
    /// to the target (a rename, say) cannot land between the target read and
    /// the membership clear.
    pub async fn kick(
        &self,
        admin_id: &PlayerId,
        target_id: &PlayerId,
    ) -> Result<Player, MatchError> {
        for _ in 0..PIN_ATTEMPTS {
            let snapshot = self.store.get_player(admin_id)?;
            let Some(match_id) = snapshot.match_id.clone() else {
                return Err(MatchError::NotInMatch);
            };

            let _guards = self
                .locks
                .acquire(&[match_id.as_str(), admin_id.as_str(), target_id.as_str()])
                .await;
            let admin = self.store.get_player(admin_id)?;
            if admin.match_id.as_ref() != Some(&match_id) {
                continue; // affiliation moved while locking; pin again
            }

            if admin.role != Role::Admin {
                return Err(MatchError::Forbidden);
            }

            let mut target = match self.store.get_player(target_id) {
                Ok(p) => p,
                Err(StoreError::PlayerNotFound) => return Err(MatchError::NotATeammate),
                Err(e) => return Err(e.into()),
            };
            if !target.is_member_of(&match_id) {
                return Err(MatchError::NotATeammate);
            }
            if target.id == admin.id {
                return Err(MatchError::CannotKickSelf);
            }

            target.clear_membership();
            self.store.update_player(&target)?;

            info!(r#match = %match_id, admin = %admin_id, target = %target_id, "player kicked");
            return Ok(target);
        }
        Err(contended())
    }

    /// Add points (possibly negative, never zero) to the caller's score,
    /// returning the new total. No clamping; totals may go negative.
    pub async fn increment_score(
        &self,
        player_id: &PlayerId,
        points: i64,
    ) -> Result<i64, MatchError> {
        if points == 0 {
            return Err(MatchError::InvalidArgument(
                "points must be a nonzero integer".to_string(),
            ));
        }

        let (_guards, player) = self.pin_affiliation(player_id).await?;
        let score = self.store.add_score(&player.id, points)?;

        debug!(player = %player_id, points, score, "score updated");
        Ok(score)
    }

    /// Snapshot of all matches with their member sets
    pub fn list(&self) -> Result<Vec<Match>, MatchError> {
        Ok(self.store.list_matches()?)
    }

    /// Lock a participant's current affiliation: acquires the match and
    /// participant keys, then re-reads to confirm the affiliation did not
    /// move while the locks were being taken.
    async fn pin_affiliation(
        &self,
        player_id: &PlayerId,
    ) -> Result<(Vec<tokio::sync::OwnedMutexGuard<()>>, Player), MatchError> {
        for _ in 0..PIN_ATTEMPTS {
            let snapshot = self.store.get_player(player_id)?;
            let Some(match_id) = snapshot.match_id.clone() else {
                return Err(MatchError::NotInMatch);
            };

            let guards = self
                .locks
                .acquire(&[match_id.as_str(), player_id.as_str()])
                .await;
            let player = self.store.get_player(player_id)?;
            if player.match_id.as_ref() == Some(&match_id) {
                return Ok((guards, player));
            }
        }
        Err(contended())
    }
}

const PIN_ATTEMPTS: usize = 5;

fn contended() -> MatchError {
    // Affiliation kept moving under us; report transient so the caller
    // retries instead of getting a misleading state error.
    MatchError::Store(StoreError::Unavailable(
        "contended membership record".to_string(),
    ))
}

fn match_lookup(e: StoreError) -> MatchError {
    match e {
        StoreError::MatchNotFound => MatchError::NotFound,
        other => MatchError::Store(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn setup_engine() -> MatchEngine {
        setup_engine_with_capacity(5)
    }

    fn setup_engine_with_capacity(max_players: usize) -> MatchEngine {
        let store = SqlStore::memory().unwrap();
        let config = MatchConfig {
            max_players,
            max_title_len: 100,
        };
        MatchEngine::new(store, config)
    }

    fn register(engine: &MatchEngine, nickname: &str) -> PlayerId {
        engine.register_player(nickname).unwrap().id
    }

    #[tokio::test]
    async fn test_create_seats_creator_as_admin() {
        let engine = setup_engine();
        let alice = register(&engine, "alice");

        let m = engine.create(&alice, "Friday night").await.unwrap();

        assert_eq!(m.title, "Friday night");
        assert_eq!(m.creator_id, alice);
        assert_eq!(m.member_count(), 1);
        assert_eq!(m.admin().unwrap().id, alice);
        assert_eq!(m.max_players, 5);
    }

    #[tokio::test]
    async fn test_create_rejects_empty_title() {
        let engine = setup_engine();
        let alice = register(&engine, "alice");

        let result = engine.create(&alice, "   ").await;
        assert!(matches!(result, Err(MatchError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_affiliation_is_exclusive() {
        let engine = setup_engine();
        let alice = register(&engine, "alice");
        let bob = register(&engine, "bob");

        engine.create(&alice, "One").await.unwrap();

        // Creator is affiliated; a second create or a join must fail.
        assert!(matches!(
            engine.create(&alice, "Two").await,
            Err(MatchError::AlreadyInMatch)
        ));

        let other = engine.create(&bob, "Other").await.unwrap();
        assert!(matches!(
            engine.join(&alice, &other.id).await,
            Err(MatchError::AlreadyInMatch)
        ));
    }

    #[tokio::test]
    async fn test_creator_uniqueness_outlives_membership() {
        let engine = setup_engine();
        let alice = register(&engine, "alice");
        let bob = register(&engine, "bob");

        let m = engine.create(&alice, "One").await.unwrap();
        engine.join(&bob, &m.id).await.unwrap();

        // Alice dissolves her match by leaving as admin; she can create anew.
        engine.leave(&alice, &m.id).await.unwrap();
        engine.create(&alice, "Two").await.unwrap();
    }

    #[tokio::test]
    async fn test_kicked_player_can_join_elsewhere() {
        let engine = setup_engine();
        let alice = register(&engine, "alice");
        let bob = register(&engine, "bob");
        let carol = register(&engine, "carol");

        let m = engine.create(&alice, "One").await.unwrap();
        engine.join(&bob, &m.id).await.unwrap();
        engine.kick(&alice, &bob).await.unwrap();

        let other = engine.create(&carol, "Two").await.unwrap();
        let joined = engine.join(&bob, &other.id).await.unwrap();
        assert!(joined.is_member(&bob));
    }

    #[tokio::test]
    async fn test_join_unknown_match() {
        let engine = setup_engine();
        let alice = register(&engine, "alice");

        let result = engine.join(&alice, &MatchId::generate()).await;
        assert!(matches!(result, Err(MatchError::NotFound)));
    }

    #[tokio::test]
    async fn test_join_full_match() {
        let engine = setup_engine_with_capacity(2);
        let alice = register(&engine, "alice");
        let bob = register(&engine, "bob");
        let carol = register(&engine, "carol");

        let m = engine.create(&alice, "Duel").await.unwrap();
        engine.join(&bob, &m.id).await.unwrap();

        let result = engine.join(&carol, &m.id).await;
        assert!(matches!(result, Err(MatchError::MatchFull)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_joins_never_exceed_capacity() {
        let engine = Arc::new(setup_engine_with_capacity(3));
        let alice = register(&engine, "alice");
        let m = engine.create(&alice, "Duel").await.unwrap();

        let mut handles = Vec::new();
        for i in 0..10 {
            let player = register(&engine, &format!("player{}", i));
            let engine = engine.clone();
            let match_id = m.id.clone();
            handles.push(tokio::spawn(async move {
                engine.join(&player, &match_id).await
            }));
        }

        let mut joined = 0;
        let mut full = 0;
        for h in handles {
            match h.await.unwrap() {
                Ok(_) => joined += 1,
                Err(MatchError::MatchFull) => full += 1,
                Err(e) => panic!("unexpected error: {}", e),
            }
        }

        // Capacity 3 with the admin already seated: two slots to win.
        assert_eq!(joined, 2);
        assert_eq!(full, 8);

        let loaded = engine.store().get_match(&m.id).unwrap();
        assert_eq!(loaded.member_count(), 3);
    }

    #[tokio::test]
    async fn test_admin_leave_cascades() {
        let engine = setup_engine();
        let alice = register(&engine, "alice");
        let bob = register(&engine, "bob");
        let carol = register(&engine, "carol");

        let m = engine.create(&alice, "Trio").await.unwrap();
        engine.join(&bob, &m.id).await.unwrap();
        engine.join(&carol, &m.id).await.unwrap();
        engine.increment_score(&bob, 12).await.unwrap();

        let outcome = engine.leave(&alice, &m.id).await.unwrap();
        assert_eq!(outcome, LeaveOutcome::Dissolved);

        assert!(matches!(
            engine.join(&bob, &m.id).await,
            Err(MatchError::NotFound)
        ));
        for id in [&alice, &bob, &carol] {
            let p = engine.store().get_player(id).unwrap();
            assert_eq!(p.match_id, None);
            assert_eq!(p.score, 0);
            assert_eq!(p.role, Role::Player);
        }
    }

    #[tokio::test]
    async fn test_player_leave_keeps_match() {
        let engine = setup_engine();
        let alice = register(&engine, "alice");
        let bob = register(&engine, "bob");

        let m = engine.create(&alice, "Pair").await.unwrap();
        engine.join(&bob, &m.id).await.unwrap();
        engine.increment_score(&bob, 3).await.unwrap();

        let outcome = engine.leave(&bob, &m.id).await.unwrap();
        assert_eq!(outcome, LeaveOutcome::Left);

        let loaded = engine.store().get_match(&m.id).unwrap();
        assert_eq!(loaded.member_count(), 1);

        let bob = engine.store().get_player(&bob).unwrap();
        assert_eq!(bob.match_id, None);
        assert_eq!(bob.score, 0);
    }

    #[tokio::test]
    async fn test_leave_requires_membership() {
        let engine = setup_engine();
        let alice = register(&engine, "alice");
        let bob = register(&engine, "bob");

        let m = engine.create(&alice, "Solo").await.unwrap();
        assert!(matches!(
            engine.leave(&bob, &m.id).await,
            Err(MatchError::NotAMember)
        ));
    }

    #[tokio::test]
    async fn test_kick_guards() {
        let engine = setup_engine();
        let alice = register(&engine, "alice");
        let bob = register(&engine, "bob");
        let carol = register(&engine, "carol");
        let dave = register(&engine, "dave");

        let m = engine.create(&alice, "Guarded").await.unwrap();
        engine.join(&bob, &m.id).await.unwrap();
        engine.join(&carol, &m.id).await.unwrap();

        // Kicker not in a match.
        assert!(matches!(
            engine.kick(&dave, &bob).await,
            Err(MatchError::NotInMatch)
        ));
        // Non-admin member.
        assert!(matches!(
            engine.kick(&bob, &carol).await,
            Err(MatchError::Forbidden)
        ));
        // Target outside the match.
        assert!(matches!(
            engine.kick(&alice, &dave).await,
            Err(MatchError::NotATeammate)
        ));
        // Self-kick.
        assert!(matches!(
            engine.kick(&alice, &alice).await,
            Err(MatchError::CannotKickSelf)
        ));
    }

    #[tokio::test]
    async fn test_kick_clears_target_only() {
        let engine = setup_engine();
        let alice = register(&engine, "alice");
        let bob = register(&engine, "bob");

        let m = engine.create(&alice, "Pair").await.unwrap();
        engine.join(&bob, &m.id).await.unwrap();
        engine.increment_score(&bob, 9).await.unwrap();

        let kicked = engine.kick(&alice, &bob).await.unwrap();
        assert_eq!(kicked.nickname, "bob");

        let bob = engine.store().get_player(&bob).unwrap();
        assert_eq!(bob.match_id, None);
        assert_eq!(bob.score, 0);

        let loaded = engine.store().get_match(&m.id).unwrap();
        assert_eq!(loaded.member_count(), 1);
        assert_eq!(loaded.admin().unwrap().id, alice);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_kick_preserves_concurrent_rename() {
        let engine = Arc::new(setup_engine());
        let alice = register(&engine, "alice");

        // A rename that reports success must survive a racing kick: kick
        // holds the target's key, so it cannot write back a stale row over
        // the committed nickname.
        for i in 0..50 {
            let m = engine.create(&alice, "Arena").await.unwrap();
            let bob = register(&engine, &format!("bob{}", i));
            engine.join(&bob, &m.id).await.unwrap();

            let renamed = format!("bobby{}", i);
            let kick = {
                let engine = engine.clone();
                let alice = alice.clone();
                let bob = bob.clone();
                tokio::spawn(async move { engine.kick(&alice, &bob).await })
            };
            let rename = {
                let engine = engine.clone();
                let bob = bob.clone();
                let renamed = renamed.clone();
                tokio::spawn(async move { engine.update_nickname(&bob, &renamed).await })
            };

            kick.await.unwrap().unwrap();
            rename.await.unwrap().unwrap();

            let stored = engine.store().get_player(&bob).unwrap();
            assert_eq!(stored.nickname, renamed, "round {}: kick overwrote the rename", i);
            assert_eq!(stored.match_id, None);

            engine.leave(&alice, &m.id).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_score_requires_membership_and_nonzero_points() {
        let engine = setup_engine();
        let alice = register(&engine, "alice");

        assert!(matches!(
            engine.increment_score(&alice, 0).await,
            Err(MatchError::InvalidArgument(_))
        ));
        assert!(matches!(
            engine.increment_score(&alice, 5).await,
            Err(MatchError::NotInMatch)
        ));
    }

    #[tokio::test]
    async fn test_score_accumulates_and_allows_negative_totals() {
        let engine = setup_engine();
        let alice = register(&engine, "alice");
        engine.create(&alice, "Solo").await.unwrap();

        assert_eq!(engine.increment_score(&alice, 10).await.unwrap(), 10);
        assert_eq!(engine.increment_score(&alice, -25).await.unwrap(), -15);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_score_increments_lose_no_updates() {
        let engine = Arc::new(setup_engine());
        let alice = register(&engine, "alice");
        engine.create(&alice, "Grind").await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..20 {
            let engine = engine.clone();
            let alice = alice.clone();
            handles.push(tokio::spawn(async move {
                engine.increment_score(&alice, 1).await
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }

        let alice = engine.store().get_player(&alice).unwrap();
        assert_eq!(alice.score, 20);
    }

    #[tokio::test]
    async fn test_list_snapshots_all_matches() {
        let engine = setup_engine();
        let alice = register(&engine, "alice");
        let bob = register(&engine, "bob");

        engine.create(&alice, "First").await.unwrap();
        engine.create(&bob, "Second").await.unwrap();

        let matches = engine.list().unwrap();
        assert_eq!(matches.len(), 2);
        assert!(matches.iter().all(|m| m.member_count() == 1));
    }

    #[tokio::test]
    async fn test_register_rejects_empty_and_duplicate_nicknames() {
        let engine = setup_engine();

        assert!(matches!(
            engine.register_player("  "),
            Err(MatchError::InvalidArgument(_))
        ));

        engine.register_player("alice").unwrap();
        assert!(matches!(
            engine.register_player("alice"),
            Err(MatchError::Store(StoreError::Conflict(_)))
        ));
    }

    #[tokio::test]
    async fn test_delete_admin_participant_dissolves_match() {
        let engine = setup_engine();
        let alice = register(&engine, "alice");
        let bob = register(&engine, "bob");

        let m = engine.create(&alice, "Pair").await.unwrap();
        engine.join(&bob, &m.id).await.unwrap();

        engine.delete_participant(&alice).await.unwrap();

        assert!(matches!(
            engine.store().get_player(&alice),
            Err(StoreError::PlayerNotFound)
        ));
        assert!(matches!(
            engine.store().get_match(&m.id),
            Err(StoreError::MatchNotFound)
        ));
        let bob = engine.store().get_player(&bob).unwrap();
        assert_eq!(bob.match_id, None);
    }

    #[tokio::test]
    async fn test_delete_player_participant_keeps_match() {
        let engine = setup_engine();
        let alice = register(&engine, "alice");
        let bob = register(&engine, "bob");

        let m = engine.create(&alice, "Pair").await.unwrap();
        engine.join(&bob, &m.id).await.unwrap();

        engine.delete_participant(&bob).await.unwrap();

        let loaded = engine.store().get_match(&m.id).unwrap();
        assert_eq!(loaded.member_count(), 1);
    }
}
