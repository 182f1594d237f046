//! SQL-backed storage for participants and matches
//!
//! Every multi-statement operation runs inside one transaction, so a
//! lifecycle operation either commits fully or leaves no trace. Pool
//! checkout and busy timeouts are bounded; their failures surface as
//! transient errors callers may retry.

use super::migrations;
use crate::core_match::{Match, MatchId, Player, PlayerId, Role, Timestamp};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, ErrorCode, OptionalExtension, Row};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Membership store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("participant not found")]
    PlayerNotFound,

    #[error("match not found")]
    MatchNotFound,

    #[error("record conflict: {0}")]
    Conflict(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl StoreError {
    /// Whether the caller may safely retry with backoff
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Unavailable(_) => true,
            StoreError::Database(rusqlite::Error::SqliteFailure(e, _)) => {
                matches!(e.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
            }
            _ => false,
        }
    }
}

/// SQLite store behind an r2d2 connection pool
pub struct SqlStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqlStore {
    /// Create a store on an existing pool, applying pending migrations
    pub fn new(pool: Pool<SqliteConnectionManager>) -> Result<Self, StoreError> {
        migrations::migrate(&pool)?;
        Ok(Self { pool })
    }

    /// Open a file-backed store with bounded checkout and busy timeouts
    pub fn open(
        path: impl AsRef<Path>,
        connection_timeout: Duration,
        busy_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pragmas = format!(
            "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = {};",
            busy_timeout.as_millis()
        );
        let manager = SqliteConnectionManager::file(path)
            .with_init(move |conn| conn.execute_batch(&pragmas));
        let pool = Pool::builder()
            .connection_timeout(connection_timeout)
            .build(manager)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Self::new(pool)
    }

    /// In-memory store for tests and ephemeral deployments.
    ///
    /// Single-connection pool: every caller must see the same database.
    pub fn memory() -> Result<Self, StoreError> {
        let manager = SqliteConnectionManager::memory()
            .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Self::new(pool)
    }

    fn conn(&self) -> Result<r2d2::PooledConnection<SqliteConnectionManager>, StoreError> {
        self.pool
            .get()
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    // ===== Participant operations =====

    /// Insert a new participant; nickname collisions are conflicts
    pub fn create_player(&self, player: &Player) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO players (id, nickname, match_id, role, score, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                player.id.as_str(),
                &player.nickname,
                player.match_id.as_ref().map(|m| m.as_str()),
                player.role.as_str(),
                player.score,
                player.created_at.as_millis() as i64,
                player.updated_at.as_millis() as i64,
            ],
        )
        .map_err(|e| match &e {
            rusqlite::Error::SqliteFailure(f, _)
                if f.code == ErrorCode::ConstraintViolation =>
            {
                StoreError::Conflict(format!("nickname '{}' is taken", player.nickname))
            }
            _ => StoreError::Database(e),
        })?;

        Ok(())
    }

    /// Get a participant by id
    pub fn get_player(&self, player_id: &PlayerId) -> Result<Player, StoreError> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, nickname, match_id, role, score, created_at, updated_at
             FROM players WHERE id = ?",
            params![player_id.as_str()],
            player_from_row,
        )
        .optional()?
        .ok_or(StoreError::PlayerNotFound)
    }

    /// Get a participant by display name
    pub fn get_player_by_nickname(&self, nickname: &str) -> Result<Player, StoreError> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, nickname, match_id, role, score, created_at, updated_at
             FROM players WHERE nickname = ?",
            params![nickname],
            player_from_row,
        )
        .optional()?
        .ok_or(StoreError::PlayerNotFound)
    }

    /// Write back a participant record
    pub fn update_player(&self, player: &Player) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let rows = conn
            .execute(
                "UPDATE players SET nickname = ?, match_id = ?, role = ?, score = ?, updated_at = ?
                 WHERE id = ?",
                params![
                    &player.nickname,
                    player.match_id.as_ref().map(|m| m.as_str()),
                    player.role.as_str(),
                    player.score,
                    player.updated_at.as_millis() as i64,
                    player.id.as_str(),
                ],
            )
            .map_err(|e| match &e {
                rusqlite::Error::SqliteFailure(f, _)
                    if f.code == ErrorCode::ConstraintViolation =>
                {
                    StoreError::Conflict(format!("nickname '{}' is taken", player.nickname))
                }
                _ => StoreError::Database(e),
            })?;

        if rows == 0 {
            return Err(StoreError::PlayerNotFound);
        }
        Ok(())
    }

    /// Delete a participant record
    pub fn delete_player(&self, player_id: &PlayerId) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "DELETE FROM players WHERE id = ?",
            params![player_id.as_str()],
        )?;
        if rows == 0 {
            return Err(StoreError::PlayerNotFound);
        }
        Ok(())
    }

    /// Atomically add points to a participant's score, returning the total
    pub fn add_score(&self, player_id: &PlayerId, points: i64) -> Result<i64, StoreError> {
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;

        let rows = tx.execute(
            "UPDATE players SET score = score + ?, updated_at = ? WHERE id = ?",
            params![
                points,
                Timestamp::now().as_millis() as i64,
                player_id.as_str()
            ],
        )?;
        if rows == 0 {
            return Err(StoreError::PlayerNotFound);
        }

        let score: i64 = tx.query_row(
            "SELECT score FROM players WHERE id = ?",
            params![player_id.as_str()],
            |row| row.get(0),
        )?;

        tx.commit()?;
        Ok(score)
    }

    // ===== Match operations =====

    /// Insert a match and seat its creator as admin, in one transaction
    pub fn create_match_with_admin(
        &self,
        m: &Match,
        admin: &Player,
    ) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            "INSERT INTO matches (id, title, creator_id, max_players, created_at)
             VALUES (?, ?, ?, ?, ?)",
            params![
                m.id.as_str(),
                &m.title,
                m.creator_id.as_str(),
                m.max_players as i64,
                m.created_at.as_millis() as i64,
            ],
        )
        .map_err(|e| match &e {
            rusqlite::Error::SqliteFailure(f, _)
                if f.code == ErrorCode::ConstraintViolation =>
            {
                StoreError::Conflict("creator already has a match".to_string())
            }
            _ => StoreError::Database(e),
        })?;

        tx.execute(
            "UPDATE players SET match_id = ?, role = ?, updated_at = ? WHERE id = ?",
            params![
                m.id.as_str(),
                admin.role.as_str(),
                admin.updated_at.as_millis() as i64,
                admin.id.as_str(),
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    /// Get a match with its current member snapshot
    pub fn get_match(&self, match_id: &MatchId) -> Result<Match, StoreError> {
        let conn = self.conn()?;

        let mut m: Match = conn
            .query_row(
                "SELECT id, title, creator_id, max_players, created_at
                 FROM matches WHERE id = ?",
                params![match_id.as_str()],
                |row| {
                    Ok(Match {
                        id: MatchId::new(row.get(0)?),
                        title: row.get(1)?,
                        creator_id: PlayerId::new(row.get(2)?),
                        max_players: row.get::<_, i64>(3)?.max(0) as usize,
                        players: Vec::new(),
                        created_at: Timestamp::from_millis(row.get::<_, i64>(4)?.max(0) as u64),
                    })
                },
            )
            .optional()?
            .ok_or(StoreError::MatchNotFound)?;

        let mut stmt = conn.prepare(
            "SELECT id, nickname, match_id, role, score, created_at, updated_at
             FROM players WHERE match_id = ? ORDER BY created_at",
        )?;
        let players = stmt
            .query_map(params![match_id.as_str()], player_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        m.players = players;
        Ok(m)
    }

    /// Snapshot of all matches with their member sets; non-locking
    pub fn list_matches(&self) -> Result<Vec<Match>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id FROM matches ORDER BY created_at DESC")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        drop(stmt);
        drop(conn);

        let mut matches = Vec::with_capacity(ids.len());
        for id in ids {
            // A match deleted between the listing and the load is skipped.
            match self.get_match(&MatchId::new(id)) {
                Ok(m) => matches.push(m),
                Err(StoreError::MatchNotFound) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(matches)
    }

    /// Find the match created by the given participant, if one exists
    pub fn find_match_by_creator(
        &self,
        creator_id: &PlayerId,
    ) -> Result<Option<MatchId>, StoreError> {
        let conn = self.conn()?;
        let id = conn
            .query_row(
                "SELECT id FROM matches WHERE creator_id = ?",
                params![creator_id.as_str()],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(id.map(MatchId::new))
    }

    /// Clear every current member (membership, role, score) and delete the
    /// match, in one transaction.
    ///
    /// The member clear is conditional on `match_id`, so a participant who
    /// re-homed to another match between snapshot and commit is untouched.
    pub fn dissolve_match(&self, match_id: &MatchId) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            "UPDATE players SET match_id = NULL, role = ?, score = 0, updated_at = ?
             WHERE match_id = ?",
            params![
                Role::Player.as_str(),
                Timestamp::now().as_millis() as i64,
                match_id.as_str(),
            ],
        )?;

        let rows = tx.execute(
            "DELETE FROM matches WHERE id = ?",
            params![match_id.as_str()],
        )?;
        if rows == 0 {
            return Err(StoreError::MatchNotFound);
        }

        tx.commit()?;
        Ok(())
    }

    /// Delete the match iff it has no remaining members; returns whether a
    /// deletion happened
    pub fn delete_match_if_empty(&self, match_id: &MatchId) -> Result<bool, StoreError> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "DELETE FROM matches WHERE id = ?1
             AND NOT EXISTS (SELECT 1 FROM players WHERE match_id = ?1)",
            params![match_id.as_str()],
        )?;
        Ok(rows > 0)
    }
}

fn player_from_row(row: &Row<'_>) -> rusqlite::Result<Player> {
    Ok(Player {
        id: PlayerId::new(row.get(0)?),
        nickname: row.get(1)?,
        match_id: row.get::<_, Option<String>>(2)?.map(MatchId::new),
        role: Role::from_str(&row.get::<_, String>(3)?),
        score: row.get(4)?,
        created_at: Timestamp::from_millis(row.get::<_, i64>(5)?.max(0) as u64),
        updated_at: Timestamp::from_millis(row.get::<_, i64>(6)?.max(0) as u64),
    })
}
