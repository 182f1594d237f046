//! Database migrations for the membership store
//!
//! Each migration is applied atomically and tracked in the
//! `membership_schema_version` table.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use std::time::{SystemTime, UNIX_EPOCH};

/// Current schema version for the membership store
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Migration descriptor
pub struct Migration {
    pub version: i32,
    pub description: &'static str,
    pub up_sql: &'static str,
}

/// All available migrations in order
pub fn get_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial participants and matches schema",
        up_sql: r#"
            -- Schema version tracking
            CREATE TABLE IF NOT EXISTS membership_schema_version (
                version INTEGER PRIMARY KEY,
                applied_at INTEGER NOT NULL
            );

            -- Matches (bounded-capacity sessions)
            CREATE TABLE IF NOT EXISTS matches (
                id TEXT PRIMARY KEY,                    -- MatchId (uuid)
                title TEXT NOT NULL,
                creator_id TEXT NOT NULL UNIQUE,        -- one match per creator
                max_players INTEGER NOT NULL CHECK(max_players > 0),
                created_at INTEGER NOT NULL
            );

            -- Participants; match_id carries the exclusive membership
            CREATE TABLE IF NOT EXISTS players (
                id TEXT PRIMARY KEY,                    -- PlayerId (uuid)
                nickname TEXT NOT NULL UNIQUE,
                match_id TEXT,                          -- nullable affiliation
                role TEXT NOT NULL CHECK(role IN ('Admin', 'Player')),
                score INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                FOREIGN KEY (match_id) REFERENCES matches(id) ON DELETE SET NULL
            );

            CREATE INDEX IF NOT EXISTS idx_players_match ON players(match_id);
        "#,
    }]
}

/// Apply all pending migrations
pub fn migrate(pool: &Pool<SqliteConnectionManager>) -> Result<(), rusqlite::Error> {
    let conn = pool.get().map_err(|e| {
        rusqlite::Error::ToSqlConversionFailure(Box::new(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("Failed to get connection: {}", e),
        )))
    })?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS membership_schema_version (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM membership_schema_version",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    for migration in get_migrations() {
        if migration.version <= current {
            continue;
        }

        tracing::info!(
            version = migration.version,
            description = migration.description,
            "applying membership store migration"
        );

        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(migration.up_sql)?;

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        tx.execute(
            "INSERT INTO membership_schema_version (version, applied_at) VALUES (?, ?)",
            params![migration.version, now],
        )?;
        tx.commit()?;
    }

    Ok(())
}
