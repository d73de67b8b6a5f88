//! Versioned schema for the channel tables.
//!
//! Each migration runs in its own transaction and is recorded in
//! `schema_version`, so `init()` can run any number of times.

use rusqlite::{params, Connection};

/// Latest schema version this crate knows how to create.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

pub struct Migration {
    pub version: i32,
    pub description: &'static str,
    pub up_sql: &'static str,
}

/// All migrations, oldest first.
pub fn get_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Channels and points",
        up_sql: r#"
            CREATE TABLE IF NOT EXISTS channels (
                name TEXT PRIMARY KEY,                  -- case-folded key
                display_name TEXT NOT NULL,
                state BOOLEAN NOT NULL DEFAULT 0,
                owners TEXT NOT NULL DEFAULT '[]',      -- JSON array
                locked BOOLEAN NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS points (
                channel_name TEXT NOT NULL,
                kind TEXT NOT NULL CHECK(kind IN ('transmitter', 'receiver', 'inverted_receiver', 'screen')),
                world TEXT NOT NULL,
                x INTEGER NOT NULL,
                y INTEGER NOT NULL,
                z INTEGER NOT NULL,
                orientation TEXT NOT NULL,
                display_text TEXT NOT NULL DEFAULT '',
                UNIQUE (channel_name, world, x, y, z),
                FOREIGN KEY (channel_name) REFERENCES channels(name)
                    ON DELETE CASCADE ON UPDATE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_points_channel ON points(channel_name);
        "#,
    }]
}

fn get_current_version(conn: &Connection) -> Result<i32, rusqlite::Error> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let version: Option<i32> = conn.query_row(
        "SELECT MAX(version) FROM schema_version",
        [],
        |row| row.get(0),
    )?;

    Ok(version.unwrap_or(0))
}

/// Apply every migration newer than the database.
pub fn migrate(conn: &Connection) -> Result<(), rusqlite::Error> {
    let current_version = get_current_version(conn)?;

    for migration in get_migrations()
        .into_iter()
        .filter(|m| m.version > current_version)
    {
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(migration.up_sql)?;

        let now = chrono::Utc::now().timestamp_millis();

        tx.execute(
            "INSERT INTO schema_version (version, applied_at) VALUES (?, ?)",
            params![migration.version, now],
        )?;
        tx.commit()?;

        tracing::info!(
            "Applied migration v{}: {}",
            migration.version,
            migration.description
        );
    }

    Ok(())
}
