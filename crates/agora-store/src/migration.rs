//! SQLite schema migrations.
//!
//! Versioned: each step brings the schema from N to N+1 and is recorded
//! in `schema_migrations`, so reopening a database applies only what is
//! missing.

use agora_core::Timestamp;
use rusqlite::Connection;

use crate::error::{BackendError, Result};

/// Latest schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Bring the schema up to [`CURRENT_VERSION`].
///
/// Safe to call on every open; already-applied versions are skipped.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    // Bookkeeping table for applied versions
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, Timestamp::now().timestamp_millis()],
            )?;
        }

        tx.commit()?;
    }

    Ok(())
}

/// Dispatch a single version step.
fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(BackendError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// v1: expressions, author index, inboxes.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Public expressions: one row per distinct envelope
        CREATE TABLE expressions (
            address BLOB PRIMARY KEY,         -- 32 bytes, Blake3 of canonical envelope
            author TEXT NOT NULL,             -- opaque author id
            timestamp_ms INTEGER NOT NULL,    -- envelope timestamp (Unix ms)
            envelope TEXT NOT NULL,           -- canonical envelope JSON
            published_at INTEGER NOT NULL     -- local time of first publish (Unix ms)
        );

        -- Author index: one row per publish call, so re-publishing the
        -- same envelope is visible in listings
        CREATE TABLE author_index (
            entry_seq INTEGER PRIMARY KEY AUTOINCREMENT,
            author TEXT NOT NULL,
            address BLOB NOT NULL,
            timestamp_ms INTEGER NOT NULL
        );

        -- Private inboxes: one row per delivery, isolated from the
        -- public tables
        CREATE TABLE inbox (
            entry_seq INTEGER PRIMARY KEY AUTOINCREMENT,
            owner TEXT NOT NULL,
            sender TEXT NOT NULL,
            address BLOB NOT NULL,
            envelope TEXT NOT NULL,
            received_at_ms INTEGER NOT NULL
        );

        -- Indexes for the pagination queries
        CREATE INDEX idx_author_index_listing ON author_index(author, timestamp_ms DESC, entry_seq DESC);
        CREATE INDEX idx_inbox_listing ON inbox(owner, received_at_ms DESC, entry_seq DESC);
        CREATE INDEX idx_inbox_sender ON inbox(owner, sender);
        "#,
    )?;

    Ok(())
}
