//! SQLite implementation of the Backend trait.
//!
//! This is the primary backend for the exchange. It uses rusqlite with
//! bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use agora_core::{
    derive_address, Address, Author, DeliveryReceipt, InboxEntry, Page, SignedExpression,
    TimeRange, Timestamp,
};

use crate::error::{BackendError, Result};
use crate::migration;
use crate::traits::{check_envelope, page_bounds, Backend};

/// SQLite-based backend implementation.
///
/// A single mutex-guarded connection; every call hops onto
/// `spawn_blocking` so rusqlite never stalls the async runtime.
pub struct SqliteBackend {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteBackend {
    /// Open the database at `path`, creating the file and bringing the
    /// schema up to date if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory database. Handy in tests; nothing persists.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

fn poisoned_lock<T>(e: std::sync::PoisonError<T>) -> BackendError {
    BackendError::Database(rusqlite::Error::SqliteFailure(
        rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
        Some(format!("mutex poisoned: {}", e)),
    ))
}

fn join_failed(e: tokio::task::JoinError) -> BackendError {
    BackendError::Database(rusqlite::Error::SqliteFailure(
        rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
        Some(format!("spawn_blocking failed: {}", e)),
    ))
}

/// Serialize an envelope to its stored canonical JSON form.
fn encode_envelope(expression: &SignedExpression) -> Result<String> {
    expression
        .canonical_json()
        .map_err(|e| BackendError::Serialization(e.to_string()))
}

/// Parse an envelope back out of its stored canonical JSON form.
fn decode_envelope(envelope: &str) -> Result<SignedExpression> {
    SignedExpression::from_json(envelope).map_err(|e| BackendError::Serialization(e.to_string()))
}

fn millis_to_timestamp(ms: i64) -> Result<Timestamp> {
    Timestamp::from_millis(ms)
        .ok_or_else(|| BackendError::InvalidData(format!("timestamp out of range: {}", ms)))
}

/// Millisecond bounds for a half-open time range, suitable for SQL
/// comparison against `timestamp_ms` columns.
fn range_millis(range: &TimeRange) -> (i64, i64) {
    let from = range.from.map(|t| t.timestamp_millis()).unwrap_or(i64::MIN);
    let until = range
        .until
        .map(|t| t.timestamp_millis())
        .unwrap_or(i64::MAX);
    (from, until)
}

#[async_trait]
impl Backend for SqliteBackend {
    async fn create_public_expression(&self, expression: &SignedExpression) -> Result<Address> {
        check_envelope(expression)?;
        let address = derive_address(expression);
        let envelope = encode_envelope(expression)?;
        let author_id = expression.author.id().to_string();
        let timestamp_ms = expression.timestamp.timestamp_millis();
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(poisoned_lock)?;
            let tx = conn.transaction()?;

            // First publish wins the expressions row; the address is the
            // same either way since it is derived from the envelope bytes.
            tx.execute(
                "INSERT OR IGNORE INTO expressions (
                    address, author, timestamp_ms, envelope, published_at
                ) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    address.as_bytes().as_slice(),
                    &author_id,
                    timestamp_ms,
                    &envelope,
                    Timestamp::now().timestamp_millis(),
                ],
            )?;

            // Every publish appends a listing entry, re-publishes included.
            tx.execute(
                "INSERT INTO author_index (author, address, timestamp_ms)
                 VALUES (?1, ?2, ?3)",
                params![&author_id, address.as_bytes().as_slice(), timestamp_ms],
            )?;

            tx.commit()?;
            tracing::debug!("stored expression {} by {}", address, author_id);
            Ok(address)
        })
        .await
        .map_err(join_failed)?
    }

    async fn get_expression_by_address(
        &self,
        address: &Address,
    ) -> Result<Option<SignedExpression>> {
        let address = *address;
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(poisoned_lock)?;

            let envelope: Option<String> = conn
                .query_row(
                    "SELECT envelope FROM expressions WHERE address = ?1",
                    params![address.as_bytes().as_slice()],
                    |row| row.get(0),
                )
                .optional()?;

            match envelope {
                Some(envelope) => Ok(Some(decode_envelope(&envelope)?)),
                None => Ok(None),
            }
        })
        .await
        .map_err(join_failed)?
    }

    async fn get_by_author(
        &self,
        author: &Author,
        page: Page,
        range: TimeRange,
    ) -> Result<Vec<SignedExpression>> {
        let author_id = author.id().to_string();
        let (skip, take) = page_bounds(page);
        let (from_ms, until_ms) = range_millis(&range);
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(poisoned_lock)?;

            let mut stmt = conn.prepare(
                "SELECT e.envelope
                 FROM author_index ai
                 JOIN expressions e ON e.address = ai.address
                 WHERE ai.author = ?1
                   AND ai.timestamp_ms >= ?2 AND ai.timestamp_ms < ?3
                 ORDER BY ai.timestamp_ms DESC, ai.entry_seq DESC
                 LIMIT ?4 OFFSET ?5",
            )?;

            let envelopes: Vec<String> = stmt
                .query_map(
                    params![&author_id, from_ms, until_ms, take as i64, skip as i64],
                    |row| row.get(0),
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            envelopes.iter().map(|e| decode_envelope(e)).collect()
        })
        .await
        .map_err(join_failed)?
    }

    async fn send_private(
        &self,
        recipient: &Author,
        expression: &SignedExpression,
    ) -> Result<DeliveryReceipt> {
        check_envelope(expression)?;
        let address = derive_address(expression);
        let envelope = encode_envelope(expression)?;
        let recipient = recipient.clone();
        let owner_id = recipient.id().to_string();
        let sender_id = expression.author.id().to_string();
        let received_at = Timestamp::now();
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(poisoned_lock)?;

            conn.execute(
                "INSERT INTO inbox (owner, sender, address, envelope, received_at_ms)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    &owner_id,
                    &sender_id,
                    address.as_bytes().as_slice(),
                    &envelope,
                    received_at.timestamp_millis(),
                ],
            )
            .map_err(|e| BackendError::DeliveryFailed {
                recipient: owner_id.clone(),
                reason: e.to_string(),
            })?;

            tracing::debug!("delivered {} to {}", address, owner_id);
            Ok(DeliveryReceipt {
                recipient,
                address,
                delivered_at: received_at,
            })
        })
        .await
        .map_err(join_failed)?
    }

    async fn get_inbox(
        &self,
        owner: &Author,
        sender: Option<&Author>,
        page: Page,
    ) -> Result<Vec<InboxEntry>> {
        let owner_id = owner.id().to_string();
        let sender_id = sender.map(|s| s.id().to_string());
        let (skip, take) = page_bounds(page);
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(poisoned_lock)?;

            let rows: Vec<(String, String, i64)> = if let Some(sender_id) = sender_id {
                let mut stmt = conn.prepare(
                    "SELECT sender, envelope, received_at_ms FROM inbox
                     WHERE owner = ?1 AND sender = ?2
                     ORDER BY received_at_ms DESC, entry_seq DESC
                     LIMIT ?3 OFFSET ?4",
                )?;
                let collected = stmt
                    .query_map(
                        params![&owner_id, &sender_id, take as i64, skip as i64],
                        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                    )?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                collected
            } else {
                let mut stmt = conn.prepare(
                    "SELECT sender, envelope, received_at_ms FROM inbox
                     WHERE owner = ?1
                     ORDER BY received_at_ms DESC, entry_seq DESC
                     LIMIT ?2 OFFSET ?3",
                )?;
                let collected = stmt
                    .query_map(params![&owner_id, take as i64, skip as i64], |row| {
                        Ok((row.get(0)?, row.get(1)?, row.get(2)?))
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                collected
            };

            rows.into_iter()
                .map(|(sender, envelope, received_at_ms)| {
                    Ok(InboxEntry {
                        sender: Author::new(sender),
                        expression: decode_envelope(&envelope)?,
                        received_at: millis_to_timestamp(received_at_ms)?,
                    })
                })
                .collect()
        })
        .await
        .map_err(join_failed)?
    }
}
