//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! Components call store methods and never execute SQL directly.
//!
//! A DeskStore wraps one connection. Independent sessions each hold their
//! own store (see `reopen`); SQLite serializes their writes, and every
//! mutation runs inside one `BEGIN IMMEDIATE` transaction via `write_tx`.

use crate::{
    error::DeskResult,
    event::{DeskEvent, EventLogEntry},
    types::{ComplaintId, Timestamp},
};
use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use std::time::Duration;

mod complaint;
mod municipality;
mod rating;
mod support;

pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5_000);

pub struct DeskStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
    busy_timeout: Duration,
}

impl DeskStore {
    pub fn open(path: &str) -> DeskResult<Self> {
        Self::open_with_timeout(path, DEFAULT_BUSY_TIMEOUT)
    }

    pub fn open_with_timeout(path: &str, busy_timeout: Duration) -> DeskResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        conn.busy_timeout(busy_timeout)?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn,
            path: Some(path.to_string()),
            busy_timeout,
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> DeskResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn,
            path: None,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        })
    }

    /// Open another connection to the same database, one per session.
    /// For in-memory databases, this returns a new in-memory database (isolated).
    pub fn reopen(&self) -> DeskResult<Self> {
        match &self.path {
            Some(p) => Self::open_with_timeout(p, self.busy_timeout),
            None => Self::in_memory(),
        }
    }

    /// Apply all schema migrations in order. Safe to run from every session.
    pub fn migrate(&self) -> DeskResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_complaints.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/003_support.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/004_ratings.sql"))?;
        Ok(())
    }

    /// Run `f` inside one IMMEDIATE transaction on this connection.
    ///
    /// The write lock is taken up front, so read-then-write sequences inside
    /// `f` cannot interleave with another session's writes. Any error rolls
    /// the whole unit back. Must not be nested.
    pub fn write_tx<T>(&self, f: impl FnOnce(&Self) -> DeskResult<T>) -> DeskResult<T> {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
        let out = f(self)?;
        tx.commit()?;
        Ok(out)
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, event: &DeskEvent, at: Timestamp) -> DeskResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (complaint_id, event_type, payload, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                event.complaint_id(),
                event.type_name(),
                serde_json::to_string(event)?,
                at,
            ],
        )?;
        Ok(())
    }

    pub fn events_for_complaint(&self, complaint_id: ComplaintId) -> DeskResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, created_at, payload
             FROM event_log WHERE complaint_id = ?1
             ORDER BY id ASC",
        )?;
        let rows = stmt
            .query_map(params![complaint_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, Timestamp>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut entries = Vec::with_capacity(rows.len());
        for (id, created_at, payload) in rows {
            entries.push(EventLogEntry {
                id,
                created_at,
                event: serde_json::from_str(&payload)?,
            });
        }
        Ok(entries)
    }
}
