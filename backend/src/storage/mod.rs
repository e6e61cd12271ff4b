//! # Storage Gateway
//!
//! Owns the single SQLite connection behind the roster and scan collections and
//! exposes collection-level operations to the services.
//!
//! The gateway is constructed once in `main.rs` with [`Database::open`], shared with
//! the handlers as `web::Data<Database>`, and closed with [`Database::close`] after
//! the HTTP server stops. Tests use [`Database::open_in_memory`].
//!
//! ## Collections
//! - `roster`: the current [`RosterRecord`]s. Only ever replaced as a whole by
//!   [`Database::replace_roster`], inside one transaction, so readers see either the
//!   old or the new roster.
//! - `scans`: one [`ScanRecord`] per code. [`Database::insert_scan`] is the
//!   conditional insert: the UNIQUE constraint on `code` decides whether a scan is
//!   the first one, and a violation is reported as [`ScanInsert::AlreadyExists`].
//! - `roster_ingestions`: a single row with the digest of the last ingestion.
//!
//! Every driver failure is surfaced as `AppError::StorageUnavailable`.

mod schema;

use crate::error::AppError;
use chrono::{DateTime, Utc};
use common::model::roster::{RosterEntry, RosterRecord};
use common::model::scan::ScanRecord;
use log::info;
use rusqlite::{ffi, params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

const ROSTER_COLUMNS: &str =
    "id, code, name, admission_id, email, phone, course, status, ingested_at";
const SCAN_COLUMNS: &str = "id, code, name, admission_id, scanned_at, roster_record_ref";

/// Outcome of the conditional scan insert.
#[derive(Debug, PartialEq)]
pub enum ScanInsert {
    Inserted,
    /// A scan for this code was already recorded; carries the stored one.
    AlreadyExists(ScanRecord),
}

/// Cloneable handle; every clone shares one connection. Once [`Database::close`]
/// has run, every operation on any clone fails with `StorageUnavailable`.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Option<Connection>>>,
}

impl Database {
    /// Opens (or creates) the database file and applies the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        info!("Opening database at {}", path.display());
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, AppError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, AppError> {
        conn.execute_batch(schema::SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(Some(conn))),
        })
    }

    /// Closes the shared connection for every handle. Closing twice is a no-op.
    pub async fn close(&self) -> Result<(), AppError> {
        let Some(conn) = self.conn.lock().await.take() else {
            return Ok(());
        };
        conn.close().map_err(|(_, e)| AppError::from(e))?;
        info!("Database closed");
        Ok(())
    }

    #[cfg(test)]
    pub(crate) async fn execute_batch(&self, sql: &str) -> Result<(), AppError> {
        let mut guard = self.conn.lock().await;
        live(&mut guard)?.execute_batch(sql)?;
        Ok(())
    }

    /// The first roster record whose code matches exactly (case-sensitive).
    pub async fn find_roster_record(&self, code: &str) -> Result<Option<RosterRecord>, AppError> {
        let mut guard = self.conn.lock().await;
        let conn = live(&mut guard)?;
        let record = conn
            .query_row(
                &format!("SELECT {ROSTER_COLUMNS} FROM roster WHERE code = ?1 ORDER BY rowid LIMIT 1"),
                params![code],
                roster_from_row,
            )
            .optional()?;
        Ok(record)
    }

    pub async fn roster_len(&self) -> Result<usize, AppError> {
        let mut guard = self.conn.lock().await;
        let conn = live(&mut guard)?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM roster", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Deletes every roster record and inserts `records` in one transaction,
    /// recording `digest` as the latest ingestion.
    ///
    /// Returns the digest of the previous ingestion, if any.
    pub async fn replace_roster(
        &self,
        records: &[RosterRecord],
        digest: &str,
    ) -> Result<Option<String>, AppError> {
        let mut guard = self.conn.lock().await;
        let tx = live(&mut guard)?.transaction()?;

        let previous: Option<String> = tx
            .query_row("SELECT digest FROM roster_ingestions WHERE id = 1", [], |row| row.get(0))
            .optional()?;

        let deleted = tx.execute("DELETE FROM roster", [])?;

        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO roster ({ROSTER_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
            ))?;
            for record in records {
                let entry = &record.entry;
                stmt.execute(params![
                    record.id,
                    entry.code,
                    entry.name,
                    entry.admission_id,
                    entry.email,
                    entry.phone,
                    entry.course,
                    entry.status,
                    record.ingested_at,
                ])?;
            }
        }

        tx.execute(
            "INSERT OR REPLACE INTO roster_ingestions (id, digest, accepted_count, ingested_at)
             VALUES (1, ?1, ?2, ?3)",
            params![digest, records.len() as i64, Utc::now()],
        )?;
        tx.commit()?;

        info!("Roster replaced: {} removed, {} inserted", deleted, records.len());
        Ok(previous)
    }

    /// Records a scan unless one already exists for the same code.
    pub async fn insert_scan(&self, record: &ScanRecord) -> Result<ScanInsert, AppError> {
        let mut guard = self.conn.lock().await;
        let conn = live(&mut guard)?;
        let inserted = conn.execute(
            &format!("INSERT INTO scans ({SCAN_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
            params![
                record.id,
                record.code,
                record.name,
                record.admission_id,
                record.scanned_at,
                record.roster_record_ref,
            ],
        );

        match inserted {
            Ok(_) => Ok(ScanInsert::Inserted),
            Err(err) if is_unique_violation(&err) => {
                let existing = query_scan(conn, &record.code)?.ok_or_else(|| {
                    AppError::StorageUnavailable(format!(
                        "scan for {} rejected as duplicate but not found",
                        record.code
                    ))
                })?;
                Ok(ScanInsert::AlreadyExists(existing))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Every recorded scan, in storage order.
    pub async fn find_scans(&self) -> Result<Vec<ScanRecord>, AppError> {
        let mut guard = self.conn.lock().await;
        let conn = live(&mut guard)?;
        let mut stmt = conn.prepare(&format!("SELECT {SCAN_COLUMNS} FROM scans"))?;
        let scans = stmt
            .query_map([], scan_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(scans)
    }
}

fn live(conn: &mut Option<Connection>) -> Result<&mut Connection, AppError> {
    conn.as_mut()
        .ok_or_else(|| AppError::StorageUnavailable("database is closed".to_string()))
}

fn query_scan(conn: &Connection, code: &str) -> Result<Option<ScanRecord>, AppError> {
    let scan = conn
        .query_row(
            &format!("SELECT {SCAN_COLUMNS} FROM scans WHERE code = ?1"),
            params![code],
            scan_from_row,
        )
        .optional()?;
    Ok(scan)
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == ErrorCode::ConstraintViolation
                && e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn roster_from_row(row: &Row) -> rusqlite::Result<RosterRecord> {
    Ok(RosterRecord {
        id: row.get(0)?,
        entry: RosterEntry {
            code: row.get(1)?,
            name: row.get(2)?,
            admission_id: row.get(3)?,
            email: row.get(4)?,
            phone: row.get(5)?,
            course: row.get(6)?,
            status: row.get(7)?,
        },
        ingested_at: row.get::<_, DateTime<Utc>>(8)?,
    })
}

fn scan_from_row(row: &Row) -> rusqlite::Result<ScanRecord> {
    Ok(ScanRecord {
        id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        admission_id: row.get(3)?,
        scanned_at: row.get(4)?,
        roster_record_ref: row.get(5)?,
    })
}
