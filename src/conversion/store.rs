//! Conversion record storage and persistence.

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use crate::catalog::Catalog;

use super::models::{
    ConversionOutcome, ConversionRecord, ConversionStats, ConversionStatus, SongConversionError,
};
use super::schema::{
    CONVERSIONS_DB_VERSION, CREATE_CONVERSIONS_INDICES, CREATE_CONVERSIONS_TABLE,
    CREATE_SONG_ERRORS_INDICES, CREATE_SONG_ERRORS_TABLE,
};

/// Trait for conversion record storage backends.
pub trait ConversionStore: Send + Sync {
    /// Atomically create a pending record unless a non-failed record already
    /// exists for the same (playlist, target) pair. Returns false on
    /// conflict; the record is untouched in that case.
    fn try_create(&self, record: &ConversionRecord) -> Result<bool>;

    /// Get a record by ID, including its per-song errors.
    fn get(&self, id: &str) -> Result<Option<ConversionRecord>>;

    /// Find the non-failed record for a (playlist, target) pair, if any.
    fn find_active(
        &self,
        source_playlist_id: &str,
        target_catalog: Catalog,
    ) -> Result<Option<ConversionRecord>>;

    /// Transition a record to PROCESSING.
    fn mark_processing(&self, id: &str) -> Result<()>;

    /// Transition a record to COMPLETED with its outcome.
    fn mark_completed(&self, id: &str, outcome: &ConversionOutcome) -> Result<()>;

    /// Transition a record to FAILED with a top-level reason. Never
    /// overwrites an already-terminal record.
    fn mark_failed(&self, id: &str, reason: &str) -> Result<()>;

    /// All records for a source playlist, newest first.
    fn list_for_playlist(&self, source_playlist_id: &str) -> Result<Vec<ConversionRecord>>;

    /// Aggregate statistics over all records.
    fn stats(&self) -> Result<ConversionStats>;
}

/// SQLite-backed conversion store.
pub struct SqliteConversionStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteConversionStore {
    /// Open an existing database or create a new one with the current schema.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(&db_path)
            .with_context(|| format!("Failed to open conversions db at {:?}", db_path.as_ref()))?;
        conn.execute("PRAGMA foreign_keys = ON;", [])?;

        let version: i64 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;

        if version == 0 {
            conn.execute(CREATE_CONVERSIONS_TABLE, [])?;
            for index in CREATE_CONVERSIONS_INDICES {
                conn.execute(index, [])?;
            }
            conn.execute(CREATE_SONG_ERRORS_TABLE, [])?;
            for index in CREATE_SONG_ERRORS_INDICES {
                conn.execute(index, [])?;
            }
            conn.pragma_update(None, "user_version", CONVERSIONS_DB_VERSION)?;
            info!(
                "Created conversions database at {:?} (version {})",
                db_path.as_ref(),
                CONVERSIONS_DB_VERSION
            );
        } else if version != CONVERSIONS_DB_VERSION {
            bail!(
                "Conversions database version {} is not supported (expected {})",
                version,
                CONVERSIONS_DB_VERSION
            );
        }

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<ConversionRecord> {
        let target: String = row.get("target_catalog")?;
        let status: String = row.get("status")?;
        Ok(ConversionRecord {
            id: row.get("id")?,
            source_playlist_id: row.get("source_playlist_id")?,
            target_catalog: Catalog::from_str(&target).ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    format!("unknown catalog '{}'", target).into(),
                )
            })?,
            status: ConversionStatus::from_str(&status).ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    format!("unknown status '{}'", status).into(),
                )
            })?,
            matched_count: row.get::<_, i64>("matched_count")? as usize,
            unmatched_count: row.get::<_, i64>("unmatched_count")? as usize,
            conversion_rate: row.get("conversion_rate")?,
            errors: Vec::new(),
            failure: row.get("failure")?,
            external_playlist_id: row.get("external_playlist_id")?,
            requested_by_user_id: row.get("requested_by_user_id")?,
            created_at: row.get("created_at")?,
            completed_at: row.get("completed_at")?,
        })
    }

    fn load_errors(conn: &Connection, conversion_id: &str) -> Result<Vec<SongConversionError>> {
        let mut stmt = conn.prepare(
            "SELECT song_id, song_title, reason FROM conversion_song_errors
             WHERE conversion_id = ?1 ORDER BY position",
        )?;
        let errors = stmt
            .query_map(params![conversion_id], |row| {
                Ok(SongConversionError {
                    song_id: row.get(0)?,
                    song_title: row.get(1)?,
                    reason: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(errors)
    }
}

impl ConversionStore for SqliteConversionStore {
    fn try_create(&self, record: &ConversionRecord) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let result = conn.execute(
            "INSERT INTO conversions
             (id, source_playlist_id, target_catalog, status, matched_count, unmatched_count,
              conversion_rate, failure, external_playlist_id, requested_by_user_id,
              created_at, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                record.id,
                record.source_playlist_id,
                record.target_catalog.as_str(),
                record.status.as_str(),
                record.matched_count as i64,
                record.unmatched_count as i64,
                record.conversion_rate,
                record.failure,
                record.external_playlist_id,
                record.requested_by_user_id,
                record.created_at,
                record.completed_at,
            ],
        );

        match result {
            Ok(_) => Ok(true),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Ok(false)
            }
            Err(e) => Err(e).context("Failed to insert conversion record"),
        }
    }

    fn get(&self, id: &str) -> Result<Option<ConversionRecord>> {
        let conn = self.conn.lock().unwrap();
        let record = conn
            .query_row(
                "SELECT * FROM conversions WHERE id = ?1",
                params![id],
                Self::row_to_record,
            )
            .optional()
            .context("Failed to load conversion record")?;

        match record {
            Some(mut record) => {
                record.errors = Self::load_errors(&conn, id)?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    fn find_active(
        &self,
        source_playlist_id: &str,
        target_catalog: Catalog,
    ) -> Result<Option<ConversionRecord>> {
        let conn = self.conn.lock().unwrap();
        let record = conn
            .query_row(
                "SELECT * FROM conversions
                 WHERE source_playlist_id = ?1 AND target_catalog = ?2 AND status != 'FAILED'",
                params![source_playlist_id, target_catalog.as_str()],
                Self::row_to_record,
            )
            .optional()
            .context("Failed to look up active conversion")?;
        Ok(record)
    }

    fn mark_processing(&self, id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE conversions SET status = 'PROCESSING' WHERE id = ?1 AND status = 'PENDING'",
            params![id],
        )?;
        if updated == 0 {
            bail!("Conversion {} was not PENDING", id);
        }
        Ok(())
    }

    fn mark_completed(&self, id: &str, outcome: &ConversionOutcome) -> Result<()> {
        let mut guard = self.conn.lock().unwrap();
        let tx = guard.transaction()?;
        let updated = tx.execute(
            "UPDATE conversions
             SET status = 'COMPLETED', matched_count = ?2, unmatched_count = ?3,
                 conversion_rate = ?4, external_playlist_id = ?5, completed_at = ?6
             WHERE id = ?1 AND status = 'PROCESSING'",
            params![
                id,
                outcome.matched_count as i64,
                outcome.unmatched_count as i64,
                outcome.conversion_rate,
                outcome.external_playlist_id,
                chrono::Utc::now().timestamp(),
            ],
        )?;
        if updated == 0 {
            bail!("Conversion {} was not PROCESSING", id);
        }
        for (position, error) in outcome.errors.iter().enumerate() {
            tx.execute(
                "INSERT INTO conversion_song_errors
                 (conversion_id, song_id, song_title, reason, position)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    id,
                    error.song_id,
                    error.song_title,
                    error.reason,
                    position as i64
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn mark_failed(&self, id: &str, reason: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        // Don't overwrite a terminal status
        let updated = conn.execute(
            "UPDATE conversions
             SET status = 'FAILED', failure = ?2, completed_at = ?3
             WHERE id = ?1 AND status IN ('PENDING', 'PROCESSING')",
            params![id, reason, chrono::Utc::now().timestamp()],
        )?;
        if updated == 0 {
            info!("Conversion {} already terminal, not marking as failed", id);
        }
        Ok(())
    }

    fn list_for_playlist(&self, source_playlist_id: &str) -> Result<Vec<ConversionRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT * FROM conversions WHERE source_playlist_id = ?1
             ORDER BY created_at DESC, id",
        )?;
        let records = stmt
            .query_map(params![source_playlist_id], Self::row_to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    fn stats(&self) -> Result<ConversionStats> {
        let conn = self.conn.lock().unwrap();
        let mut stats = ConversionStats::default();

        let mut stmt =
            conn.prepare("SELECT status, COUNT(*) FROM conversions GROUP BY status")?;
        let counts = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as usize))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        for (status, count) in counts {
            stats.total += count;
            match ConversionStatus::from_str(&status) {
                Some(ConversionStatus::Pending) => stats.pending = count,
                Some(ConversionStatus::Processing) => stats.processing = count,
                Some(ConversionStatus::Completed) => stats.completed = count,
                Some(ConversionStatus::Failed) => stats.failed = count,
                None => {}
            }
        }

        stats.average_conversion_rate = conn
            .query_row(
                "SELECT AVG(conversion_rate) FROM conversions WHERE status = 'COMPLETED'",
                [],
                |row| row.get::<_, Option<f64>>(0),
            )?
            .unwrap_or(0.0);

        Ok(stats)
    }
}
