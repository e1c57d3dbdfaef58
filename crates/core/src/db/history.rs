use std::path::Path;

use rusqlite::{params, Connection};
use thiserror::Error;

use crate::db::{OutcomeRecord, RecordMode, RunRecord};
use crate::error::RecordStage;

/// Minimum schema version we know how to handle.
///
/// `0` means "no schema yet" (fresh DB).
const MIN_SUPPORTED_SCHEMA_VERSION: i32 = 0;

/// Latest schema version this crate knows about.
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Error type for run history operations.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Underlying SQLite error.
    #[error("SQLite error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// The database was created with a newer schema version than we support.
    #[error(
        "Unsupported schema version {found}; supported range is {min_supported}..={max_supported}"
    )]
    UnsupportedSchemaVersion { found: i32, min_supported: i32, max_supported: i32 },
}

/// Convenience result type for history operations.
pub type HistoryResult<T> = Result<T, HistoryError>;

/// SQLite-backed record of past migration runs.
///
/// This is a thin wrapper around `rusqlite::Connection` that is responsible for:
/// - Opening/creating the DB file.
/// - Applying schema migrations.
/// - Storing one row per run plus one row per processed record.
#[derive(Debug)]
pub struct RunHistoryDb {
    conn: Connection,
}

impl RunHistoryDb {
    /// Open (or create) a history database at the given path and ensure the schema exists.
    pub fn open(path: &Path) -> HistoryResult<Self> {
        let conn = Connection::open(path)?;
        apply_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Expose a reference to the underlying connection for advanced callers.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Insert a run and its per-record outcomes in one transaction; returns the run id.
    pub fn insert_run(
        &mut self,
        run: &RunRecord,
        outcomes: &[OutcomeRecord],
    ) -> HistoryResult<i64> {
        let tx = self.conn.transaction()?;
        tx.execute(
            r#"
            INSERT INTO migration_runs (
                started_at, finished_at, test_mode, upload_new_images,
                clear_interlinking_metadata, total, succeeded, failed
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                run.started_at,
                run.finished_at,
                run.test_mode,
                run.upload_new_images,
                run.clear_interlinking_metadata,
                run.total as i64,
                run.succeeded as i64,
                run.failed as i64,
            ],
        )?;
        let run_id = tx.last_insert_rowid();

        for outcome in outcomes {
            tx.execute(
                r#"
                INSERT INTO record_outcomes (
                    run_id, position, source, origin_id, title, mode, stage,
                    success, destination_id, error
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
                params![
                    run_id,
                    outcome.position as i64,
                    outcome.source,
                    outcome.origin_id,
                    outcome.title,
                    outcome.mode.map(|m| m.as_str()),
                    outcome.stage.as_str(),
                    outcome.success,
                    outcome.destination_id,
                    outcome.error,
                ],
            )?;
        }
        tx.commit()?;
        Ok(run_id)
    }

    /// List runs, newest first, optionally capped at `limit`.
    pub fn list_runs(&self, limit: Option<usize>) -> HistoryResult<Vec<RunRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, started_at, finished_at, test_mode, upload_new_images,
                   clear_interlinking_metadata, total, succeeded, failed
            FROM migration_runs
            ORDER BY id DESC
            LIMIT ?1
            "#,
        )?;
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let rows = stmt.query_map(params![limit], |row| {
            Ok(RunRecord {
                id: Some(row.get(0)?),
                started_at: row.get(1)?,
                finished_at: row.get(2)?,
                test_mode: row.get(3)?,
                upload_new_images: row.get(4)?,
                clear_interlinking_metadata: row.get(5)?,
                total: row.get::<_, i64>(6)? as usize,
                succeeded: row.get::<_, i64>(7)? as usize,
                failed: row.get::<_, i64>(8)? as usize,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Per-record outcomes of one run, in processing order.
    pub fn list_outcomes(&self, run_id: i64) -> HistoryResult<Vec<OutcomeRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT position, source, origin_id, title, mode, stage, success,
                   destination_id, error
            FROM record_outcomes
            WHERE run_id = ?1
            ORDER BY position
            "#,
        )?;
        let rows = stmt.query_map(params![run_id], |row| {
            let mode: Option<String> = row.get(4)?;
            let stage: String = row.get(5)?;
            Ok(OutcomeRecord {
                position: row.get::<_, i64>(0)? as usize,
                source: row.get(1)?,
                origin_id: row.get(2)?,
                title: row.get(3)?,
                mode: mode.as_deref().and_then(RecordMode::parse),
                stage: RecordStage::parse(&stage).ok_or(rusqlite::Error::InvalidQuery)?,
                success: row.get(6)?,
                destination_id: row.get(7)?,
                error: row.get(8)?,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

/// Apply schema migrations to bring the database to the latest version.
///
/// We use `PRAGMA user_version` as the schema version indicator.
///
/// Version map:
/// - 0: no schema
/// - 1: migration_runs
/// - 2: record_outcomes
fn apply_migrations(conn: &Connection) -> HistoryResult<()> {
    let current_version = current_schema_version(conn)?;

    // Reject DBs created with a newer schema than we support.
    if current_version > CURRENT_SCHEMA_VERSION {
        return Err(HistoryError::UnsupportedSchemaVersion {
            found: current_version,
            min_supported: MIN_SUPPORTED_SCHEMA_VERSION,
            max_supported: CURRENT_SCHEMA_VERSION,
        });
    }

    if current_version < 1 {
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS migration_runs (
                id                          INTEGER PRIMARY KEY AUTOINCREMENT,
                started_at                  TEXT NOT NULL,
                finished_at                 TEXT NOT NULL,
                test_mode                   INTEGER NOT NULL,
                upload_new_images           INTEGER NOT NULL,
                clear_interlinking_metadata INTEGER NOT NULL,
                total                       INTEGER NOT NULL,
                succeeded                   INTEGER NOT NULL,
                failed                      INTEGER NOT NULL
            );
            PRAGMA user_version = 1;
            COMMIT;
            "#,
        )?;
    }

    if current_version < 2 {
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS record_outcomes (
                id             INTEGER PRIMARY KEY AUTOINCREMENT,
                run_id         INTEGER NOT NULL REFERENCES migration_runs(id),
                position       INTEGER NOT NULL,
                source         TEXT NOT NULL,
                origin_id      TEXT NOT NULL,
                title          TEXT NOT NULL,
                mode           TEXT,
                stage          TEXT NOT NULL,
                success        INTEGER NOT NULL,
                destination_id TEXT,
                error          TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_record_outcomes_run ON record_outcomes(run_id);
            PRAGMA user_version = 2;
            COMMIT;
            "#,
        )?;
    }

    Ok(())
}

/// Read the SQLite schema version from `PRAGMA user_version`.
fn current_schema_version(conn: &Connection) -> HistoryResult<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    Ok(version)
}
