//! Connection bootstrap for the project database.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON` and a busy timeout.
//! - Returned connections are fully migrated.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Where a connection points.
#[derive(Debug, Clone, Copy)]
enum Location<'a> {
    File(&'a Path),
    Memory,
}

impl Location<'_> {
    fn mode(self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Memory => "memory",
        }
    }

    fn connect(self) -> DbResult<Connection> {
        match self {
            Self::File(path) => Connection::open(path).map_err(|source| DbError::Open {
                path: path.to_path_buf(),
                source,
            }),
            Self::Memory => Ok(Connection::open_in_memory()?),
        }
    }
}

/// Opens (or creates) a project database file and migrates it.
///
/// # Errors
/// - `DbError::Open` naming `path` when SQLite cannot open the file.
///
/// # Side effects
/// - Emits `db_open` events with mode, status and duration.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_at(Location::File(path.as_ref()))
}

/// Opens a migrated in-memory project database. Used by tests and dry runs.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_at(Location::Memory)
}

fn open_at(location: Location<'_>) -> DbResult<Connection> {
    let started_at = Instant::now();
    let mode = location.mode();
    info!("event=db_open module=db status=start mode={mode}");

    let result = location.connect().and_then(|mut conn| {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        apply_migrations(&mut conn)?;
        Ok(conn)
    });

    match &result {
        Ok(_) => info!(
            "event=db_open module=db status=ok mode={mode} duration_ms={}",
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=db_open module=db status=error mode={mode} duration_ms={} error_code={} error={err}",
            started_at.elapsed().as_millis(),
            error_code(err)
        ),
    }
    result
}

fn error_code(err: &DbError) -> &'static str {
    match err {
        DbError::Open { .. } => "db_open_failed",
        DbError::Migration { .. } | DbError::SchemaTooNew { .. } => "db_migration_failed",
        DbError::Sqlite(_) => "db_bootstrap_failed",
    }
}
