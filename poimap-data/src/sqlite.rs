//! SQLite persistence for classified records.
#![forbid(unsafe_code)]

use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use poimap_core::{ClassifiedRecord, ElementId};
use rusqlite::{Connection, Error as SqliteError, Transaction, params};
use serde_json::to_string;
use thiserror::Error;

use crate::geometry::representative_point;

/// Errors raised when persisting classified records to SQLite.
#[derive(Debug, Error)]
pub enum PersistRecordsError {
    /// Failed to create the parent directory for the SQLite artefact.
    #[error("failed to create parent directory for {path:?}")]
    CreateDirectory {
        /// Database path whose parent could not be created.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Opening the SQLite database failed.
    #[error("failed to open SQLite database at {path:?}")]
    Open {
        /// Destination database path.
        path: Utf8PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Beginning the transaction failed.
    #[error("failed to begin record persistence transaction")]
    BeginTransaction {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Creating the `pois` table failed.
    #[error("failed to create pois table")]
    CreateSchema {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Serializing record tags to JSON failed.
    #[error("failed to serialize tags for {id}")]
    SerializeTags {
        /// Identity of the record whose tags failed to serialize.
        id: ElementId,
        /// Source error produced by `serde_json`.
        #[source]
        source: serde_json::Error,
    },
    /// Preparing the upsert statement failed.
    #[error("failed to prepare record upsert statement")]
    PrepareUpsert {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Writing a record row failed.
    #[error("failed to persist {id}")]
    PersistRow {
        /// Identity of the record being persisted.
        id: ElementId,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Committing the transaction failed.
    #[error("failed to commit record persistence transaction")]
    Commit {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
}

const CREATE_SCHEMA: &str = "CREATE TABLE IF NOT EXISTS pois (
    kind TEXT NOT NULL,
    id INTEGER NOT NULL,
    name TEXT,
    class TEXT NOT NULL,
    lon REAL NOT NULL,
    lat REAL NOT NULL,
    tags TEXT NOT NULL,
    version INTEGER NOT NULL,
    timestamp TEXT NOT NULL,
    PRIMARY KEY (kind, id)
)";

const UPSERT: &str = "INSERT INTO pois (kind, id, name, class, lon, lat, tags, version, timestamp)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
    ON CONFLICT(kind, id) DO UPDATE SET
        name = excluded.name,
        class = excluded.class,
        lon = excluded.lon,
        lat = excluded.lat,
        tags = excluded.tags,
        version = excluded.version,
        timestamp = excluded.timestamp";

/// Persist classified records to a SQLite database on disk.
///
/// Rows are keyed by `(kind, id)`; re-running an import updates existing
/// rows in place. Parent directories are created automatically and the
/// `pois` table is initialised if missing. Each row stores the record's
/// representative point; records without one are skipped. All writes share
/// one transaction.
///
/// Returns the number of rows written.
///
/// # Errors
/// Returns [`PersistRecordsError`] when the database cannot be prepared or
/// a row cannot be written. The transaction is rolled back on failure.
pub fn persist_records_to_sqlite(
    path: &Utf8Path,
    records: &[ClassifiedRecord],
) -> Result<usize, PersistRecordsError> {
    poimap_fs::ensure_parent_dir(path).map_err(|source| PersistRecordsError::CreateDirectory {
        path: path.to_path_buf(),
        source,
    })?;
    let mut connection =
        Connection::open(path.as_std_path()).map_err(|source| PersistRecordsError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    let transaction = connection
        .transaction()
        .map_err(|source| PersistRecordsError::BeginTransaction { source })?;

    transaction
        .execute(CREATE_SCHEMA, [])
        .map_err(|source| PersistRecordsError::CreateSchema { source })?;
    let written = upsert_rows(&transaction, records)?;

    transaction
        .commit()
        .map_err(|source| PersistRecordsError::Commit { source })?;

    let skipped = records.len() - written;
    if skipped > 0 {
        info!("Skipped {skipped} records without a representative point");
    }
    Ok(written)
}

fn upsert_rows(
    transaction: &Transaction<'_>,
    records: &[ClassifiedRecord],
) -> Result<usize, PersistRecordsError> {
    if records.is_empty() {
        return Ok(0);
    }

    let mut statement = transaction
        .prepare(UPSERT)
        .map_err(|source| PersistRecordsError::PrepareUpsert { source })?;

    let mut written = 0;
    for record in records {
        let Some(location) = record.geometry.as_ref().and_then(representative_point) else {
            debug!("No representative point for {}", record.id);
            continue;
        };
        let tags = to_string(&record.tags).map_err(|source| PersistRecordsError::SerializeTags {
            id: record.id,
            source,
        })?;
        statement
            .execute(params![
                record.id.kind.as_str(),
                record.id.id,
                record.name.as_deref(),
                record.class.as_str(),
                location.x,
                location.y,
                tags,
                record.version,
                record.timestamp.as_str(),
            ])
            .map_err(|source| PersistRecordsError::PersistRow {
                id: record.id,
                source,
            })?;
        written += 1;
    }

    Ok(written)
}
