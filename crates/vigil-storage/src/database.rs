// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. Migrations run on open; refinery tracks applied migrations in its
//! own `refinery_schema_history` table.

use tokio_rusqlite::Connection;
use tracing::debug;

use vigil_core::VigilError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Handle to the SQLite database.
#[derive(Clone)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (creating if necessary) the database at `path`, apply pragmas,
    /// and run pending migrations.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, VigilError> {
        let conn = Connection::open(path).await.map_err(map_tr_err)?;

        conn.call(move |conn| {
            if wal_mode {
                conn.pragma_update(None, "journal_mode", "WAL")?;
            }
            conn.pragma_update(None, "synchronous", "NORMAL")?;
            conn.pragma_update(None, "busy_timeout", 5000)?;
            conn.pragma_update(None, "foreign_keys", "ON")?;

            embedded::migrations::runner()
                .run(conn)
                .map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path, wal_mode, "database opened");
        Ok(Database { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(&self) -> Result<(), VigilError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

/// Translate a tokio-rusqlite error into the domain error taxonomy.
pub fn map_tr_err(err: tokio_rusqlite::Error) -> VigilError {
    match err {
        tokio_rusqlite::Error::Rusqlite(e) => translate_sqlite_error(e),
        tokio_rusqlite::Error::ConnectionClosed => {
            VigilError::Connection("database connection closed".into())
        }
        other => VigilError::Storage {
            source: Box::new(other),
        },
    }
}

// SQLite extended result codes for constraint violations.
const SQLITE_CONSTRAINT_PRIMARYKEY: i32 = 1555;
const SQLITE_CONSTRAINT_UNIQUE: i32 = 2067;
const SQLITE_CONSTRAINT_FOREIGNKEY: i32 = 787;

/// Map rusqlite errors to the generic domain errors so callers never see
/// storage-level types.
pub fn translate_sqlite_error(err: rusqlite::Error) -> VigilError {
    match err {
        rusqlite::Error::QueryReturnedNoRows => VigilError::NotFound,
        rusqlite::Error::SqliteFailure(code, message) => match code.code {
            rusqlite::ErrorCode::ConstraintViolation => match code.extended_code {
                SQLITE_CONSTRAINT_PRIMARYKEY | SQLITE_CONSTRAINT_UNIQUE => VigilError::DuplicateKey,
                SQLITE_CONSTRAINT_FOREIGNKEY => VigilError::ForeignKeyViolation,
                _ => VigilError::InvalidData(
                    message.unwrap_or_else(|| "constraint violation".into()),
                ),
            },
            rusqlite::ErrorCode::CannotOpen
            | rusqlite::ErrorCode::DatabaseBusy
            | rusqlite::ErrorCode::DatabaseLocked => {
                VigilError::Connection(message.unwrap_or_else(|| "database unavailable".into()))
            }
            _ => VigilError::Storage {
                source: Box::new(rusqlite::Error::SqliteFailure(code, message)),
            },
        },
        other => VigilError::Storage {
            source: Box::new(other),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_file_and_runs_migrations() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("open.db");
        let db = Database::open(path.to_str().unwrap(), true).await.unwrap();
        assert!(path.exists());

        // The alerts table exists after migration.
        let count: i64 = db
            .connection()
            .call(|conn| {
                let n = conn.query_row("SELECT COUNT(*) FROM alerts", [], |row| row.get(0))?;
                Ok(n)
            })
            .await
            .unwrap();
        assert_eq!(count, 0);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn reopen_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reopen.db");
        let path_str = path.to_str().unwrap();

        let db = Database::open(path_str, true).await.unwrap();
        db.close().await.unwrap();
        drop(db);

        // Migrations are tracked; opening again must not fail.
        let db = Database::open(path_str, true).await.unwrap();
        db.close().await.unwrap();
    }

    #[test]
    fn no_rows_translates_to_not_found() {
        let err = translate_sqlite_error(rusqlite::Error::QueryReturnedNoRows);
        assert!(matches!(err, VigilError::NotFound));
    }
}
