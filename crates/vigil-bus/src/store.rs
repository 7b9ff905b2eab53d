// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable append-only streams with consumer-group cursors.
//!
//! Each stream is a slice of the `stream_entries` table ordered by a global
//! autoincrement sequence. A consumer group holds a cursor per stream;
//! a group read atomically claims the next entries past the cursor and
//! records them as pending until acknowledged. Within a group each entry is
//! delivered to exactly one consumer; across groups every group sees every
//! entry.

use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use rusqlite::params;
use tokio::sync::watch;
use tokio_rusqlite::Connection;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use vigil_core::VigilError;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS stream_entries (
    seq      INTEGER PRIMARY KEY AUTOINCREMENT,
    stream   TEXT NOT NULL,
    fields   TEXT NOT NULL,
    added_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_stream_entries_stream ON stream_entries (stream, seq);

CREATE TABLE IF NOT EXISTS stream_groups (
    stream TEXT NOT NULL,
    grp    TEXT NOT NULL,
    cursor INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (stream, grp)
);

CREATE TABLE IF NOT EXISTS stream_pending (
    stream       TEXT NOT NULL,
    grp          TEXT NOT NULL,
    seq          INTEGER NOT NULL,
    consumer     TEXT NOT NULL,
    delivered_at TEXT NOT NULL,
    PRIMARY KEY (stream, grp, seq)
);
";

/// An entry claimed from a stream: the sequence number doubles as the
/// message id for acknowledgment.
#[derive(Debug, Clone)]
pub struct StreamEntry {
    pub seq: i64,
    pub fields: String,
}

/// SQLite-backed stream storage.
///
/// Opens its own connection; the schema is applied on open. A watch channel
/// carries an append counter so blocked group reads wake without polling.
pub struct StreamStore {
    conn: Connection,
    append_tx: watch::Sender<u64>,
}

impl StreamStore {
    pub async fn open(path: &str) -> Result<Self, VigilError> {
        let conn = Connection::open(path).await.map_err(map_err)?;
        conn.call(|conn| {
            conn.pragma_update(None, "journal_mode", "WAL")?;
            conn.pragma_update(None, "synchronous", "NORMAL")?;
            conn.pragma_update(None, "busy_timeout", 5000)?;
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await
        .map_err(map_err)?;

        let (append_tx, _) = watch::channel(0u64);
        Ok(StreamStore { conn, append_tx })
    }

    /// Append an entry and wake blocked readers. Returns the sequence number.
    pub async fn append(&self, stream: &str, fields: String) -> Result<i64, VigilError> {
        let stream = stream.to_string();
        let added_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        let seq = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO stream_entries (stream, fields, added_at) VALUES (?1, ?2, ?3)",
                    params![stream, fields, added_at],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .map_err(map_err)?;

        self.append_tx.send_modify(|n| *n += 1);
        Ok(seq)
    }

    /// Create a consumer group if absent. Subscribing an existing group is
    /// not an error.
    pub async fn create_group(&self, stream: &str, group: &str) -> Result<(), VigilError> {
        let stream = stream.to_string();
        let group = group.to_string();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT OR IGNORE INTO stream_groups (stream, grp, cursor) VALUES (?1, ?2, 0)",
                    params![stream, group],
                )?;
                Ok(())
            })
            .await
            .map_err(map_err)
    }

    /// Atomically claim up to `count` entries past the group cursor for
    /// `consumer`, advancing the cursor and recording the claims as pending.
    pub async fn read_group(
        &self,
        stream: &str,
        group: &str,
        consumer: &str,
        count: u32,
    ) -> Result<Vec<StreamEntry>, VigilError> {
        let stream = stream.to_string();
        let group = group.to_string();
        let consumer = consumer.to_string();
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;

                let cursor: i64 = tx
                    .query_row(
                        "SELECT cursor FROM stream_groups WHERE stream = ?1 AND grp = ?2",
                        params![stream, group],
                        |row| row.get(0),
                    )
                    .map_err(|e| match e {
                        rusqlite::Error::QueryReturnedNoRows => tokio_rusqlite::Error::Other(
                            format!("no consumer group '{group}' on stream '{stream}'").into(),
                        ),
                        other => other.into(),
                    })?;

                let entries = {
                    let mut stmt = tx.prepare(
                        "SELECT seq, fields FROM stream_entries
                         WHERE stream = ?1 AND seq > ?2
                         ORDER BY seq
                         LIMIT ?3",
                    )?;
                    let rows = stmt
                        .query_map(params![stream, cursor, count as i64], |row| {
                            Ok(StreamEntry {
                                seq: row.get(0)?,
                                fields: row.get(1)?,
                            })
                        })?
                        .collect::<Result<Vec<_>, _>>()?;
                    rows
                };

                if let Some(last) = entries.last() {
                    tx.execute(
                        "UPDATE stream_groups SET cursor = ?3 WHERE stream = ?1 AND grp = ?2",
                        params![stream, group, last.seq],
                    )?;
                    let delivered_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
                    for entry in &entries {
                        tx.execute(
                            "INSERT OR REPLACE INTO stream_pending
                                 (stream, grp, seq, consumer, delivered_at)
                             VALUES (?1, ?2, ?3, ?4, ?5)",
                            params![stream, group, entry.seq, consumer, delivered_at],
                        )?;
                    }
                }

                tx.commit()?;
                Ok(entries)
            })
            .await
            .map_err(map_err)
    }

    /// Like [`read_group`](Self::read_group) but blocks up to `block` for
    /// entries to arrive. Returns an empty batch on timeout or cancellation.
    pub async fn read_group_blocking(
        &self,
        stream: &str,
        group: &str,
        consumer: &str,
        count: u32,
        block: Duration,
        cancel: &CancellationToken,
    ) -> Result<Vec<StreamEntry>, VigilError> {
        let deadline = tokio::time::Instant::now() + block;
        let mut appends = self.append_tx.subscribe();

        loop {
            // Mark the current append counter before reading so a publish
            // racing with the read is caught by the next `changed()`.
            appends.borrow_and_update();

            let batch = self.read_group(stream, group, consumer, count).await?;
            if !batch.is_empty() {
                return Ok(batch);
            }

            tokio::select! {
                _ = appends.changed() => {}
                _ = tokio::time::sleep_until(deadline) => return Ok(Vec::new()),
                _ = cancel.cancelled() => return Ok(Vec::new()),
            }
        }
    }

    /// Acknowledge a claimed entry, removing it from the pending set.
    pub async fn ack(&self, stream: &str, group: &str, seq: i64) -> Result<(), VigilError> {
        let stream = stream.to_string();
        let group = group.to_string();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "DELETE FROM stream_pending WHERE stream = ?1 AND grp = ?2 AND seq = ?3",
                    params![stream, group, seq],
                )?;
                Ok(())
            })
            .await
            .map_err(map_err)?;
        debug!(seq, "stream entry acknowledged");
        Ok(())
    }

    /// Number of claimed-but-unacknowledged entries for a group.
    pub async fn pending_count(&self, stream: &str, group: &str) -> Result<i64, VigilError> {
        let stream = stream.to_string();
        let group = group.to_string();
        self.conn
            .call(move |conn| {
                let n = conn.query_row(
                    "SELECT COUNT(*) FROM stream_pending WHERE stream = ?1 AND grp = ?2",
                    params![stream, group],
                    |row| row.get(0),
                )?;
                Ok(n)
            })
            .await
            .map_err(map_err)
    }

    /// Total entries ever appended to a stream.
    pub async fn stream_len(&self, stream: &str) -> Result<i64, VigilError> {
        let stream = stream.to_string();
        self.conn
            .call(move |conn| {
                let n = conn.query_row(
                    "SELECT COUNT(*) FROM stream_entries WHERE stream = ?1",
                    params![stream],
                    |row| row.get(0),
                )?;
                Ok(n)
            })
            .await
            .map_err(map_err)
    }
}

fn map_err(err: tokio_rusqlite::Error) -> VigilError {
    VigilError::Bus {
        message: "stream storage failure".into(),
        source: Some(Box::new(err)),
    }
}
