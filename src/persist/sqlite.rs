//! SQLite-backed append-only race log journal.

use std::path::Path;

use rusqlite::{Connection, params};
use serde::Deserialize;

use crate::{
    author::AuthorRegistry,
    core::RaceLog,
    record::{EventRecord, EventRecordEnvelope, RECORD_FORMAT_VERSION},
};

use super::{EventSink, PersistError, PersistResult};

/// SQLite implementation of [`crate::persist::EventSink`] for one race log.
pub struct SqliteEventStore {
    conn: Connection,
    race_log_id: String,
}

impl SqliteEventStore {
    /// Opens or creates a journal at `path` for the log `race_log_id`.
    ///
    /// Enables WAL mode and sets `synchronous=NORMAL`.
    pub fn open(path: impl AsRef<Path>, race_log_id: impl Into<String>) -> PersistResult<Self> {
        let conn = Connection::open(path)?;
        Self::init_connection(conn, race_log_id.into())
    }

    /// Opens an in-memory journal.
    pub fn open_in_memory(race_log_id: impl Into<String>) -> PersistResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(conn, race_log_id.into())
    }

    fn init_connection(conn: Connection, race_log_id: String) -> PersistResult<Self> {
        conn.execute_batch(include_str!("schema.sql"))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Ok(Self { conn, race_log_id })
    }

    pub fn race_log_id(&self) -> &str {
        &self.race_log_id
    }

    /// Records of this log in the order they were appended.
    pub fn load_records(&self) -> PersistResult<Vec<EventRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT payload FROM race_log_events WHERE race_log_id = ?1 ORDER BY seq ASC")?;
        let rows = stmt.query_map(params![self.race_log_id], |row| row.get::<_, Vec<u8>>(0))?;

        let mut out = Vec::new();
        for payload in rows {
            out.push(decode_record(&payload?)?);
        }
        Ok(out)
    }

    /// Replays the journal into `log` through [`RaceLog::load`]; listeners
    /// are not notified. Returns how many events were newly loaded.
    pub fn load_into(&self, log: &RaceLog, authors: &AuthorRegistry) -> PersistResult<usize> {
        let mut loaded = 0;
        for record in self.load_records()? {
            if log.load(record.into_event(authors)) {
                loaded += 1;
            }
        }
        Ok(loaded)
    }

    /// Number of journaled records for this log.
    pub fn event_count(&self) -> PersistResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM race_log_events WHERE race_log_id = ?1",
            params![self.race_log_id],
            |row| row.get(0),
        )?;
        u64::try_from(count).map_err(|_| PersistError::Message(format!("negative event count {count}")))
    }
}

impl EventSink for SqliteEventStore {
    fn append_records(&mut self, records: &[EventRecord]) -> PersistResult<u64> {
        if records.is_empty() {
            return self.event_count();
        }

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO race_log_events(race_log_id, event_id, event_type, pass_id, created_at, payload) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for record in records {
                let created_at = i64::try_from(record.created_at).map_err(|_| {
                    PersistError::Message(format!("created_at {} of {} out of range", record.created_at, record.id))
                })?;
                let payload = serde_json::to_vec(&EventRecordEnvelope::new(record.clone()))?;
                stmt.execute(params![
                    self.race_log_id,
                    record.id.as_str(),
                    record.kind.event_type().as_str(),
                    i64::from(record.pass_id),
                    created_at,
                    payload,
                ])?;
            }
        }
        tx.commit()?;

        self.event_count()
    }

    fn flush(&mut self) -> PersistResult<()> {
        self.conn.execute_batch("PRAGMA wal_checkpoint(PASSIVE);")?;
        Ok(())
    }
}

#[derive(Deserialize)]
struct VersionProbe {
    format_version: u16,
}

fn decode_record(payload: &[u8]) -> PersistResult<EventRecord> {
    // Version first: a newer payload may not parse as a current record.
    let probe: VersionProbe = serde_json::from_slice(payload)?;
    if probe.format_version != RECORD_FORMAT_VERSION {
        return Err(PersistError::UnsupportedFormat(probe.format_version));
    }
    let envelope: EventRecordEnvelope = serde_json::from_slice(payload)?;
    Ok(envelope.record)
}
