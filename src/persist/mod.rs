pub mod sqlite;

use thiserror::Error;

use crate::record::EventRecord;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("serde: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("unsupported record format version {0}")]
    UnsupportedFormat(u16),
    #[error("{0}")]
    Message(String),
}

pub type PersistResult<T> = Result<T, PersistError>;

/// Destination for accepted events. Implementations do blocking I/O and are
/// never called while the race log holds its internal lock.
pub trait EventSink: Send {
    /// Appends `records` in order and returns the total number of records
    /// durably stored for this log.
    fn append_records(&mut self, records: &[EventRecord]) -> PersistResult<u64>;
    fn flush(&mut self) -> PersistResult<()> {
        Ok(())
    }
}
