//! Authoritative, in-memory event log for a single sailing race.
//!
//! Events from several reporting devices are ordered by author priority and
//! recency, deduplicated on `(pass, author, created_at, id)`, fanned out to
//! listeners and delivered incrementally to polling clients.
//!
//! # Examples
//!
//! In-memory usage with [`core::RaceLog`]:
//! ```
//! use racelog::{
//!     author::Author,
//!     core::RaceLog,
//!     factory::EventFactory,
//!     types::{Flag, RaceStatus},
//! };
//!
//! let log = RaceLog::new("race-1");
//! let factory = EventFactory::new();
//! let committee = Author::new("committee", 1);
//!
//! assert!(log.add(factory.flag(10, &committee, 0, Flag::Ap, Flag::None, true)));
//! assert!(log.add(factory.race_status(20, &committee, 0, RaceStatus::Scheduled)));
//!
//! let guard = log.read();
//! assert_eq!(guard.get_fixes_descending().expect("locked").len(), 2);
//! ```
//!
//! Journaling to SQLite from a tokio runtime:
//! ```no_run
//! use std::sync::Arc;
//!
//! use racelog::{
//!     author::Author,
//!     core::RaceLog,
//!     factory::EventFactory,
//!     persist::sqlite::SqliteEventStore,
//!     runtime::handle::{spawn_journal, JournalConfig},
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let log = Arc::new(RaceLog::new("race-1"));
//! let store = SqliteEventStore::open("racelog.db", "race-1").expect("open sqlite");
//! let journal = spawn_journal(Arc::clone(&log), Box::new(store), JournalConfig::default());
//!
//! let committee = Author::new("committee", 1);
//! log.add(EventFactory::new().start_tracking(0, &committee, 0));
//! journal.shutdown().await.expect("shutdown");
//! # }
//! ```

/// Reporting identities.
pub mod author;
/// Race log container, ordering and delivery tracking.
pub mod core;
/// Event value types.
pub mod event;
/// Event constructors.
pub mod factory;
/// Listener trait and registry.
pub mod listener;
/// Persistence abstraction and SQLite implementation.
pub mod persist;
/// Serializable event records.
pub mod record;
/// Background journal and notifications.
pub mod runtime;
/// Shared primitive types and enums.
pub mod types;
