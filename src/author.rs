//! Reporting identities and their shared handles.

use std::{cmp::Ordering, fmt, sync::Arc, sync::Mutex};

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

/// A named, priority-ranked reporting identity.
///
/// A higher `priority` is more authoritative. Authors are created once per
/// reporting identity and shared through [`AuthorRef`]; two events have the
/// same author only when they hold the same handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Author {
    /// Display name of the device or operator.
    pub name: String,
    /// Rank; higher outranks lower.
    pub priority: i32,
}

/// Shared author handle with reference identity.
pub type AuthorRef = Arc<Author>;

impl Author {
    /// Creates a new shared author handle.
    pub fn new(name: impl Into<String>, priority: i32) -> AuthorRef {
        Arc::new(Self {
            name: name.into(),
            priority,
        })
    }

    /// Compares by authority only.
    pub fn compare_priority(&self, other: &Self) -> Ordering {
        self.priority.cmp(&other.priority)
    }

    /// True when `self` carries at least the authority of `other`.
    pub fn outranks_or_equals(&self, other: &Self) -> bool {
        self.priority >= other.priority
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (priority {})", self.name, self.priority)
    }
}

/// Returns true when both handles name the same reporting identity instance.
pub fn same_author(a: &AuthorRef, b: &AuthorRef) -> bool {
    Arc::ptr_eq(a, b)
}

/// Interns authors by `(name, priority)`.
///
/// Restoring events from storage yields plain author values; the registry maps
/// each value to one handle so reference identity survives a reload.
#[derive(Debug, Default)]
pub struct AuthorRegistry {
    authors: Mutex<HashMap<(String, i32), AuthorRef>>,
}

impl AuthorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the handle for `(name, priority)`, creating it on first use.
    pub fn intern(&self, name: &str, priority: i32) -> AuthorRef {
        let mut authors = self.authors.lock().unwrap_or_else(|e| e.into_inner());
        authors
            .entry((name.to_string(), priority))
            .or_insert_with(|| Author::new(name, priority))
            .clone()
    }

    /// Number of distinct identities seen.
    pub fn len(&self) -> usize {
        self.authors.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// True when no identity has been interned.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
