//! Shared primitive IDs and race-related enums.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Index of one attempt to start and run a race.
pub type PassId = u32;
/// Milliseconds since the Unix epoch.
pub type TimeMs = u64;
/// Identifier of a polling client (browser tab, device, replica).
pub type ClientId = Uuid;

/// Pass used before any event has been accepted.
pub const DEFAULT_PASS_ID: PassId = 0;

/// Opaque, serializable event identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Wraps a producer-supplied identity.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random identity.
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the identity as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Reference to a competitor known to the surrounding regatta model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompetitorId(pub String);

impl From<&str> for CompetitorId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Signal flags shown by the race committee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Flag {
    /// Alphabet flag "A".
    Alpha,
    /// Answering pennant (postponement).
    Ap,
    /// Black flag.
    Black,
    /// Blue flag (finish line manned).
    Blue,
    /// Class flag.
    Class,
    /// Individual recall.
    X,
    /// General recall.
    FirstSubstitute,
    /// Abandonment.
    November,
    /// Preparatory "I" flag.
    India,
    /// Preparatory "P" flag.
    Papa,
    /// Preparatory "Z" flag.
    Zulu,
    /// Shorten course.
    Sierra,
    /// Gate start: golf flag.
    Golf,
    /// Essential start sequence flag "ESS".
    Ess,
    /// No flag.
    None,
}

/// Lifecycle status of a race pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RaceStatus {
    /// Nothing known yet.
    Unscheduled,
    /// Start time set, sequence not yet running.
    Scheduled,
    /// Start sequence running.
    StartPhase,
    /// Race started.
    Running,
    /// First boat finished.
    Finishing,
    /// Finishing positions confirmed.
    Finished,
}

/// Start procedure family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RacingProcedureType {
    /// Racing Rules of Sailing 26 start.
    Rrs26,
    /// Gate start with a pathfinder.
    GateStart,
    /// ESS start sequence.
    Ess,
    /// Basic countdown.
    Basic,
    /// League start.
    League,
    /// Not specified.
    Unknown,
}
