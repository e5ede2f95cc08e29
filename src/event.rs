//! Immutable race log events and their variant payloads.

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{
    author::AuthorRef,
    listener::{ListenerResult, RaceLogEventVisitor},
    types::{CompetitorId, EventId, Flag, PassId, RaceStatus, RacingProcedureType, TimeMs},
};

/// Shared, immutable event handle.
pub type EventRef = Arc<RaceLogEvent>;

/// Upper/lower flag pair raised or lowered by the committee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagState {
    /// Flag on the upper hoist.
    pub upper_flag: Flag,
    /// Flag on the lower hoist.
    pub lower_flag: Flag,
    /// True when the flags are being displayed, false when lowered.
    pub is_displayed: bool,
}

/// Transition to a new race status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    /// Status entered by this event.
    pub next_status: RaceStatus,
}

/// Proposed start time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartTimeProposal {
    /// Start time in milliseconds since epoch.
    pub start_time: TimeMs,
}

/// Course area assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseArea {
    /// Identifier of the course area.
    pub course_area_id: String,
}

/// Course layout as an ordered list of waypoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseDesign {
    /// Course name.
    pub name: String,
    /// Waypoint names in sailing order.
    pub waypoints: Vec<String>,
}

/// One competitor's finishing slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitorResult {
    /// Finisher.
    pub competitor: CompetitorId,
    /// One-based rank.
    pub rank: u32,
    /// Penalty or scoring code (e.g. `DNF`), if any.
    pub max_points_reason: Option<String>,
}

/// Finishing order as recorded by the committee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishPositions {
    /// Ordered results.
    pub positions: Vec<CompetitorResult>,
}

/// Gate start pathfinder nomination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pathfinder {
    /// Sail id of the pathfinder boat.
    pub pathfinder_id: String,
}

/// Gate line opening timings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateLineOpening {
    /// Time until the gate launch boat stops, in milliseconds.
    pub gate_launch_stop_ms: Option<u64>,
    /// Time until the golf flag comes down, in milliseconds.
    pub golf_down_ms: Option<u64>,
}

/// Start procedure selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartProcedure {
    /// Selected procedure.
    pub procedure: RacingProcedureType,
}

/// Start of the protest time window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtestStart {
    /// Protest window opening time.
    pub protest_start_time: TimeMs,
}

/// Wind observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindFix {
    /// Latitude in degrees.
    pub lat_deg: f64,
    /// Longitude in degrees.
    pub lng_deg: f64,
    /// Direction the wind blows from, in degrees.
    pub from_bearing_deg: f64,
    /// Speed in knots.
    pub speed_knots: f64,
}

/// Binding of a tracking device to a competitor or mark for a time range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceMapping {
    /// Device identifier (e.g. IMEI).
    pub device_id: String,
    /// Competitor id or mark name the device is mapped to.
    pub mapped_to: String,
    /// Start of validity; open when `None`.
    pub from: Option<TimeMs>,
    /// End of validity; open when `None`.
    pub to: Option<TimeMs>,
}

/// Marks the race as one to be tracked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingDenotation {
    /// Race name used by the tracker.
    pub race_name: String,
    /// Boat class name.
    pub boat_class: String,
}

/// Registers a competitor for the race.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitorRegistration {
    /// Registered competitor.
    pub competitor: CompetitorId,
}

/// Logical retraction of a prior event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revocation {
    /// Id of the event being revoked.
    pub revoked_event_id: EventId,
    /// Type name of the revoked event.
    pub revoked_event_type: String,
    /// Short description of the revoked event.
    pub revoked_event_short_info: String,
    /// Optional operator-supplied reason.
    pub reason: Option<String>,
}

/// Variant-specific payload. The set is closed: every listener handles every
/// variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    /// Flag raised or lowered.
    Flag(FlagState),
    /// Race status transition.
    RaceStatus(StatusChange),
    /// Start time proposed.
    StartTime(StartTimeProposal),
    /// New pass started.
    PassChange,
    /// Course area changed.
    CourseAreaChanged(CourseArea),
    /// Course design changed.
    CourseDesignChanged(CourseDesign),
    /// Finish positioning list edited.
    FinishPositioningListChanged(FinishPositions),
    /// Finish positioning confirmed.
    FinishPositioningConfirmed(FinishPositions),
    /// Pathfinder nominated.
    Pathfinder(Pathfinder),
    /// Gate line opening times set.
    GateLineOpeningTime(GateLineOpening),
    /// Start procedure changed.
    StartProcedureChanged(StartProcedure),
    /// Protest window opened.
    ProtestStartTime(ProtestStart),
    /// Wind observation.
    WindFix(WindFix),
    /// Device mapped to a competitor.
    DeviceCompetitorMapping(DeviceMapping),
    /// Device mapped to a mark.
    DeviceMarkMapping(DeviceMapping),
    /// Race denoted for tracking.
    DenoteForTracking(TrackingDenotation),
    /// Tracking started.
    StartTracking,
    /// Competitor registered.
    RegisterCompetitor(CompetitorRegistration),
    /// Prior event revoked.
    Revoke(Revocation),
}

/// Payload-free discriminant of [`EventKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// See [`EventKind::Flag`].
    Flag,
    /// See [`EventKind::RaceStatus`].
    RaceStatus,
    /// See [`EventKind::StartTime`].
    StartTime,
    /// See [`EventKind::PassChange`].
    PassChange,
    /// See [`EventKind::CourseAreaChanged`].
    CourseAreaChanged,
    /// See [`EventKind::CourseDesignChanged`].
    CourseDesignChanged,
    /// See [`EventKind::FinishPositioningListChanged`].
    FinishPositioningListChanged,
    /// See [`EventKind::FinishPositioningConfirmed`].
    FinishPositioningConfirmed,
    /// See [`EventKind::Pathfinder`].
    Pathfinder,
    /// See [`EventKind::GateLineOpeningTime`].
    GateLineOpeningTime,
    /// See [`EventKind::StartProcedureChanged`].
    StartProcedureChanged,
    /// See [`EventKind::ProtestStartTime`].
    ProtestStartTime,
    /// See [`EventKind::WindFix`].
    WindFix,
    /// See [`EventKind::DeviceCompetitorMapping`].
    DeviceCompetitorMapping,
    /// See [`EventKind::DeviceMarkMapping`].
    DeviceMarkMapping,
    /// See [`EventKind::DenoteForTracking`].
    DenoteForTracking,
    /// See [`EventKind::StartTracking`].
    StartTracking,
    /// See [`EventKind::RegisterCompetitor`].
    RegisterCompetitor,
    /// See [`EventKind::Revoke`].
    Revoke,
}

impl EventType {
    /// Stable type name used in revocations and journal rows.
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::Flag => "FlagEvent",
            EventType::RaceStatus => "RaceStatusEvent",
            EventType::StartTime => "StartTimeEvent",
            EventType::PassChange => "PassChangeEvent",
            EventType::CourseAreaChanged => "CourseAreaChangedEvent",
            EventType::CourseDesignChanged => "CourseDesignChangedEvent",
            EventType::FinishPositioningListChanged => "FinishPositioningListChangedEvent",
            EventType::FinishPositioningConfirmed => "FinishPositioningConfirmedEvent",
            EventType::Pathfinder => "PathfinderEvent",
            EventType::GateLineOpeningTime => "GateLineOpeningTimeEvent",
            EventType::StartProcedureChanged => "StartProcedureChangedEvent",
            EventType::ProtestStartTime => "ProtestStartTimeEvent",
            EventType::WindFix => "WindFixEvent",
            EventType::DeviceCompetitorMapping => "DeviceCompetitorMappingEvent",
            EventType::DeviceMarkMapping => "DeviceMarkMappingEvent",
            EventType::DenoteForTracking => "DenoteForTrackingEvent",
            EventType::StartTracking => "StartTrackingEvent",
            EventType::RegisterCompetitor => "RegisterCompetitorEvent",
            EventType::Revoke => "RevokeEvent",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl EventKind {
    /// Returns the payload discriminant.
    pub fn event_type(&self) -> EventType {
        match self {
            EventKind::Flag(_) => EventType::Flag,
            EventKind::RaceStatus(_) => EventType::RaceStatus,
            EventKind::StartTime(_) => EventType::StartTime,
            EventKind::PassChange => EventType::PassChange,
            EventKind::CourseAreaChanged(_) => EventType::CourseAreaChanged,
            EventKind::CourseDesignChanged(_) => EventType::CourseDesignChanged,
            EventKind::FinishPositioningListChanged(_) => EventType::FinishPositioningListChanged,
            EventKind::FinishPositioningConfirmed(_) => EventType::FinishPositioningConfirmed,
            EventKind::Pathfinder(_) => EventType::Pathfinder,
            EventKind::GateLineOpeningTime(_) => EventType::GateLineOpeningTime,
            EventKind::StartProcedureChanged(_) => EventType::StartProcedureChanged,
            EventKind::ProtestStartTime(_) => EventType::ProtestStartTime,
            EventKind::WindFix(_) => EventType::WindFix,
            EventKind::DeviceCompetitorMapping(_) => EventType::DeviceCompetitorMapping,
            EventKind::DeviceMarkMapping(_) => EventType::DeviceMarkMapping,
            EventKind::DenoteForTracking(_) => EventType::DenoteForTracking,
            EventKind::StartTracking => EventType::StartTracking,
            EventKind::RegisterCompetitor(_) => EventType::RegisterCompetitor,
            EventKind::Revoke(_) => EventType::Revoke,
        }
    }
}

/// Immutable, typed fact about a race.
#[derive(Debug, Clone, PartialEq)]
pub struct RaceLogEvent {
    id: EventId,
    created_at: TimeMs,
    logical_time_point: TimeMs,
    pass_id: PassId,
    author: AuthorRef,
    involved_competitors: Vec<CompetitorId>,
    kind: EventKind,
}

impl RaceLogEvent {
    /// Builds a shared event from all of its parts.
    pub fn new(
        id: EventId,
        created_at: TimeMs,
        logical_time_point: TimeMs,
        pass_id: PassId,
        author: AuthorRef,
        involved_competitors: Vec<CompetitorId>,
        kind: EventKind,
    ) -> EventRef {
        Arc::new(Self {
            id,
            created_at,
            logical_time_point,
            pass_id,
            author,
            involved_competitors,
            kind,
        })
    }

    /// Event identity.
    pub fn id(&self) -> &EventId {
        &self.id
    }

    /// Wall-clock time the event was authored.
    pub fn created_at(&self) -> TimeMs {
        self.created_at
    }

    /// Time point the event is about.
    pub fn logical_time_point(&self) -> TimeMs {
        self.logical_time_point
    }

    /// Pass this event belongs to.
    pub fn pass_id(&self) -> PassId {
        self.pass_id
    }

    /// Reporting identity.
    pub fn author(&self) -> &AuthorRef {
        &self.author
    }

    /// Competitors the event refers to.
    pub fn involved_competitors(&self) -> &[CompetitorId] {
        &self.involved_competitors
    }

    /// Variant payload.
    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    /// Payload discriminant.
    pub fn event_type(&self) -> EventType {
        self.kind.event_type()
    }

    /// Only tracking-related bindings may be revoked.
    pub fn is_revokable(&self) -> bool {
        matches!(
            self.kind,
            EventKind::DeviceCompetitorMapping(_)
                | EventKind::DeviceMarkMapping(_)
                | EventKind::DenoteForTracking(_)
                | EventKind::StartTracking
                | EventKind::RegisterCompetitor(_)
        )
    }

    /// True when accepting this event must invalidate results derived from
    /// the log (leaderboards, scoring caches).
    pub fn invalidates_caches(&self) -> bool {
        matches!(
            self.kind,
            EventKind::FinishPositioningConfirmed(_)
                | EventKind::FinishPositioningListChanged(_)
                | EventKind::RaceStatus(_)
                | EventKind::StartTime(_)
                | EventKind::PassChange
                | EventKind::Revoke(_)
        )
    }

    /// Id of the revoked event when this is a revocation.
    pub fn revoked_event_id(&self) -> Option<&EventId> {
        match &self.kind {
            EventKind::Revoke(r) => Some(&r.revoked_event_id),
            _ => None,
        }
    }

    /// One-line human readable summary.
    pub fn short_info(&self) -> String {
        match &self.kind {
            EventKind::Flag(f) => format!(
                "upper={:?} lower={:?} displayed={}",
                f.upper_flag, f.lower_flag, f.is_displayed
            ),
            EventKind::RaceStatus(s) => format!("status={:?}", s.next_status),
            EventKind::StartTime(s) => format!("startTime={}", s.start_time),
            EventKind::PassChange => format!("pass={}", self.pass_id),
            EventKind::CourseAreaChanged(c) => format!("courseArea={}", c.course_area_id),
            EventKind::CourseDesignChanged(c) => {
                format!("course={} waypoints={}", c.name, c.waypoints.len())
            }
            EventKind::FinishPositioningListChanged(p) | EventKind::FinishPositioningConfirmed(p) => {
                format!("positions={}", p.positions.len())
            }
            EventKind::Pathfinder(p) => format!("pathfinder={}", p.pathfinder_id),
            EventKind::GateLineOpeningTime(g) => format!(
                "gateLaunchStop={:?} golfDown={:?}",
                g.gate_launch_stop_ms, g.golf_down_ms
            ),
            EventKind::StartProcedureChanged(s) => format!("procedure={:?}", s.procedure),
            EventKind::ProtestStartTime(p) => format!("protestStart={}", p.protest_start_time),
            EventKind::WindFix(w) => format!(
                "wind {:.1}kn from {:.0}deg",
                w.speed_knots, w.from_bearing_deg
            ),
            EventKind::DeviceCompetitorMapping(m) | EventKind::DeviceMarkMapping(m) => {
                format!("device={} mappedTo={}", m.device_id, m.mapped_to)
            }
            EventKind::DenoteForTracking(d) => {
                format!("race={} boatClass={}", d.race_name, d.boat_class)
            }
            EventKind::StartTracking => "startTracking".to_string(),
            EventKind::RegisterCompetitor(r) => format!("competitor={}", r.competitor.0),
            EventKind::Revoke(r) => format!(
                "revokes {} ({}: {})",
                r.revoked_event_id, r.revoked_event_type, r.revoked_event_short_info
            ),
        }
    }

    /// Dispatches to the listener method for this event's variant.
    pub fn accept(&self, visitor: &dyn RaceLogEventVisitor) -> ListenerResult {
        match &self.kind {
            EventKind::Flag(p) => visitor.visit_flag(self, p),
            EventKind::RaceStatus(p) => visitor.visit_race_status(self, p),
            EventKind::StartTime(p) => visitor.visit_start_time(self, p),
            EventKind::PassChange => visitor.visit_pass_change(self),
            EventKind::CourseAreaChanged(p) => visitor.visit_course_area_changed(self, p),
            EventKind::CourseDesignChanged(p) => visitor.visit_course_design_changed(self, p),
            EventKind::FinishPositioningListChanged(p) => {
                visitor.visit_finish_positioning_list_changed(self, p)
            }
            EventKind::FinishPositioningConfirmed(p) => {
                visitor.visit_finish_positioning_confirmed(self, p)
            }
            EventKind::Pathfinder(p) => visitor.visit_pathfinder(self, p),
            EventKind::GateLineOpeningTime(p) => visitor.visit_gate_line_opening_time(self, p),
            EventKind::StartProcedureChanged(p) => visitor.visit_start_procedure_changed(self, p),
            EventKind::ProtestStartTime(p) => visitor.visit_protest_start_time(self, p),
            EventKind::WindFix(p) => visitor.visit_wind_fix(self, p),
            EventKind::DeviceCompetitorMapping(p) => {
                visitor.visit_device_competitor_mapping(self, p)
            }
            EventKind::DeviceMarkMapping(p) => visitor.visit_device_mark_mapping(self, p),
            EventKind::DenoteForTracking(p) => visitor.visit_denote_for_tracking(self, p),
            EventKind::StartTracking => visitor.visit_start_tracking(self),
            EventKind::RegisterCompetitor(p) => visitor.visit_register_competitor(self, p),
            EventKind::Revoke(p) => visitor.visit_revoke(self, p),
        }
    }
}

impl fmt::Display for RaceLogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}] pass={} by {} at {}: {}",
            self.event_type(),
            self.id,
            self.pass_id,
            self.author.name,
            self.created_at,
            self.short_info()
        )
    }
}
