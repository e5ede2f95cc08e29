//! Constructors for concrete event variants.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::{
    author::AuthorRef,
    event::{
        CompetitorRegistration, CompetitorResult, CourseArea, CourseDesign, DeviceMapping, EventKind,
        EventRef, FinishPositions, FlagState, GateLineOpening, Pathfinder, ProtestStart, RaceLogEvent,
        Revocation, StartProcedure, StartTimeProposal, StatusChange, TrackingDenotation, WindFix,
    },
    types::{CompetitorId, EventId, Flag, PassId, RaceStatus, RacingProcedureType, TimeMs},
};

/// Builds events with a fresh random id and `created_at` taken from the
/// factory clock. `logical_time_point` is the time the event is about.
#[derive(Debug, Clone, Copy)]
pub struct EventFactory {
    clock: fn() -> TimeMs,
}

impl Default for EventFactory {
    fn default() -> Self {
        Self { clock: now_ms }
    }
}

impl EventFactory {
    /// Factory stamping `created_at` from the system clock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory stamping `created_at` from `clock`.
    pub fn with_clock(clock: fn() -> TimeMs) -> Self {
        Self { clock }
    }

    /// Current time according to this factory.
    pub fn now(&self) -> TimeMs {
        (self.clock)()
    }

    /// Rebuilds an event with every header field supplied by the caller.
    pub fn restore(
        &self,
        id: EventId,
        created_at: TimeMs,
        logical_time_point: TimeMs,
        pass_id: PassId,
        author: AuthorRef,
        involved_competitors: Vec<CompetitorId>,
        kind: EventKind,
    ) -> EventRef {
        RaceLogEvent::new(id, created_at, logical_time_point, pass_id, author, involved_competitors, kind)
    }

    pub fn flag(
        &self,
        logical_time_point: TimeMs,
        author: &AuthorRef,
        pass_id: PassId,
        upper_flag: Flag,
        lower_flag: Flag,
        is_displayed: bool,
    ) -> EventRef {
        self.build(
            logical_time_point,
            author,
            pass_id,
            vec![],
            EventKind::Flag(FlagState {
                upper_flag,
                lower_flag,
                is_displayed,
            }),
        )
    }

    pub fn race_status(
        &self,
        logical_time_point: TimeMs,
        author: &AuthorRef,
        pass_id: PassId,
        next_status: RaceStatus,
    ) -> EventRef {
        self.build(
            logical_time_point,
            author,
            pass_id,
            vec![],
            EventKind::RaceStatus(StatusChange { next_status }),
        )
    }

    pub fn start_time(
        &self,
        logical_time_point: TimeMs,
        author: &AuthorRef,
        pass_id: PassId,
        start_time: TimeMs,
    ) -> EventRef {
        self.build(
            logical_time_point,
            author,
            pass_id,
            vec![],
            EventKind::StartTime(StartTimeProposal { start_time }),
        )
    }

    pub fn pass_change(&self, logical_time_point: TimeMs, author: &AuthorRef, pass_id: PassId) -> EventRef {
        self.build(logical_time_point, author, pass_id, vec![], EventKind::PassChange)
    }

    pub fn course_area_changed(
        &self,
        logical_time_point: TimeMs,
        author: &AuthorRef,
        pass_id: PassId,
        course_area_id: impl Into<String>,
    ) -> EventRef {
        self.build(
            logical_time_point,
            author,
            pass_id,
            vec![],
            EventKind::CourseAreaChanged(CourseArea {
                course_area_id: course_area_id.into(),
            }),
        )
    }

    pub fn course_design_changed(
        &self,
        logical_time_point: TimeMs,
        author: &AuthorRef,
        pass_id: PassId,
        course: CourseDesign,
    ) -> EventRef {
        self.build(
            logical_time_point,
            author,
            pass_id,
            vec![],
            EventKind::CourseDesignChanged(course),
        )
    }

    /// Finish order edit; the positioned competitors become the involved
    /// competitors.
    pub fn finish_positioning_list_changed(
        &self,
        logical_time_point: TimeMs,
        author: &AuthorRef,
        pass_id: PassId,
        positions: Vec<CompetitorResult>,
    ) -> EventRef {
        let involved = positions.iter().map(|p| p.competitor.clone()).collect();
        self.build(
            logical_time_point,
            author,
            pass_id,
            involved,
            EventKind::FinishPositioningListChanged(FinishPositions { positions }),
        )
    }

    pub fn finish_positioning_confirmed(
        &self,
        logical_time_point: TimeMs,
        author: &AuthorRef,
        pass_id: PassId,
        positions: Vec<CompetitorResult>,
    ) -> EventRef {
        let involved = positions.iter().map(|p| p.competitor.clone()).collect();
        self.build(
            logical_time_point,
            author,
            pass_id,
            involved,
            EventKind::FinishPositioningConfirmed(FinishPositions { positions }),
        )
    }

    pub fn pathfinder(
        &self,
        logical_time_point: TimeMs,
        author: &AuthorRef,
        pass_id: PassId,
        pathfinder_id: impl Into<String>,
    ) -> EventRef {
        self.build(
            logical_time_point,
            author,
            pass_id,
            vec![],
            EventKind::Pathfinder(Pathfinder {
                pathfinder_id: pathfinder_id.into(),
            }),
        )
    }

    pub fn gate_line_opening_time(
        &self,
        logical_time_point: TimeMs,
        author: &AuthorRef,
        pass_id: PassId,
        gate_launch_stop_ms: Option<u64>,
        golf_down_ms: Option<u64>,
    ) -> EventRef {
        self.build(
            logical_time_point,
            author,
            pass_id,
            vec![],
            EventKind::GateLineOpeningTime(GateLineOpening {
                gate_launch_stop_ms,
                golf_down_ms,
            }),
        )
    }

    pub fn start_procedure_changed(
        &self,
        logical_time_point: TimeMs,
        author: &AuthorRef,
        pass_id: PassId,
        procedure: RacingProcedureType,
    ) -> EventRef {
        self.build(
            logical_time_point,
            author,
            pass_id,
            vec![],
            EventKind::StartProcedureChanged(StartProcedure { procedure }),
        )
    }

    pub fn protest_start_time(
        &self,
        logical_time_point: TimeMs,
        author: &AuthorRef,
        pass_id: PassId,
        protest_start_time: TimeMs,
    ) -> EventRef {
        self.build(
            logical_time_point,
            author,
            pass_id,
            vec![],
            EventKind::ProtestStartTime(ProtestStart { protest_start_time }),
        )
    }

    pub fn wind_fix(&self, logical_time_point: TimeMs, author: &AuthorRef, pass_id: PassId, wind: WindFix) -> EventRef {
        self.build(logical_time_point, author, pass_id, vec![], EventKind::WindFix(wind))
    }

    pub fn device_competitor_mapping(
        &self,
        logical_time_point: TimeMs,
        author: &AuthorRef,
        pass_id: PassId,
        mapping: DeviceMapping,
    ) -> EventRef {
        let involved = vec![CompetitorId(mapping.mapped_to.clone())];
        self.build(
            logical_time_point,
            author,
            pass_id,
            involved,
            EventKind::DeviceCompetitorMapping(mapping),
        )
    }

    pub fn device_mark_mapping(
        &self,
        logical_time_point: TimeMs,
        author: &AuthorRef,
        pass_id: PassId,
        mapping: DeviceMapping,
    ) -> EventRef {
        self.build(
            logical_time_point,
            author,
            pass_id,
            vec![],
            EventKind::DeviceMarkMapping(mapping),
        )
    }

    pub fn denote_for_tracking(
        &self,
        logical_time_point: TimeMs,
        author: &AuthorRef,
        pass_id: PassId,
        race_name: impl Into<String>,
        boat_class: impl Into<String>,
    ) -> EventRef {
        self.build(
            logical_time_point,
            author,
            pass_id,
            vec![],
            EventKind::DenoteForTracking(TrackingDenotation {
                race_name: race_name.into(),
                boat_class: boat_class.into(),
            }),
        )
    }

    pub fn start_tracking(&self, logical_time_point: TimeMs, author: &AuthorRef, pass_id: PassId) -> EventRef {
        self.build(logical_time_point, author, pass_id, vec![], EventKind::StartTracking)
    }

    pub fn register_competitor(
        &self,
        logical_time_point: TimeMs,
        author: &AuthorRef,
        pass_id: PassId,
        competitor: CompetitorId,
    ) -> EventRef {
        self.build(
            logical_time_point,
            author,
            pass_id,
            vec![competitor.clone()],
            EventKind::RegisterCompetitor(CompetitorRegistration { competitor }),
        )
    }

    /// Revocation of `target`, stamped now.
    pub fn revoke(
        &self,
        author: &AuthorRef,
        pass_id: PassId,
        target: &RaceLogEvent,
        reason: Option<String>,
    ) -> EventRef {
        let now = self.now();
        self.build(
            now,
            author,
            pass_id,
            vec![],
            EventKind::Revoke(Revocation {
                revoked_event_id: target.id().clone(),
                revoked_event_type: target.event_type().as_str().to_string(),
                revoked_event_short_info: target.short_info(),
                reason,
            }),
        )
    }

    fn build(
        &self,
        logical_time_point: TimeMs,
        author: &AuthorRef,
        pass_id: PassId,
        involved_competitors: Vec<CompetitorId>,
        kind: EventKind,
    ) -> EventRef {
        RaceLogEvent::new(
            EventId::random(),
            self.now(),
            logical_time_point,
            pass_id,
            AuthorRef::clone(author),
            involved_competitors,
            kind,
        )
    }
}

pub(crate) fn now_ms() -> TimeMs {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| TimeMs::try_from(d.as_millis()).unwrap_or(TimeMs::MAX))
        .unwrap_or(0)
}
