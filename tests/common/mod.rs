#![allow(dead_code)]

use std::sync::Mutex;

use racelog::{
    author::AuthorRef,
    event::{
        CompetitorRegistration, CourseArea, CourseDesign, DeviceMapping, EventKind, EventRef, EventType,
        FinishPositions, FlagState, GateLineOpening, Pathfinder, ProtestStart, RaceLogEvent, Revocation,
        StartProcedure, StartTimeProposal, StatusChange, TrackingDenotation, WindFix,
    },
    listener::{ListenerError, ListenerResult, RaceLogEventVisitor},
    types::{EventId, PassId, TimeMs},
};

pub fn event(id: &str, author: &AuthorRef, created_at: TimeMs, pass_id: PassId) -> EventRef {
    event_at(id, author, created_at, created_at, pass_id)
}

pub fn event_at(id: &str, author: &AuthorRef, created_at: TimeMs, logical: TimeMs, pass_id: PassId) -> EventRef {
    RaceLogEvent::new(
        EventId::new(id),
        created_at,
        logical,
        pass_id,
        AuthorRef::clone(author),
        vec![],
        EventKind::PassChange,
    )
}

pub fn ids(events: &[EventRef]) -> Vec<String> {
    events.iter().map(|e| e.id().to_string()).collect()
}

type Hook = Box<dyn Fn(&RaceLogEvent) + Send + Sync>;

/// Listener that records every callback and optionally runs a hook or fails.
#[derive(Default)]
pub struct RecordingListener {
    seen: Mutex<Vec<(EventId, EventType)>>,
    hook: Option<Hook>,
    fail: bool,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hook(hook: impl Fn(&RaceLogEvent) + Send + Sync + 'static) -> Self {
        Self {
            hook: Some(Box::new(hook)),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn seen_ids(&self) -> Vec<String> {
        self.seen.lock().unwrap().iter().map(|(id, _)| id.to_string()).collect()
    }

    pub fn seen_types(&self) -> Vec<EventType> {
        self.seen.lock().unwrap().iter().map(|(_, t)| *t).collect()
    }

    fn record(&self, event: &RaceLogEvent, event_type: EventType) -> ListenerResult {
        self.seen.lock().unwrap().push((event.id().clone(), event_type));
        if let Some(hook) = &self.hook {
            hook(event);
        }
        if self.fail {
            return Err(ListenerError::Failed(format!("rejecting {}", event.id())));
        }
        Ok(())
    }
}

impl RaceLogEventVisitor for RecordingListener {
    fn visit_flag(&self, event: &RaceLogEvent, _: &FlagState) -> ListenerResult {
        self.record(event, EventType::Flag)
    }

    fn visit_race_status(&self, event: &RaceLogEvent, _: &StatusChange) -> ListenerResult {
        self.record(event, EventType::RaceStatus)
    }

    fn visit_start_time(&self, event: &RaceLogEvent, _: &StartTimeProposal) -> ListenerResult {
        self.record(event, EventType::StartTime)
    }

    fn visit_pass_change(&self, event: &RaceLogEvent) -> ListenerResult {
        self.record(event, EventType::PassChange)
    }

    fn visit_course_area_changed(&self, event: &RaceLogEvent, _: &CourseArea) -> ListenerResult {
        self.record(event, EventType::CourseAreaChanged)
    }

    fn visit_course_design_changed(&self, event: &RaceLogEvent, _: &CourseDesign) -> ListenerResult {
        self.record(event, EventType::CourseDesignChanged)
    }

    fn visit_finish_positioning_list_changed(&self, event: &RaceLogEvent, _: &FinishPositions) -> ListenerResult {
        self.record(event, EventType::FinishPositioningListChanged)
    }

    fn visit_finish_positioning_confirmed(&self, event: &RaceLogEvent, _: &FinishPositions) -> ListenerResult {
        self.record(event, EventType::FinishPositioningConfirmed)
    }

    fn visit_pathfinder(&self, event: &RaceLogEvent, _: &Pathfinder) -> ListenerResult {
        self.record(event, EventType::Pathfinder)
    }

    fn visit_gate_line_opening_time(&self, event: &RaceLogEvent, _: &GateLineOpening) -> ListenerResult {
        self.record(event, EventType::GateLineOpeningTime)
    }

    fn visit_start_procedure_changed(&self, event: &RaceLogEvent, _: &StartProcedure) -> ListenerResult {
        self.record(event, EventType::StartProcedureChanged)
    }

    fn visit_protest_start_time(&self, event: &RaceLogEvent, _: &ProtestStart) -> ListenerResult {
        self.record(event, EventType::ProtestStartTime)
    }

    fn visit_wind_fix(&self, event: &RaceLogEvent, _: &WindFix) -> ListenerResult {
        self.record(event, EventType::WindFix)
    }

    fn visit_device_competitor_mapping(&self, event: &RaceLogEvent, _: &DeviceMapping) -> ListenerResult {
        self.record(event, EventType::DeviceCompetitorMapping)
    }

    fn visit_device_mark_mapping(&self, event: &RaceLogEvent, _: &DeviceMapping) -> ListenerResult {
        self.record(event, EventType::DeviceMarkMapping)
    }

    fn visit_denote_for_tracking(&self, event: &RaceLogEvent, _: &TrackingDenotation) -> ListenerResult {
        self.record(event, EventType::DenoteForTracking)
    }

    fn visit_start_tracking(&self, event: &RaceLogEvent) -> ListenerResult {
        self.record(event, EventType::StartTracking)
    }

    fn visit_register_competitor(&self, event: &RaceLogEvent, _: &CompetitorRegistration) -> ListenerResult {
        self.record(event, EventType::RegisterCompetitor)
    }

    fn visit_revoke(&self, event: &RaceLogEvent, _: &Revocation) -> ListenerResult {
        self.record(event, EventType::Revoke)
    }
}
