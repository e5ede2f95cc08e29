use thiserror::Error;

use crate::event::{
    CompetitorRegistration, CourseArea, CourseDesign, DeviceMapping, FinishPositions, FlagState,
    GateLineOpening, Pathfinder, ProtestStart, RaceLogEvent, Revocation, StartProcedure,
    StartTimeProposal, StatusChange, TrackingDenotation, WindFix,
};

/// Failure reported by a listener callback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListenerError {
    #[error("listener failed: {0}")]
    Failed(String),
}

pub type ListenerResult = Result<(), ListenerError>;

/// One handler per event variant.
///
/// No method has a default body, so a new variant must be handled by every
/// listener. Callbacks run on the writer thread that added the event.
pub trait RaceLogEventVisitor: Send + Sync {
    fn visit_flag(&self, event: &RaceLogEvent, flag: &FlagState) -> ListenerResult;
    fn visit_race_status(&self, event: &RaceLogEvent, status: &StatusChange) -> ListenerResult;
    fn visit_start_time(&self, event: &RaceLogEvent, start: &StartTimeProposal) -> ListenerResult;
    fn visit_pass_change(&self, event: &RaceLogEvent) -> ListenerResult;
    fn visit_course_area_changed(&self, event: &RaceLogEvent, area: &CourseArea) -> ListenerResult;
    fn visit_course_design_changed(&self, event: &RaceLogEvent, course: &CourseDesign) -> ListenerResult;
    fn visit_finish_positioning_list_changed(
        &self,
        event: &RaceLogEvent,
        positions: &FinishPositions,
    ) -> ListenerResult;
    fn visit_finish_positioning_confirmed(
        &self,
        event: &RaceLogEvent,
        positions: &FinishPositions,
    ) -> ListenerResult;
    fn visit_pathfinder(&self, event: &RaceLogEvent, pathfinder: &Pathfinder) -> ListenerResult;
    fn visit_gate_line_opening_time(&self, event: &RaceLogEvent, gate: &GateLineOpening) -> ListenerResult;
    fn visit_start_procedure_changed(&self, event: &RaceLogEvent, procedure: &StartProcedure) -> ListenerResult;
    fn visit_protest_start_time(&self, event: &RaceLogEvent, protest: &ProtestStart) -> ListenerResult;
    fn visit_wind_fix(&self, event: &RaceLogEvent, wind: &WindFix) -> ListenerResult;
    fn visit_device_competitor_mapping(&self, event: &RaceLogEvent, mapping: &DeviceMapping) -> ListenerResult;
    fn visit_device_mark_mapping(&self, event: &RaceLogEvent, mapping: &DeviceMapping) -> ListenerResult;
    fn visit_denote_for_tracking(&self, event: &RaceLogEvent, denotation: &TrackingDenotation) -> ListenerResult;
    fn visit_start_tracking(&self, event: &RaceLogEvent) -> ListenerResult;
    fn visit_register_competitor(
        &self,
        event: &RaceLogEvent,
        registration: &CompetitorRegistration,
    ) -> ListenerResult;
    fn visit_revoke(&self, event: &RaceLogEvent, revocation: &Revocation) -> ListenerResult;
}
