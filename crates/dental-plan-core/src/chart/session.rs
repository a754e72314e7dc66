//! The single owner of a chart while a treatment plan is open.

use tracing::{debug, info, warn};

use super::reducer::{reduce, ChartAction, ChartEvent};
use super::state::ChartState;
use super::status::{compute_tooth_color, status_map, ChartSummary, ToothStatus};
use super::{ChartNotice, ChartResult};
use crate::models::{Service, ServiceId, ServiceStatus, ToothPosition, ToothServiceAssignment};

/// Destination for a reconciled chart on an explicit save.
pub trait PlanSink {
    type Error;

    /// Replace the stored tooth chart of a plan.
    fn save_tooth_services(
        &self,
        plan_id: &str,
        assignments: &[ToothServiceAssignment],
    ) -> Result<(), Self::Error>;
}

/// Callback receiving every event a dispatched action produces.
pub type ChartObserver = Box<dyn FnMut(&ChartEvent) + Send>;

/// Holds the current chart of one plan and applies actions to it.
///
/// Each dispatch reads the current state, computes the next one and notifies
/// the observer before returning, so gestures never interleave against a
/// stale base. Nothing is persisted until [`ChartSession::save`] is called.
pub struct ChartSession {
    plan_id: String,
    state: ChartState,
    dirty: bool,
    observer: Option<ChartObserver>,
}

impl ChartSession {
    /// Session over an empty chart.
    pub fn new(plan_id: impl Into<String>) -> Self {
        Self::open(plan_id, Vec::new())
    }

    /// Session over a persisted chart.
    pub fn open(plan_id: impl Into<String>, assignments: Vec<ToothServiceAssignment>) -> Self {
        let plan_id = plan_id.into();
        let state = ChartState::from_assignments(assignments);
        debug!(
            plan_id = %plan_id,
            teeth = state.assignments().count(),
            "opened chart session"
        );
        Self {
            plan_id,
            state,
            dirty: false,
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: impl FnMut(&ChartEvent) + Send + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn plan_id(&self) -> &str {
        &self.plan_id
    }

    pub fn state(&self) -> &ChartState {
        &self.state
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    /// Apply an action. Returns the notice of a no-op action, if any.
    pub fn dispatch(&mut self, action: ChartAction) -> ChartResult<Option<ChartNotice>> {
        debug!(plan_id = %self.plan_id, action = ?action, "dispatching chart action");

        let transition = match reduce(&self.state, action) {
            Ok(transition) => transition,
            Err(e) => {
                warn!(plan_id = %self.plan_id, error = %e, "chart action rejected");
                return Err(e);
            }
        };

        if let Some(notice) = &transition.notice {
            warn!(plan_id = %self.plan_id, notice = ?notice, "chart action had no effect");
        }
        if transition.changed_assignments() {
            self.dirty = true;
        }

        self.state = transition.state;
        if let Some(observer) = self.observer.as_mut() {
            for event in &transition.events {
                observer(event);
            }
        }

        Ok(transition.notice)
    }

    pub fn toggle_select(&mut self, tooth: i64) -> ChartResult<()> {
        self.dispatch(ChartAction::ToggleSelect { tooth }).map(|_| ())
    }

    pub fn assign_to_selection(&mut self, service: Service) -> ChartResult<()> {
        self.dispatch(ChartAction::AssignToSelection { service })
            .map(|_| ())
    }

    pub fn assign_service(&mut self, service: Service, teeth: &[i64]) -> ChartResult<()> {
        self.dispatch(ChartAction::AssignService {
            service,
            teeth: teeth.to_vec(),
        })
        .map(|_| ())
    }

    pub fn remove_service(
        &mut self,
        tooth: i64,
        service_id: ServiceId,
    ) -> ChartResult<Option<ChartNotice>> {
        self.dispatch(ChartAction::RemoveService { tooth, service_id })
    }

    pub fn update_service_status(
        &mut self,
        tooth: i64,
        service_id: ServiceId,
        status: ServiceStatus,
    ) -> ChartResult<Option<ChartNotice>> {
        self.dispatch(ChartAction::UpdateServiceStatus {
            tooth,
            service_id,
            status,
        })
    }

    pub fn clear_selection(&mut self) {
        // Clearing has no failure mode.
        let _ = self.dispatch(ChartAction::ClearSelection);
    }

    pub fn tooth_color(&self, tooth: i64) -> ChartResult<ToothStatus> {
        compute_tooth_color(&self.state, tooth)
    }

    pub fn status_map(&self) -> Vec<(ToothPosition, ToothStatus)> {
        status_map(&self.state)
    }

    pub fn summary(&self) -> ChartSummary {
        ChartSummary::from_state(&self.state)
    }

    /// Hand the reconciled chart to a sink. Clears the unsaved flag on success.
    pub fn save<S: PlanSink>(&mut self, sink: &S) -> Result<(), S::Error> {
        let assignments = self.state.assignments_vec();
        sink.save_tooth_services(&self.plan_id, &assignments)?;
        self.dirty = false;
        info!(
            plan_id = %self.plan_id,
            teeth = assignments.len(),
            "saved tooth chart"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingSink {
        saved: RefCell<Vec<(String, Vec<ToothServiceAssignment>)>>,
    }

    impl PlanSink for RecordingSink {
        type Error = String;

        fn save_tooth_services(
            &self,
            plan_id: &str,
            assignments: &[ToothServiceAssignment],
        ) -> Result<(), String> {
            self.saved
                .borrow_mut()
                .push((plan_id.to_string(), assignments.to_vec()));
            Ok(())
        }
    }

    struct FailingSink;

    impl PlanSink for FailingSink {
        type Error = String;

        fn save_tooth_services(&self, _: &str, _: &[ToothServiceAssignment]) -> Result<(), String> {
            Err("offline".into())
        }
    }

    #[test]
    fn test_observer_receives_full_assignments() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let mut session =
            ChartSession::new("plan-1").with_observer(move |e| sink.lock().unwrap().push(e.clone()));

        session.toggle_select(14).unwrap();
        session
            .assign_to_selection(Service::new(3, "Filling", 8000))
            .unwrap();

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 3);
        match &events[1] {
            ChartEvent::AssignmentsChanged { assignments } => {
                assert_eq!(assignments.len(), 1);
                assert_eq!(assignments[0].tooth_id.id(), 14);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_save_is_explicit() {
        let sink = RecordingSink::default();
        let mut session = ChartSession::new("plan-1");
        assert!(!session.has_unsaved_changes());

        session
            .assign_service(Service::new(3, "Filling", 8000), &[14, 15])
            .unwrap();
        assert!(session.has_unsaved_changes());
        assert!(sink.saved.borrow().is_empty());

        session.save(&sink).unwrap();
        assert!(!session.has_unsaved_changes());
        let saved = sink.saved.borrow();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].0, "plan-1");
        assert_eq!(saved[0].1.len(), 2);
    }

    #[test]
    fn test_failed_save_keeps_dirty() {
        let mut session = ChartSession::new("plan-1");
        session
            .assign_service(Service::new(3, "Filling", 8000), &[14])
            .unwrap();
        assert!(session.save(&FailingSink).is_err());
        assert!(session.has_unsaved_changes());
    }

    #[test]
    fn test_selection_alone_is_not_unsaved() {
        let mut session = ChartSession::new("plan-1");
        session.toggle_select(11).unwrap();
        session.clear_selection();
        assert!(!session.has_unsaved_changes());
    }

    #[test]
    fn test_rejected_action_keeps_state() {
        let mut session = ChartSession::new("plan-1");
        session.toggle_select(11).unwrap();
        let before = session.state().clone();
        assert!(session.toggle_select(60).is_err());
        assert_eq!(session.state(), &before);
    }
}
