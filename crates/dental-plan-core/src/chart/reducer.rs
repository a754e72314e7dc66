//! Pure state transitions for the tooth chart.

use serde::{Deserialize, Serialize};

use super::state::ChartState;
use super::{ChartError, ChartNotice, ChartResult};
use crate::models::{Service, ServiceId, ServiceStatus, ToothPosition, ToothServiceAssignment};

/// A user gesture against the chart. Tooth ids are raw FDI numbers and are
/// validated by [`reduce`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChartAction {
    ToggleSelect {
        tooth: i64,
    },
    /// Assign to the current selection.
    AssignToSelection {
        service: Service,
    },
    /// Assign to an explicit list of teeth.
    AssignService {
        service: Service,
        teeth: Vec<i64>,
    },
    RemoveService {
        tooth: i64,
        service_id: ServiceId,
    },
    UpdateServiceStatus {
        tooth: i64,
        service_id: ServiceId,
        status: ServiceStatus,
    },
    ClearSelection,
}

/// Notification emitted after a transition. Always carries the full structure,
/// never a delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChartEvent {
    AssignmentsChanged {
        assignments: Vec<ToothServiceAssignment>,
    },
    SelectionChanged {
        selection: Vec<ToothPosition>,
    },
}

/// Result of applying one action.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: ChartState,
    pub events: Vec<ChartEvent>,
    pub notice: Option<ChartNotice>,
}

impl Transition {
    fn unchanged(state: &ChartState, notice: Option<ChartNotice>) -> Self {
        Self {
            state: state.clone(),
            events: Vec::new(),
            notice,
        }
    }

    pub fn changed_assignments(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, ChartEvent::AssignmentsChanged { .. }))
    }
}

/// Apply an action to a state, producing the next state and its events.
///
/// Invalid input leaves the caller's state untouched: every tooth id is
/// validated before anything is changed.
pub fn reduce(state: &ChartState, action: ChartAction) -> ChartResult<Transition> {
    match action {
        ChartAction::ToggleSelect { tooth } => toggle_select(state, ToothPosition::new(tooth)?),
        ChartAction::AssignToSelection { service } => {
            let teeth = state.selection();
            assign_service(state, service, &teeth)
        }
        ChartAction::AssignService { service, teeth } => {
            let teeth = teeth
                .into_iter()
                .map(ToothPosition::new)
                .collect::<Result<Vec<_>, _>>()?;
            assign_service(state, service, &teeth)
        }
        ChartAction::RemoveService { tooth, service_id } => {
            remove_service(state, ToothPosition::new(tooth)?, service_id)
        }
        ChartAction::UpdateServiceStatus {
            tooth,
            service_id,
            status,
        } => update_service_status(state, ToothPosition::new(tooth)?, service_id, status),
        ChartAction::ClearSelection => Ok(clear_selection(state)),
    }
}

// A tooth with services can still be selected to receive more, so selection
// is flipped independently of the assignment in both cases.
fn toggle_select(state: &ChartState, tooth: ToothPosition) -> ChartResult<Transition> {
    let mut next = state.clone();
    let selection = next.selection_mut();
    if !selection.remove(&tooth) {
        selection.insert(tooth);
    }
    let events = vec![ChartEvent::SelectionChanged {
        selection: next.selection(),
    }];
    Ok(Transition {
        state: next,
        events,
        notice: None,
    })
}

fn assign_service(
    state: &ChartState,
    service: Service,
    teeth: &[ToothPosition],
) -> ChartResult<Transition> {
    if teeth.is_empty() {
        return Err(ChartError::NoTeethSelected);
    }

    let mut next = state.clone();
    let assignments = next.assignments_mut();
    for &tooth in teeth {
        assignments
            .entry(tooth)
            .or_insert_with(|| ToothServiceAssignment::new(tooth))
            .add_service(service.clone());
    }

    let mut events = vec![ChartEvent::AssignmentsChanged {
        assignments: next.assignments_vec(),
    }];
    if !next.selection_is_empty() {
        next.selection_mut().clear();
        events.push(ChartEvent::SelectionChanged {
            selection: Vec::new(),
        });
    }

    Ok(Transition {
        state: next,
        events,
        notice: None,
    })
}

fn remove_service(
    state: &ChartState,
    tooth: ToothPosition,
    service_id: ServiceId,
) -> ChartResult<Transition> {
    let present = state
        .assignment(tooth)
        .is_some_and(|a| a.contains(service_id));
    if !present {
        return Ok(Transition::unchanged(
            state,
            Some(ChartNotice::NotAssigned { tooth, service_id }),
        ));
    }

    let mut next = state.clone();
    let assignments = next.assignments_mut();
    let emptied = match assignments.get_mut(&tooth) {
        Some(assignment) => {
            assignment.remove_service(service_id);
            assignment.is_empty()
        }
        None => false,
    };
    if emptied {
        assignments.remove(&tooth);
    }

    let events = vec![ChartEvent::AssignmentsChanged {
        assignments: next.assignments_vec(),
    }];
    Ok(Transition {
        state: next,
        events,
        notice: None,
    })
}

fn update_service_status(
    state: &ChartState,
    tooth: ToothPosition,
    service_id: ServiceId,
    status: ServiceStatus,
) -> ChartResult<Transition> {
    let mut next = state.clone();
    let updated = next
        .assignments_mut()
        .get_mut(&tooth)
        .is_some_and(|a| a.set_status(service_id, status));
    if !updated {
        return Ok(Transition::unchanged(
            state,
            Some(ChartNotice::NotAssigned { tooth, service_id }),
        ));
    }

    let events = vec![ChartEvent::AssignmentsChanged {
        assignments: next.assignments_vec(),
    }];
    Ok(Transition {
        state: next,
        events,
        notice: None,
    })
}

fn clear_selection(state: &ChartState) -> Transition {
    if state.selection_is_empty() {
        return Transition::unchanged(state, None);
    }
    let mut next = state.clone();
    next.selection_mut().clear();
    Transition {
        state: next,
        events: vec![ChartEvent::SelectionChanged {
            selection: Vec::new(),
        }],
        notice: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{tooth_status, ToothStatus};
    use crate::models::InvalidToothId;

    fn tooth(id: i64) -> ToothPosition {
        ToothPosition::new(id).unwrap()
    }

    fn filling() -> Service {
        Service::new(3, "Filling", 8000)
    }

    fn apply(state: &ChartState, action: ChartAction) -> ChartState {
        reduce(state, action).unwrap().state
    }

    #[test]
    fn test_toggle_select_flips() {
        let state = ChartState::new();
        let once = apply(&state, ChartAction::ToggleSelect { tooth: 14 });
        assert!(once.is_selected(tooth(14)));

        let twice = apply(&once, ChartAction::ToggleSelect { tooth: 14 });
        assert_eq!(twice, state);
    }

    #[test]
    fn test_toggle_select_keeps_assignment() {
        let state = apply(
            &ChartState::new(),
            ChartAction::AssignService {
                service: filling(),
                teeth: vec![14],
            },
        );
        let selected = apply(&state, ChartAction::ToggleSelect { tooth: 14 });
        assert!(selected.is_selected(tooth(14)));
        assert!(selected.has_services(tooth(14)));
    }

    #[test]
    fn test_assign_to_selection_clears_selection() {
        let mut state = ChartState::new();
        for t in [14, 15] {
            state = apply(&state, ChartAction::ToggleSelect { tooth: t });
        }

        let transition =
            reduce(&state, ChartAction::AssignToSelection { service: filling() }).unwrap();
        let next = &transition.state;

        assert!(next.selection_is_empty());
        for t in [14, 15] {
            let ids: Vec<ServiceId> = next
                .assignment(tooth(t))
                .unwrap()
                .services
                .iter()
                .map(|s| s.id)
                .collect();
            assert_eq!(ids, vec![3]);
        }
        assert_eq!(
            transition.events,
            vec![
                ChartEvent::AssignmentsChanged {
                    assignments: next.assignments_vec()
                },
                ChartEvent::SelectionChanged { selection: vec![] },
            ]
        );
    }

    #[test]
    fn test_assign_empty_selection_rejected() {
        let result = reduce(
            &ChartState::new(),
            ChartAction::AssignToSelection { service: filling() },
        );
        assert!(matches!(result, Err(ChartError::NoTeethSelected)));

        let result = reduce(
            &ChartState::new(),
            ChartAction::AssignService {
                service: filling(),
                teeth: vec![],
            },
        );
        assert!(matches!(result, Err(ChartError::NoTeethSelected)));
    }

    #[test]
    fn test_assign_with_invalid_tooth_changes_nothing() {
        let result = reduce(
            &ChartState::new(),
            ChartAction::AssignService {
                service: filling(),
                teeth: vec![14, 59],
            },
        );
        assert!(matches!(result, Err(ChartError::InvalidToothId(_))));
    }

    #[test]
    fn test_assign_skips_teeth_that_have_service() {
        let state = apply(
            &ChartState::new(),
            ChartAction::AssignService {
                service: filling(),
                teeth: vec![14],
            },
        );
        let state = apply(
            &state,
            ChartAction::AssignService {
                service: filling(),
                teeth: vec![14, 15],
            },
        );
        assert_eq!(state.assignment(tooth(14)).unwrap().services.len(), 1);
        assert_eq!(state.assignment(tooth(15)).unwrap().services.len(), 1);
    }

    #[test]
    fn test_remove_last_service_prunes_tooth() {
        let state = apply(
            &ChartState::new(),
            ChartAction::AssignService {
                service: filling(),
                teeth: vec![14],
            },
        );
        let state = apply(
            &state,
            ChartAction::RemoveService {
                tooth: 14,
                service_id: 3,
            },
        );
        assert!(!state.has_services(tooth(14)));
        assert_eq!(tooth_status(&state, tooth(14)), ToothStatus::Normal);
    }

    #[test]
    fn test_remove_absent_is_noop_with_notice() {
        let state = ChartState::new();
        let transition = reduce(
            &state,
            ChartAction::RemoveService {
                tooth: 14,
                service_id: 3,
            },
        )
        .unwrap();
        assert_eq!(transition.state, state);
        assert!(transition.events.is_empty());
        assert_eq!(
            transition.notice,
            Some(ChartNotice::NotAssigned {
                tooth: tooth(14),
                service_id: 3
            })
        );
    }

    #[test]
    fn test_update_status_not_assigned() {
        let state = ChartState::new();
        let transition = reduce(
            &state,
            ChartAction::UpdateServiceStatus {
                tooth: 26,
                service_id: 3,
                status: ServiceStatus::Completed,
            },
        )
        .unwrap();
        assert_eq!(transition.state, state);
        assert!(!transition.changed_assignments());
        assert!(matches!(
            transition.notice,
            Some(ChartNotice::NotAssigned { .. })
        ));
    }

    #[test]
    fn test_invalid_tooth_rejected_everywhere() {
        let state = ChartState::new();
        let actions = vec![
            ChartAction::ToggleSelect { tooth: 9 },
            ChartAction::RemoveService {
                tooth: 49,
                service_id: 1,
            },
            ChartAction::UpdateServiceStatus {
                tooth: 50,
                service_id: 1,
                status: ServiceStatus::Pending,
            },
        ];
        for action in actions {
            assert!(matches!(
                reduce(&state, action),
                Err(ChartError::InvalidToothId(_))
            ));
        }
    }

    #[test]
    fn test_clear_selection_keeps_assignments() {
        let state = apply(
            &ChartState::new(),
            ChartAction::AssignService {
                service: filling(),
                teeth: vec![14],
            },
        );
        let state = apply(&state, ChartAction::ToggleSelect { tooth: 21 });
        let cleared = apply(&state, ChartAction::ClearSelection);
        assert!(cleared.selection_is_empty());
        assert!(cleared.has_services(tooth(14)));

        let noop = reduce(&cleared, ChartAction::ClearSelection).unwrap();
        assert!(noop.events.is_empty());
    }

    #[test]
    fn test_out_of_range_ids_rejected_not_wrapped() {
        for raw in [300, -1, 256 + 14] {
            let result = reduce(&ChartState::new(), ChartAction::ToggleSelect { tooth: raw });
            assert!(
                matches!(result, Err(ChartError::InvalidToothId(InvalidToothId(id))) if id == raw),
                "{} should be rejected",
                raw
            );
        }

        let result = reduce(
            &ChartState::new(),
            ChartAction::AssignService {
                service: filling(),
                teeth: vec![14, 300],
            },
        );
        assert!(matches!(
            result,
            Err(ChartError::InvalidToothId(InvalidToothId(300)))
        ));
    }

    #[test]
    fn test_action_json_accepts_any_integer_tooth() {
        let action: ChartAction =
            serde_json::from_str(r#"{"type":"toggle_select","tooth":300}"#).unwrap();
        assert_eq!(action, ChartAction::ToggleSelect { tooth: 300 });
        assert!(matches!(
            reduce(&ChartState::new(), action),
            Err(ChartError::InvalidToothId(InvalidToothId(300)))
        ));
    }

    #[test]
    fn test_action_json() {
        let action: ChartAction =
            serde_json::from_str(r#"{"type":"toggle_select","tooth":14}"#).unwrap();
        assert_eq!(action, ChartAction::ToggleSelect { tooth: 14 });
    }
}
