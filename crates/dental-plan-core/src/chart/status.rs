//! Derived per-tooth status and chart summaries.
//!
//! Nothing here is stored: every value is recomputed from a [`ChartState`].

use serde::{Deserialize, Serialize};

use super::state::ChartState;
use super::ChartResult;
use crate::models::{ServiceStatus, ToothPosition};

/// Display status of a tooth on the chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToothStatus {
    Normal,
    Selected,
    InTreatment,
    Treated,
}

/// Render color for a [`ToothStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToothColor {
    Gray,
    Blue,
    Red,
    Green,
}

impl ToothStatus {
    pub fn color(self) -> ToothColor {
        match self {
            ToothStatus::Normal => ToothColor::Gray,
            ToothStatus::Selected => ToothColor::Blue,
            ToothStatus::InTreatment => ToothColor::Red,
            ToothStatus::Treated => ToothColor::Green,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ToothStatus::Normal => "normal",
            ToothStatus::Selected => "selected",
            ToothStatus::InTreatment => "in_treatment",
            ToothStatus::Treated => "treated",
        }
    }
}

impl ToothColor {
    /// CSS hex value.
    pub fn hex(self) -> &'static str {
        match self {
            ToothColor::Gray => "#9e9e9e",
            ToothColor::Blue => "#2196f3",
            ToothColor::Red => "#f44336",
            ToothColor::Green => "#4caf50",
        }
    }
}

/// Status of a tooth. Assignment-derived status wins over selection.
pub fn tooth_status(state: &ChartState, tooth: ToothPosition) -> ToothStatus {
    match state.assignment(tooth) {
        Some(assignment) if assignment.all_completed() => ToothStatus::Treated,
        Some(_) => ToothStatus::InTreatment,
        None if state.is_selected(tooth) => ToothStatus::Selected,
        None => ToothStatus::Normal,
    }
}

/// Status of a tooth given its raw FDI number.
pub fn compute_tooth_color(state: &ChartState, tooth_id: i64) -> ChartResult<ToothStatus> {
    let tooth = ToothPosition::new(tooth_id)?;
    Ok(tooth_status(state, tooth))
}

/// Status of every position, in chart layout order.
pub fn status_map(state: &ChartState) -> Vec<(ToothPosition, ToothStatus)> {
    ToothPosition::all()
        .map(|tooth| (tooth, tooth_status(state, tooth)))
        .collect()
}

/// Progress figures for a chart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSummary {
    /// Teeth with at least one pending service
    pub teeth_in_treatment: usize,
    /// Teeth whose services are all completed
    pub teeth_treated: usize,
    pub pending_services: usize,
    pub completed_services: usize,
    /// Sum of all assigned service prices
    pub total_cost: i64,
    /// Sum of completed service prices
    pub completed_cost: i64,
}

impl ChartSummary {
    pub fn from_state(state: &ChartState) -> Self {
        let mut summary = ChartSummary::default();
        for assignment in state.assignments() {
            if assignment.all_completed() {
                summary.teeth_treated += 1;
            } else {
                summary.teeth_in_treatment += 1;
            }
            for (service, status) in assignment.services_with_status() {
                summary.total_cost += service.price;
                match status {
                    ServiceStatus::Completed => {
                        summary.completed_services += 1;
                        summary.completed_cost += service.price;
                    }
                    ServiceStatus::Pending => summary.pending_services += 1,
                }
            }
        }
        summary
    }

    /// Share of services completed, 0.0 when nothing is planned.
    pub fn completion_ratio(&self) -> f64 {
        let total = self.pending_services + self.completed_services;
        if total == 0 {
            return 0.0;
        }
        self.completed_services as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ChartError;
    use crate::models::{Service, ToothServiceAssignment};

    fn tooth(id: i64) -> ToothPosition {
        ToothPosition::new(id).unwrap()
    }

    fn state_with(tooth_id: i64, statuses: &[(i64, ServiceStatus)]) -> ChartState {
        let mut assignment = ToothServiceAssignment::new(tooth(tooth_id));
        for &(id, status) in statuses {
            assignment.add_service(Service::new(id, format!("Service {}", id), 1000 * id));
            assignment.set_status(id, status);
        }
        ChartState::from_assignments(vec![assignment])
    }

    #[test]
    fn test_normal_and_selected() {
        let mut state = ChartState::new();
        assert_eq!(tooth_status(&state, tooth(11)), ToothStatus::Normal);

        state.selection_mut().insert(tooth(11));
        assert_eq!(tooth_status(&state, tooth(11)), ToothStatus::Selected);
        assert_eq!(tooth_status(&state, tooth(11)).color(), ToothColor::Blue);
    }

    #[test]
    fn test_assignment_wins_over_selection() {
        let mut state = state_with(26, &[(2, ServiceStatus::Pending)]);
        state.selection_mut().insert(tooth(26));
        assert_eq!(tooth_status(&state, tooth(26)), ToothStatus::InTreatment);

        let mut state = state_with(26, &[(2, ServiceStatus::Completed)]);
        state.selection_mut().insert(tooth(26));
        assert_eq!(tooth_status(&state, tooth(26)), ToothStatus::Treated);
        assert_eq!(tooth_status(&state, tooth(26)).color().hex(), "#4caf50");
    }

    #[test]
    fn test_compute_tooth_color_rejects_invalid() {
        let state = ChartState::new();
        assert!(matches!(
            compute_tooth_color(&state, 19),
            Err(ChartError::InvalidToothId(_))
        ));
    }

    #[test]
    fn test_status_map_covers_chart() {
        let state = state_with(26, &[(2, ServiceStatus::Pending)]);
        let map = status_map(&state);
        assert_eq!(map.len(), 32);
        assert_eq!(map[0].0.id(), 18);
        let (_, status) = map.iter().find(|(t, _)| t.id() == 26).unwrap();
        assert_eq!(*status, ToothStatus::InTreatment);
        assert_eq!(
            map.iter().filter(|(_, s)| *s == ToothStatus::Normal).count(),
            31
        );
    }

    #[test]
    fn test_summary() {
        let state = state_with(
            26,
            &[(2, ServiceStatus::Completed), (3, ServiceStatus::Pending)],
        );
        let summary = ChartSummary::from_state(&state);
        assert_eq!(summary.teeth_in_treatment, 1);
        assert_eq!(summary.teeth_treated, 0);
        assert_eq!(summary.pending_services, 1);
        assert_eq!(summary.completed_services, 1);
        assert_eq!(summary.total_cost, 5000);
        assert_eq!(summary.completed_cost, 2000);
        assert!((summary.completion_ratio() - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_status_json() {
        assert_eq!(
            serde_json::to_string(&ToothStatus::InTreatment).unwrap(),
            "\"in_treatment\""
        );
    }
}
