//! Chart state: the assignment map plus the transient selection.

use std::collections::{BTreeMap, BTreeSet};

use crate::models::{ToothPosition, ToothServiceAssignment};

/// Snapshot of a tooth chart.
///
/// `assignments` never holds an empty assignment; a tooth without services has
/// no entry. `selection` is UI state and is never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartState {
    assignments: BTreeMap<ToothPosition, ToothServiceAssignment>,
    selection: BTreeSet<ToothPosition>,
}

impl ChartState {
    /// Empty chart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a chart from persisted assignments, restoring invariants.
    ///
    /// Entries for the same tooth are merged in order, duplicate services and
    /// orphan statuses are dropped, and empty assignments are pruned.
    pub fn from_assignments(assignments: impl IntoIterator<Item = ToothServiceAssignment>) -> Self {
        let mut merged: BTreeMap<ToothPosition, ToothServiceAssignment> = BTreeMap::new();
        for incoming in assignments {
            match merged.get_mut(&incoming.tooth_id) {
                Some(existing) => {
                    for (service, status) in incoming.services_with_status() {
                        if existing.add_service(service.clone()) {
                            existing.set_status(service.id, status);
                        }
                    }
                }
                None => {
                    merged.insert(incoming.tooth_id, incoming);
                }
            }
        }

        merged.retain(|_, assignment| {
            assignment.normalize();
            !assignment.is_empty()
        });

        Self {
            assignments: merged,
            selection: BTreeSet::new(),
        }
    }

    /// Assignment for a tooth, if it has any services.
    pub fn assignment(&self, tooth: ToothPosition) -> Option<&ToothServiceAssignment> {
        self.assignments.get(&tooth)
    }

    pub fn has_services(&self, tooth: ToothPosition) -> bool {
        self.assignments.contains_key(&tooth)
    }

    pub fn is_selected(&self, tooth: ToothPosition) -> bool {
        self.selection.contains(&tooth)
    }

    /// Assignments ordered by tooth number.
    pub fn assignments(&self) -> impl Iterator<Item = &ToothServiceAssignment> {
        self.assignments.values()
    }

    /// Owned copy of the assignments, as handed to listeners and sinks.
    pub fn assignments_vec(&self) -> Vec<ToothServiceAssignment> {
        self.assignments.values().cloned().collect()
    }

    /// Selected teeth in ascending order.
    pub fn selection(&self) -> Vec<ToothPosition> {
        self.selection.iter().copied().collect()
    }

    pub fn selection_is_empty(&self) -> bool {
        self.selection.is_empty()
    }

    pub(crate) fn assignments_mut(
        &mut self,
    ) -> &mut BTreeMap<ToothPosition, ToothServiceAssignment> {
        &mut self.assignments
    }

    pub(crate) fn selection_mut(&mut self) -> &mut BTreeSet<ToothPosition> {
        &mut self.selection
    }
}
