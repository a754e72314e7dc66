//! Tooth-service assignments.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use super::service::{Service, ServiceId, ServiceStatus};
use super::tooth::ToothPosition;

/// Services planned on a single tooth together with their completion status.
///
/// `services` keeps insertion order and never holds two services with the same
/// id. Every key of `service_statuses` names a service in `services`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToothServiceAssignment {
    pub tooth_id: ToothPosition,
    pub services: Vec<Service>,
    #[serde(default)]
    pub service_statuses: BTreeMap<ServiceId, ServiceStatus>,
}

impl ToothServiceAssignment {
    /// Create an empty assignment for a tooth.
    pub fn new(tooth_id: ToothPosition) -> Self {
        Self {
            tooth_id,
            services: Vec::new(),
            service_statuses: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn contains(&self, service_id: ServiceId) -> bool {
        self.services.iter().any(|s| s.id == service_id)
    }

    /// Append a service as pending. Returns false if it was already present.
    pub fn add_service(&mut self, service: Service) -> bool {
        if self.contains(service.id) {
            return false;
        }
        self.service_statuses
            .insert(service.id, ServiceStatus::Pending);
        self.services.push(service);
        true
    }

    /// Remove a service and its status entry. Returns false if it was absent.
    pub fn remove_service(&mut self, service_id: ServiceId) -> bool {
        let before = self.services.len();
        self.services.retain(|s| s.id != service_id);
        self.service_statuses.remove(&service_id);
        self.services.len() != before
    }

    /// Set the status of a present service. Returns false if it is absent.
    pub fn set_status(&mut self, service_id: ServiceId, status: ServiceStatus) -> bool {
        if !self.contains(service_id) {
            return false;
        }
        self.service_statuses.insert(service_id, status);
        true
    }

    /// Status of a present service; services without an entry count as pending.
    pub fn status_of(&self, service_id: ServiceId) -> Option<ServiceStatus> {
        if !self.contains(service_id) {
            return None;
        }
        Some(
            self.service_statuses
                .get(&service_id)
                .copied()
                .unwrap_or_default(),
        )
    }

    /// Services paired with their effective status, in insertion order.
    pub fn services_with_status(&self) -> impl Iterator<Item = (&Service, ServiceStatus)> {
        self.services.iter().map(|s| {
            (
                s,
                self.service_statuses.get(&s.id).copied().unwrap_or_default(),
            )
        })
    }

    pub fn completed_count(&self) -> usize {
        self.services_with_status()
            .filter(|(_, status)| *status == ServiceStatus::Completed)
            .count()
    }

    pub fn pending_count(&self) -> usize {
        self.services.len() - self.completed_count()
    }

    /// True when there is at least one service and every service is completed.
    pub fn all_completed(&self) -> bool {
        !self.services.is_empty() && self.pending_count() == 0
    }

    /// Restore the invariants on data that came from outside the chart:
    /// drop duplicate services (first wins), drop orphan status entries and
    /// give every service an explicit status.
    pub fn normalize(&mut self) {
        let mut seen = HashSet::new();
        self.services.retain(|s| seen.insert(s.id));
        self.service_statuses.retain(|id, _| seen.contains(id));
        for service in &self.services {
            self.service_statuses.entry(service.id).or_default();
        }
    }
}
