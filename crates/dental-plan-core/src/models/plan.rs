//! Treatment plan records.

use serde::{Deserialize, Serialize};

use super::assignment::ToothServiceAssignment;

/// A persisted treatment plan: patient link, diagnosis and the tooth chart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TreatmentPlan {
    /// Local UUID
    pub plan_id: String,
    /// Patient identifier in the clinic system
    pub patient_id: String,
    /// Free-text diagnosis
    pub diagnosis: String,
    /// Additional notes from the doctor
    pub notes: Option<String>,
    /// Tooth chart, one entry per tooth with services
    pub assignments: Vec<ToothServiceAssignment>,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl TreatmentPlan {
    /// Create an empty plan for a patient.
    pub fn new(patient_id: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            plan_id: uuid::Uuid::new_v4().to_string(),
            patient_id,
            diagnosis: String::new(),
            notes: None,
            assignments: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Total planned cost across all teeth.
    pub fn total_cost(&self) -> i64 {
        self.assignments
            .iter()
            .flat_map(|a| a.services.iter())
            .map(|s| s.price)
            .sum()
    }
}
