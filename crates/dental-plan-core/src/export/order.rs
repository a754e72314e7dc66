//! Order (treatment invoice) export.
//!
//! Flattens a tooth chart into `(service, quantity, unit price)` lines for the
//! invoice generator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::{Database, DbError};
use crate::models::{ServiceId, ServiceStatus, ToothPosition, ToothServiceAssignment, TreatmentPlan};

/// Order export errors.
#[derive(Error, Debug)]
pub enum OrderError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Treatment plan not found: {0}")]
    PlanNotFound(String),
}

pub type OrderResult<T> = Result<T, OrderError>;

/// Which services of a chart go on the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderScope {
    /// Everything planned
    All,
    /// Only work already done
    CompletedOnly,
}

impl OrderScope {
    fn includes(self, status: ServiceStatus) -> bool {
        match self {
            OrderScope::All => true,
            OrderScope::CompletedOnly => status == ServiceStatus::Completed,
        }
    }
}

/// Order export for a single plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderExport {
    /// Export metadata
    pub metadata: OrderMetadata,
    /// One line per service
    pub lines: Vec<OrderLine>,
    /// Sum of line totals
    pub total: i64,
}

/// Order export metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderMetadata {
    pub plan_id: String,
    pub patient_id: String,
    pub scope: OrderScope,
    /// Currency code of all amounts
    pub currency: String,
    /// Export timestamp
    pub exported_at: String,
}

/// A single order line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderLine {
    pub service_id: ServiceId,
    pub name: String,
    pub category: Option<String>,
    /// Number of teeth the service is applied to
    pub quantity: u32,
    pub unit_price: i64,
    pub line_total: i64,
    /// Teeth carrying the service, in chart order
    pub teeth: Vec<ToothPosition>,
}

/// Flatten assignments into order lines, in order of first appearance.
///
/// The same service at two different snapshot prices yields two lines.
pub fn flatten_assignments(
    assignments: &[ToothServiceAssignment],
    scope: OrderScope,
) -> Vec<OrderLine> {
    let mut lines: Vec<OrderLine> = Vec::new();
    for assignment in assignments {
        for (service, status) in assignment.services_with_status() {
            if !scope.includes(status) {
                continue;
            }
            match lines
                .iter_mut()
                .find(|l| l.service_id == service.id && l.unit_price == service.price)
            {
                Some(line) => {
                    line.quantity += 1;
                    line.line_total += service.price;
                    line.teeth.push(assignment.tooth_id);
                }
                None => lines.push(OrderLine {
                    service_id: service.id,
                    name: service.name.clone(),
                    category: service.category.clone(),
                    quantity: 1,
                    unit_price: service.price,
                    line_total: service.price,
                    teeth: vec![assignment.tooth_id],
                }),
            }
        }
    }
    lines
}

impl OrderExport {
    /// Create an order export from a treatment plan.
    pub fn from_plan(plan: &TreatmentPlan, scope: OrderScope, currency: &str) -> Self {
        let lines = flatten_assignments(&plan.assignments, scope);
        let total = lines.iter().map(|l| l.line_total).sum();

        Self {
            metadata: OrderMetadata {
                plan_id: plan.plan_id.clone(),
                patient_id: plan.patient_id.clone(),
                scope,
                currency: currency.to_string(),
                exported_at: chrono::Utc::now().to_rfc3339(),
            },
            lines,
            total,
        }
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV format.
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();
        csv.push_str(CSV_HEADER);
        self.push_csv_lines(&mut csv);
        csv
    }

    fn push_csv_lines(&self, csv: &mut String) {
        for line in &self.lines {
            let teeth: Vec<String> = line.teeth.iter().map(|t| t.to_string()).collect();
            csv.push_str(&format!(
                "{},{},{},{},{},{},{},{},{}\n",
                escape_csv(&self.metadata.plan_id),
                escape_csv(&self.metadata.patient_id),
                line.service_id,
                escape_csv(&line.name),
                escape_csv(line.category.as_deref().unwrap_or("")),
                line.quantity,
                line.unit_price,
                line.line_total,
                escape_csv(&teeth.join(" ")),
            ));
        }
    }
}

const CSV_HEADER: &str =
    "plan_id,patient_id,service_id,name,category,quantity,unit_price,line_total,teeth\n";

/// Batch order export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOrderExport {
    /// Export timestamp
    pub exported_at: String,
    /// Individual plan exports
    pub orders: Vec<OrderExport>,
    /// Total line count
    pub total_lines: usize,
    /// Sum of all order totals
    pub grand_total: i64,
}

impl BatchOrderExport {
    pub fn from_orders(orders: Vec<OrderExport>) -> Self {
        Self {
            exported_at: chrono::Utc::now().to_rfc3339(),
            total_lines: orders.iter().map(|o| o.lines.len()).sum(),
            grand_total: orders.iter().map(|o| o.total).sum(),
            orders,
        }
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV format.
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();
        csv.push_str(CSV_HEADER);
        for order in &self.orders {
            order.push_csv_lines(&mut csv);
        }
        csv
    }
}

/// Order exporter over the plan store.
pub struct OrderExporter<'a> {
    db: &'a Database,
    currency: String,
}

impl<'a> OrderExporter<'a> {
    /// Create a new order exporter.
    pub fn new(db: &'a Database, currency: impl Into<String>) -> Self {
        Self {
            db,
            currency: currency.into(),
        }
    }

    /// Export the order of one plan.
    pub fn export_plan(&self, plan_id: &str, scope: OrderScope) -> OrderResult<OrderExport> {
        let plan = self
            .db
            .get_plan(plan_id)?
            .ok_or_else(|| OrderError::PlanNotFound(plan_id.to_string()))?;
        Ok(OrderExport::from_plan(&plan, scope, &self.currency))
    }

    /// Export orders for every plan of a patient.
    pub fn export_patient(&self, patient_id: &str, scope: OrderScope) -> OrderResult<BatchOrderExport> {
        let orders = self
            .db
            .list_plans_for_patient(patient_id)?
            .iter()
            .map(|plan| OrderExport::from_plan(plan, scope, &self.currency))
            .collect();
        Ok(BatchOrderExport::from_orders(orders))
    }
}

/// Escape a string for CSV output.
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
