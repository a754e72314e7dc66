//! Treatment plan database operations.

use rusqlite::{params, OptionalExtension, Transaction};

use super::{Database, DbError, DbResult};
use crate::chart::{ChartState, PlanSink};
use crate::models::{Service, ServiceStatus, ToothPosition, ToothServiceAssignment, TreatmentPlan};

impl Database {
    /// Insert a new plan together with its tooth chart.
    pub fn insert_plan(&self, plan: &TreatmentPlan) -> DbResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            r#"
            INSERT INTO treatment_plans (
                plan_id, patient_id, diagnosis, notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                plan.plan_id,
                plan.patient_id,
                plan.diagnosis,
                plan.notes,
                plan.created_at,
                plan.updated_at,
            ],
        )?;
        replace_tooth_services(&tx, &plan.plan_id, &plan.assignments)?;
        tx.commit()?;
        Ok(())
    }

    /// Update diagnosis, notes and tooth chart of an existing plan.
    pub fn update_plan(&self, plan: &TreatmentPlan) -> DbResult<bool> {
        let tx = self.conn.unchecked_transaction()?;
        let rows_affected = tx.execute(
            r#"
            UPDATE treatment_plans SET
                diagnosis = ?2,
                notes = ?3,
                updated_at = ?4
            WHERE plan_id = ?1
            "#,
            params![
                plan.plan_id,
                plan.diagnosis,
                plan.notes,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        if rows_affected == 0 {
            return Ok(false);
        }
        replace_tooth_services(&tx, &plan.plan_id, &plan.assignments)?;
        tx.commit()?;
        Ok(true)
    }

    /// Get a plan with its tooth chart.
    pub fn get_plan(&self, plan_id: &str) -> DbResult<Option<TreatmentPlan>> {
        let row = self
            .conn
            .query_row(
                r#"
                SELECT plan_id, patient_id, diagnosis, notes, created_at, updated_at
                FROM treatment_plans
                WHERE plan_id = ?
                "#,
                [plan_id],
                row_to_plan,
            )
            .optional()?;

        match row {
            Some(mut plan) => {
                plan.assignments = self.load_tooth_services(&plan.plan_id)?;
                Ok(Some(plan))
            }
            None => Ok(None),
        }
    }

    /// List all plans for a patient, newest first.
    pub fn list_plans_for_patient(&self, patient_id: &str) -> DbResult<Vec<TreatmentPlan>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT plan_id, patient_id, diagnosis, notes, created_at, updated_at
            FROM treatment_plans
            WHERE patient_id = ?
            ORDER BY created_at DESC
            "#,
        )?;

        let rows = stmt.query_map([patient_id], row_to_plan)?;
        let mut plans = Vec::new();
        for row in rows {
            let mut plan = row?;
            plan.assignments = self.load_tooth_services(&plan.plan_id)?;
            plans.push(plan);
        }
        Ok(plans)
    }

    /// Delete a plan and its tooth chart.
    pub fn delete_plan(&self, plan_id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM treatment_plans WHERE plan_id = ?", [plan_id])?;
        Ok(rows_affected > 0)
    }

    /// Replace the tooth chart of an existing plan.
    pub fn save_tooth_services(
        &self,
        plan_id: &str,
        assignments: &[ToothServiceAssignment],
    ) -> DbResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        let rows_affected = tx.execute(
            "UPDATE treatment_plans SET updated_at = ?2 WHERE plan_id = ?1",
            params![plan_id, chrono::Utc::now().to_rfc3339()],
        )?;
        if rows_affected == 0 {
            return Err(DbError::NotFound(format!("treatment plan {}", plan_id)));
        }
        replace_tooth_services(&tx, plan_id, assignments)?;
        tx.commit()?;
        tracing::debug!(plan_id, teeth = assignments.len(), "stored tooth services");
        Ok(())
    }

    /// Load the tooth chart of a plan, ordered by tooth and insertion order.
    pub fn load_tooth_services(&self, plan_id: &str) -> DbResult<Vec<ToothServiceAssignment>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT tooth_id, service_id, service_name, service_price,
                   service_category, status
            FROM tooth_services
            WHERE plan_id = ?
            ORDER BY tooth_id, position
            "#,
        )?;

        let rows = stmt.query_map([plan_id], |row| {
            Ok(ToothServiceRow {
                tooth_id: row.get(0)?,
                service: Service {
                    id: row.get(1)?,
                    name: row.get(2)?,
                    price: row.get(3)?,
                    category: row.get(4)?,
                },
                status: row.get(5)?,
            })
        })?;

        let mut assignments: Vec<ToothServiceAssignment> = Vec::new();
        for row in rows {
            let row = row?;
            let tooth = ToothPosition::new(row.tooth_id).map_err(|_| {
                DbError::Constraint(format!("Invalid stored tooth id: {}", row.tooth_id))
            })?;
            let status = ServiceStatus::parse(&row.status).ok_or_else(|| {
                DbError::Constraint(format!("Unknown service status: {}", row.status))
            })?;

            if assignments.last().map(|a| a.tooth_id) != Some(tooth) {
                assignments.push(ToothServiceAssignment::new(tooth));
            }
            if let Some(assignment) = assignments.last_mut() {
                let service_id = row.service.id;
                assignment.add_service(row.service);
                assignment.set_status(service_id, status);
            }
        }
        Ok(assignments)
    }
}

impl PlanSink for Database {
    type Error = DbError;

    fn save_tooth_services(
        &self,
        plan_id: &str,
        assignments: &[ToothServiceAssignment],
    ) -> DbResult<()> {
        Database::save_tooth_services(self, plan_id, assignments)
    }
}

/// Intermediate row struct for database mapping.
struct ToothServiceRow {
    tooth_id: i64,
    service: Service,
    status: String,
}

fn row_to_plan(row: &rusqlite::Row<'_>) -> rusqlite::Result<TreatmentPlan> {
    Ok(TreatmentPlan {
        plan_id: row.get(0)?,
        patient_id: row.get(1)?,
        diagnosis: row.get(2)?,
        notes: row.get(3)?,
        assignments: Vec::new(),
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn replace_tooth_services(
    tx: &Transaction<'_>,
    plan_id: &str,
    assignments: &[ToothServiceAssignment],
) -> DbResult<()> {
    tx.execute("DELETE FROM tooth_services WHERE plan_id = ?", [plan_id])?;

    // One row set per tooth: repeated entries are merged before insert.
    let chart = ChartState::from_assignments(assignments.iter().cloned());

    let mut stmt = tx.prepare(
        r#"
        INSERT INTO tooth_services (
            plan_id, tooth_id, position, service_id, service_name,
            service_price, service_category, status
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )?;
    for assignment in chart.assignments() {
        for (position, (service, status)) in assignment.services_with_status().enumerate() {
            stmt.execute(params![
                plan_id,
                assignment.tooth_id.id(),
                position as i64,
                service.id,
                service.name,
                service.price,
                service.category,
                status.as_str(),
            ])?;
        }
    }
    Ok(())
}
