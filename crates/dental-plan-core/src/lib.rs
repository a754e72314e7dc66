//! Dental Plan Core Library
//!
//! Treatment-plan engine for a dental clinic: the tooth-by-tooth service
//! chart, its local store and the order export.
//!
//! # Architecture
//!
//! ```text
//!   Price list (services)          Stored plan (tooth chart)
//!            │                                 │
//!            └──────────────┬──────────────────┘
//!                           ▼
//!                     ChartSession ◄──── ChartAction (click, assign, ...)
//!                           │
//!                  reduce(state, action)
//!                           │
//!            ┌──────────────┼────────────────────┐
//!            ▼              ▼                    ▼
//!      ChartEvent     tooth statuses       explicit save
//!     (observer)     (normal/selected/          │
//!                    in_treatment/treated)      ▼
//!                                          PlanSink (SQLite)
//!                                               │
//!                                               ▼
//!                                          Order export
//! ```
//!
//! # Core Principle
//!
//! **The chart is one map plus one transient selection.** Colors and
//! summaries are always derived from it, never stored next to it.
//!
//! # Modules
//!
//! - [`models`]: Domain types (ToothPosition, Service, ToothServiceAssignment, TreatmentPlan)
//! - [`chart`]: Reducer, session and status derivation
//! - [`db`]: SQLite plan store
//! - [`export`]: Order export
//! - [`config`]: Runtime configuration
//! - [`logging`]: Tracing subscriber setup

pub mod chart;
pub mod config;
pub mod db;
pub mod export;
pub mod logging;
pub mod models;

// Re-export commonly used types
pub use chart::{
    reduce, ChartAction, ChartError, ChartEvent, ChartNotice, ChartSession, ChartState,
    ChartSummary, PlanSink, ToothColor, ToothStatus,
};
pub use config::CoreConfig;
pub use db::Database;
pub use export::{OrderExport, OrderExporter, OrderScope};
pub use models::{
    Service, ServiceId, ServiceStatus, ToothPosition, ToothServiceAssignment, TreatmentPlan,
};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum DentalPlanError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("No chart open: {0}")]
    NoChartOpen(String),
}

impl From<db::DbError> for DentalPlanError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::NotFound(what) => DentalPlanError::NotFound(what),
            other => DentalPlanError::DatabaseError(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for DentalPlanError {
    fn from(e: serde_json::Error) -> Self {
        DentalPlanError::SerializationError(e.to_string())
    }
}

impl From<chart::ChartError> for DentalPlanError {
    fn from(e: chart::ChartError) -> Self {
        DentalPlanError::InvalidInput(e.to_string())
    }
}

impl From<export::OrderError> for DentalPlanError {
    fn from(e: export::OrderError) -> Self {
        match e {
            export::OrderError::Database(db) => db.into(),
            export::OrderError::Json(json) => json.into(),
            export::OrderError::PlanNotFound(id) => {
                DentalPlanError::NotFound(format!("treatment plan {}", id))
            }
        }
    }
}

impl From<config::ConfigError> for DentalPlanError {
    fn from(e: config::ConfigError) -> Self {
        DentalPlanError::InvalidInput(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for DentalPlanError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        DentalPlanError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open the core with a database at the given path (created if needed).
#[uniffi::export]
pub fn open_core(path: String, currency: String) -> Result<Arc<DentalPlanCore>, DentalPlanError> {
    let config = CoreConfig::new(
        Some(path.into()),
        currency,
        config::DEFAULT_LOG_FILTER.to_string(),
    )?;
    DentalPlanCore::with_config(&config)
}

/// Open the core over an in-memory database (for testing).
#[uniffi::export]
pub fn open_core_in_memory() -> Result<Arc<DentalPlanCore>, DentalPlanError> {
    DentalPlanCore::with_config(&CoreConfig::in_memory())
}

/// Open the core from `DENTAL_PLAN_*` environment variables.
#[uniffi::export]
pub fn open_core_from_env() -> Result<Arc<DentalPlanCore>, DentalPlanError> {
    let config = CoreConfig::from_env()?;
    logging::init_logging(config.log_filter());
    DentalPlanCore::with_config(&config)
}

/// Install the default tracing subscriber. Returns false if one already exists.
#[uniffi::export]
pub fn enable_logging(filter: String) -> bool {
    logging::init_logging(&filter)
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe core for FFI: plan store plus the currently open chart.
///
/// Lock order is always session, then database.
#[derive(uniffi::Object)]
pub struct DentalPlanCore {
    db: Arc<Mutex<Database>>,
    session: Mutex<Option<ChartSession>>,
    currency: String,
}

impl DentalPlanCore {
    /// Open the core described by a configuration.
    pub fn with_config(config: &CoreConfig) -> Result<Arc<Self>, DentalPlanError> {
        let db = match config.database_path() {
            Some(path) => Database::open(path)?,
            None => Database::open_in_memory()?,
        };
        Ok(Arc::new(Self {
            db: Arc::new(Mutex::new(db)),
            session: Mutex::new(None),
            currency: config.currency().to_string(),
        }))
    }

    /// Run an action against the open chart and return the resulting snapshot.
    fn with_session<F>(&self, f: F) -> Result<FfiChartSnapshot, DentalPlanError>
    where
        F: FnOnce(&mut ChartSession) -> Result<Option<ChartNotice>, DentalPlanError>,
    {
        let mut guard = self.session.lock()?;
        let session = guard
            .as_mut()
            .ok_or_else(|| DentalPlanError::NoChartOpen("call open_chart first".into()))?;
        let notice = f(session)?;
        Ok(FfiChartSnapshot::from_session(session, notice))
    }

    fn lookup_service(&self, service_id: i64) -> Result<Service, DentalPlanError> {
        let db = self.db.lock()?;
        db.get_service(service_id)?
            .ok_or_else(|| DentalPlanError::NotFound(format!("service {}", service_id)))
    }
}

#[uniffi::export]
impl DentalPlanCore {
    // =========================================================================
    // Price List Operations
    // =========================================================================

    /// Add or update a service.
    pub fn upsert_service(&self, service: FfiService) -> Result<(), DentalPlanError> {
        let db = self.db.lock()?;
        db.upsert_service(&service.into())?;
        Ok(())
    }

    /// Replace the price list with a freshly fetched one.
    pub fn sync_services(&self, services: Vec<FfiService>) -> Result<(), DentalPlanError> {
        let mut db = self.db.lock()?;
        let services: Vec<Service> = services.into_iter().map(|s| s.into()).collect();
        db.sync_services(&services)?;
        Ok(())
    }

    /// Active services ordered by category and name.
    pub fn list_services(&self) -> Result<Vec<FfiService>, DentalPlanError> {
        let db = self.db.lock()?;
        Ok(db.list_services()?.into_iter().map(|s| s.into()).collect())
    }

    // =========================================================================
    // Treatment Plan Operations
    // =========================================================================

    /// Create an empty treatment plan.
    pub fn create_plan(
        &self,
        patient_id: String,
        diagnosis: String,
    ) -> Result<FfiTreatmentPlan, DentalPlanError> {
        let db = self.db.lock()?;
        let mut plan = TreatmentPlan::new(patient_id);
        plan.diagnosis = diagnosis;
        db.insert_plan(&plan)?;
        Ok(plan.into())
    }

    /// Get a plan by ID.
    pub fn get_plan(&self, plan_id: String) -> Result<Option<FfiTreatmentPlan>, DentalPlanError> {
        let db = self.db.lock()?;
        Ok(db.get_plan(&plan_id)?.map(|p| p.into()))
    }

    /// List plans of a patient, newest first.
    pub fn list_plans(&self, patient_id: String) -> Result<Vec<FfiTreatmentPlan>, DentalPlanError> {
        let db = self.db.lock()?;
        Ok(db
            .list_plans_for_patient(&patient_id)?
            .into_iter()
            .map(|p| p.into())
            .collect())
    }

    /// Update diagnosis and notes. The tooth chart is saved through `save_chart`.
    pub fn update_plan_details(
        &self,
        plan_id: String,
        diagnosis: String,
        notes: Option<String>,
    ) -> Result<(), DentalPlanError> {
        let db = self.db.lock()?;
        let mut plan = db
            .get_plan(&plan_id)?
            .ok_or_else(|| DentalPlanError::NotFound(format!("treatment plan {}", plan_id)))?;
        plan.diagnosis = diagnosis;
        plan.notes = notes;
        db.update_plan(&plan)?;
        Ok(())
    }

    // =========================================================================
    // Chart Operations
    // =========================================================================

    /// Open the chart of a plan, replacing any chart already open.
    pub fn open_chart(&self, plan_id: String) -> Result<FfiChartSnapshot, DentalPlanError> {
        let mut guard = self.session.lock()?;
        let assignments = {
            let db = self.db.lock()?;
            db.get_plan(&plan_id)?
                .ok_or_else(|| DentalPlanError::NotFound(format!("treatment plan {}", plan_id)))?
                .assignments
        };
        if let Some(previous) = guard.as_ref() {
            if previous.has_unsaved_changes() {
                tracing::warn!(
                    plan_id = previous.plan_id(),
                    "discarding unsaved chart changes"
                );
            }
        }
        let session = guard.insert(ChartSession::open(plan_id, assignments));
        Ok(FfiChartSnapshot::from_session(session, None))
    }

    /// Current chart snapshot.
    pub fn chart_snapshot(&self) -> Result<FfiChartSnapshot, DentalPlanError> {
        self.with_session(|_| Ok(None))
    }

    /// Toggle a tooth in the selection.
    pub fn toggle_select(&self, tooth: i64) -> Result<FfiChartSnapshot, DentalPlanError> {
        self.with_session(|s| Ok(s.toggle_select(tooth).map(|_| None)?))
    }

    /// Assign a price-list service to every selected tooth.
    pub fn assign_service_to_selection(
        &self,
        service_id: i64,
    ) -> Result<FfiChartSnapshot, DentalPlanError> {
        let service = self.lookup_service(service_id)?;
        self.with_session(|s| Ok(s.assign_to_selection(service).map(|_| None)?))
    }

    /// Assign a price-list service to the given teeth.
    pub fn assign_service(
        &self,
        service_id: i64,
        teeth: Vec<i64>,
    ) -> Result<FfiChartSnapshot, DentalPlanError> {
        let service = self.lookup_service(service_id)?;
        self.with_session(|s| Ok(s.assign_service(service, &teeth).map(|_| None)?))
    }

    /// Remove a service from a tooth.
    pub fn remove_service(
        &self,
        tooth: i64,
        service_id: i64,
    ) -> Result<FfiChartSnapshot, DentalPlanError> {
        self.with_session(|s| Ok(s.remove_service(tooth, service_id)?))
    }

    /// Mark a service on a tooth as pending or completed.
    pub fn update_service_status(
        &self,
        tooth: i64,
        service_id: i64,
        status: FfiServiceStatus,
    ) -> Result<FfiChartSnapshot, DentalPlanError> {
        self.with_session(|s| Ok(s.update_service_status(tooth, service_id, status.into())?))
    }

    /// Empty the selection.
    pub fn clear_selection(&self) -> Result<FfiChartSnapshot, DentalPlanError> {
        self.with_session(|s| {
            s.clear_selection();
            Ok(None)
        })
    }

    /// Persist the open chart.
    pub fn save_chart(&self) -> Result<FfiChartSnapshot, DentalPlanError> {
        let db = Arc::clone(&self.db);
        self.with_session(|s| {
            let db = db.lock()?;
            s.save(&*db)?;
            Ok(None)
        })
    }

    // =========================================================================
    // Export Operations
    // =========================================================================

    /// Export the order of a plan as JSON.
    pub fn export_order_json(
        &self,
        plan_id: String,
        completed_only: bool,
    ) -> Result<String, DentalPlanError> {
        let db = self.db.lock()?;
        let exporter = OrderExporter::new(&db, self.currency.clone());
        let order = exporter.export_plan(&plan_id, order_scope(completed_only))?;
        Ok(order.to_json()?)
    }

    /// Export the order of a plan as CSV.
    pub fn export_order_csv(
        &self,
        plan_id: String,
        completed_only: bool,
    ) -> Result<String, DentalPlanError> {
        let db = self.db.lock()?;
        let exporter = OrderExporter::new(&db, self.currency.clone());
        let order = exporter.export_plan(&plan_id, order_scope(completed_only))?;
        Ok(order.to_csv())
    }
}

fn order_scope(completed_only: bool) -> OrderScope {
    if completed_only {
        OrderScope::CompletedOnly
    } else {
        OrderScope::All
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe service.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct FfiService {
    pub id: i64,
    pub name: String,
    pub price: i64,
    pub category: Option<String>,
}

impl From<Service> for FfiService {
    fn from(service: Service) -> Self {
        Self {
            id: service.id,
            name: service.name,
            price: service.price,
            category: service.category,
        }
    }
}

impl From<FfiService> for Service {
    fn from(service: FfiService) -> Self {
        Service {
            id: service.id,
            name: service.name,
            price: service.price,
            category: service.category,
        }
    }
}

/// FFI-safe service status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiServiceStatus {
    Pending,
    Completed,
}

impl From<ServiceStatus> for FfiServiceStatus {
    fn from(status: ServiceStatus) -> Self {
        match status {
            ServiceStatus::Pending => FfiServiceStatus::Pending,
            ServiceStatus::Completed => FfiServiceStatus::Completed,
        }
    }
}

impl From<FfiServiceStatus> for ServiceStatus {
    fn from(status: FfiServiceStatus) -> Self {
        match status {
            FfiServiceStatus::Pending => ServiceStatus::Pending,
            FfiServiceStatus::Completed => ServiceStatus::Completed,
        }
    }
}

/// FFI-safe service on a tooth.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct FfiToothService {
    pub service: FfiService,
    pub status: FfiServiceStatus,
}

/// FFI-safe tooth assignment.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct FfiToothAssignment {
    pub tooth_id: u8,
    pub services: Vec<FfiToothService>,
}

impl From<&ToothServiceAssignment> for FfiToothAssignment {
    fn from(assignment: &ToothServiceAssignment) -> Self {
        Self {
            tooth_id: assignment.tooth_id.id(),
            services: assignment
                .services_with_status()
                .map(|(service, status)| FfiToothService {
                    service: service.clone().into(),
                    status: status.into(),
                })
                .collect(),
        }
    }
}

/// FFI-safe derived tooth state for rendering.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct FfiToothState {
    pub tooth_id: u8,
    pub status: String,
    pub color: String,
}

/// FFI-safe chart snapshot returned after every chart operation.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct FfiChartSnapshot {
    pub plan_id: String,
    pub assignments: Vec<FfiToothAssignment>,
    pub selection: Vec<u8>,
    /// All 32 teeth in chart layout order
    pub teeth: Vec<FfiToothState>,
    pub has_unsaved_changes: bool,
    /// Set when the last action was a no-op worth reporting
    pub notice: Option<String>,
}

impl FfiChartSnapshot {
    fn from_session(session: &ChartSession, notice: Option<ChartNotice>) -> Self {
        let state = session.state();
        Self {
            plan_id: session.plan_id().to_string(),
            assignments: state.assignments().map(FfiToothAssignment::from).collect(),
            selection: state.selection().into_iter().map(|t| t.id()).collect(),
            teeth: session
                .status_map()
                .into_iter()
                .map(|(tooth, status)| FfiToothState {
                    tooth_id: tooth.id(),
                    status: status.as_str().to_string(),
                    color: status.color().hex().to_string(),
                })
                .collect(),
            has_unsaved_changes: session.has_unsaved_changes(),
            notice: notice.map(|n| match n {
                ChartNotice::NotAssigned { tooth, service_id } => {
                    format!("service {} is not assigned to tooth {}", service_id, tooth)
                }
            }),
        }
    }
}

/// FFI-safe treatment plan.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct FfiTreatmentPlan {
    pub plan_id: String,
    pub patient_id: String,
    pub diagnosis: String,
    pub notes: Option<String>,
    pub assignments: Vec<FfiToothAssignment>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<TreatmentPlan> for FfiTreatmentPlan {
    fn from(plan: TreatmentPlan) -> Self {
        Self {
            assignments: plan.assignments.iter().map(FfiToothAssignment::from).collect(),
            plan_id: plan.plan_id,
            patient_id: plan.patient_id,
            diagnosis: plan.diagnosis,
            notes: plan.notes,
            created_at: plan.created_at,
            updated_at: plan.updated_at,
        }
    }
}
