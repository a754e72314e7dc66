//! SQLite schema definition.

/// Complete database schema for dental plans.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Service Price List
-- ============================================================================

CREATE TABLE IF NOT EXISTS services (
    id INTEGER PRIMARY KEY,                       -- backend service ID
    name TEXT NOT NULL,
    price INTEGER NOT NULL,
    category TEXT,
    active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_services_category ON services(category);

-- ============================================================================
-- Treatment Plans
-- ============================================================================

CREATE TABLE IF NOT EXISTS treatment_plans (
    plan_id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL,
    diagnosis TEXT NOT NULL DEFAULT '',
    notes TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_plans_patient_id ON treatment_plans(patient_id);

-- ============================================================================
-- Tooth Services (one row per service on a tooth)
-- ============================================================================

-- Service name/price are snapshotted so later price-list edits do not
-- rewrite existing plans.
CREATE TABLE IF NOT EXISTS tooth_services (
    plan_id TEXT NOT NULL REFERENCES treatment_plans(plan_id) ON DELETE CASCADE,
    tooth_id INTEGER NOT NULL,
    position INTEGER NOT NULL,                    -- insertion order on the tooth
    service_id INTEGER NOT NULL,
    service_name TEXT NOT NULL,
    service_price INTEGER NOT NULL,
    service_category TEXT,
    status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'completed')),
    PRIMARY KEY (plan_id, tooth_id, service_id)
);

CREATE INDEX IF NOT EXISTS idx_tooth_services_plan ON tooth_services(plan_id, tooth_id, position);
"#;
