//! SQLite schema definition.

/// Number of beds in the physical plant (8 pavilions of 48).
pub const BED_COUNT: usize = 384;

/// Complete database schema for medward.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Beds
-- ============================================================================

CREATE TABLE IF NOT EXISTS beds (
    id INTEGER PRIMARY KEY,
    status TEXT NOT NULL DEFAULT 'available' CHECK (status IN ('available', 'occupied')),
    patient_id TEXT REFERENCES patients(id),
    condition TEXT,
    admission_date TEXT,
    clinical_summary TEXT,                        -- JSON array of strings
    plan TEXT,                                    -- JSON array of strings
    care_plan TEXT,                               -- JSON object
    lab_sections TEXT,                            -- JSON array of sections
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- One bed per patient
CREATE UNIQUE INDEX IF NOT EXISTS idx_beds_patient
    ON beds(patient_id) WHERE patient_id IS NOT NULL;

-- Occupied beds always carry an occupant, available beds never do
CREATE TRIGGER IF NOT EXISTS beds_check_occupancy BEFORE UPDATE ON beds
BEGIN
    SELECT CASE
        WHEN new.status = 'occupied' AND new.patient_id IS NULL THEN
            RAISE(ABORT, 'Occupied beds must have an occupant')
        WHEN new.status = 'available' AND new.patient_id IS NOT NULL THEN
            RAISE(ABORT, 'Available beds cannot have an occupant')
    END;
END;

-- ============================================================================
-- Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    dob TEXT NOT NULL,
    gender TEXT,
    blood_type TEXT,
    allergies TEXT NOT NULL DEFAULT '[]',         -- JSON array of strings
    chronic_conditions TEXT NOT NULL DEFAULT '[]',-- JSON array of strings
    contact TEXT,
    bed_id INTEGER REFERENCES beds(id),
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_patients_name ON patients(name);
CREATE INDEX IF NOT EXISTS idx_patients_bed ON patients(bed_id);

-- ============================================================================
-- Lab Results (permanent per-patient record)
-- ============================================================================

CREATE TABLE IF NOT EXISTS lab_results (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES patients(id),
    date TEXT NOT NULL,
    test_name TEXT NOT NULL,
    category TEXT,
    kind TEXT NOT NULL DEFAULT 'quantitative' CHECK (kind IN ('quantitative', 'qualitative')),
    value REAL,
    text_value TEXT,
    unit TEXT,
    is_abnormal INTEGER NOT NULL DEFAULT 0,
    file_name TEXT,
    file_url TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_lab_results_patient ON lab_results(patient_id);
CREATE INDEX IF NOT EXISTS idx_lab_results_date ON lab_results(patient_id, date);

-- ============================================================================
-- Discharge History (Append-Only - Immutable after creation)
-- ============================================================================

CREATE TABLE IF NOT EXISTS discharge_history (
    id TEXT PRIMARY KEY,
    original_bed_id INTEGER NOT NULL,
    patient_name TEXT NOT NULL,
    discharge_date TEXT NOT NULL,
    condition TEXT,
    clinical_summary TEXT NOT NULL DEFAULT '[]',  -- JSON array of strings
    plan TEXT NOT NULL DEFAULT '[]',              -- JSON array of strings
    lab_sections TEXT NOT NULL DEFAULT '[]',      -- JSON array of sections
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_discharge_created ON discharge_history(created_at);

CREATE TRIGGER IF NOT EXISTS discharge_history_immutable_update BEFORE UPDATE ON discharge_history
BEGIN
    SELECT RAISE(ABORT, 'Discharge records are immutable');
END;

CREATE TRIGGER IF NOT EXISTS discharge_history_immutable_delete BEFORE DELETE ON discharge_history
BEGIN
    SELECT RAISE(ABORT, 'Discharge records are immutable');
END;

-- ============================================================================
-- Seed
-- ============================================================================

-- Seed the fixed physical plant: ids 1-384 (8 pavilions x 48 beds).
-- Runs last so the patients table referenced by beds.patient_id exists
-- before the foreign-key-checked insert.
WITH RECURSIVE seq(n) AS (
    SELECT 1 UNION ALL SELECT n + 1 FROM seq WHERE n < 384
)
INSERT OR IGNORE INTO beds (id) SELECT n FROM seq;
"#;
