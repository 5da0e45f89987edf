//! Medward Core Library
//!
//! Hospital ward management core: patient records, lab results, and the
//! bed/patient state-synchronization subsystem.
//!
//! # Architecture
//!
//! ```text
//!                     UI / shell (external)
//!                             │
//!               ┌─────────────▼─────────────┐
//!               │        MedwardCore        │   FFI surface
//!               └─────────────┬─────────────┘
//!          ┌──────────────────┼───────────────────┐
//!          ▼                  ▼                   ▼
//!   ward::Lifecycle      ward::LabSync      locator / snapshot
//!   admit / discharge    mirror reconcile    pure derivations
//!          └──────────────────┬───────────────────┘
//!                             ▼
//!                    db::Database (SQLite)
//!       beds │ patients │ lab_results │ discharge_history
//! ```
//!
//! # Core Principle
//!
//! **The bed snapshot is a mirror, never the authority.** Ward labels are
//! recomputed from bed ids on every read, and the per-patient lab store is
//! the single source of truth the snapshot reconciles against.
//!
//! # Modules
//!
//! - [`db`]: SQLite database layer
//! - [`models`]: Domain types (Bed, Patient, LabResult, etc.)
//! - [`locator`]: Pure bed-id → ward location derivation
//! - [`snapshot`]: Pure lab-section merge logic
//! - [`ward`]: Admission/discharge lifecycle and lab synchronization

pub mod db;
pub mod locator;
pub mod models;
pub mod snapshot;
pub mod ward;

// Re-export commonly used types
pub use db::Database;
pub use locator::{bed_label, locate, WardLocation};
pub use models::{
    Bed, BedStatus, CarePlan, DischargeRecord, LabKey, LabMetric, LabResult, LabSection, Patient,
    ResultKind,
};
pub use ward::{AdmissionIntake, LabSync, Lifecycle, SyncReport, WardError};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum MedwardError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Sync error: {0}")]
    SyncError(String),
}

impl From<db::DbError> for MedwardError {
    fn from(e: db::DbError) -> Self {
        MedwardError::DatabaseError(e.to_string())
    }
}

impl From<serde_json::Error> for MedwardError {
    fn from(e: serde_json::Error) -> Self {
        MedwardError::SerializationError(e.to_string())
    }
}

impl From<WardError> for MedwardError {
    fn from(e: WardError) -> Self {
        match e {
            WardError::Db(inner) => MedwardError::DatabaseError(inner.to_string()),
            WardError::BedNotFound(_) | WardError::PatientNotFound(_) => {
                MedwardError::NotFound(e.to_string())
            }
            WardError::BedOccupied(_)
            | WardError::BedNotOccupied(_)
            | WardError::PatientAlreadyAdmitted { .. } => MedwardError::InvalidInput(e.to_string()),
            WardError::SyncIncomplete { .. } => MedwardError::SyncError(e.to_string()),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for MedwardError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        MedwardError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<MedwardCore>, MedwardError> {
    let db = Database::open(&path)?;
    Ok(Arc::new(MedwardCore {
        db: Arc::new(Mutex::new(db)),
    }))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<MedwardCore>, MedwardError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(MedwardCore {
        db: Arc::new(Mutex::new(db)),
    }))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
#[derive(uniffi::Object)]
pub struct MedwardCore {
    db: Arc<Mutex<Database>>,
}

#[uniffi::export]
impl MedwardCore {
    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// Create a new patient.
    pub fn create_patient(&self, name: String, dob: String) -> Result<FfiPatient, MedwardError> {
        let db = self.db.lock()?;
        let patient = Patient::new(name, dob);
        db.insert_patient(&patient)?;
        Ok(patient.into())
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, id: String) -> Result<Option<FfiPatient>, MedwardError> {
        let db = self.db.lock()?;
        let patient = db.get_patient(&id)?;
        Ok(patient.map(|p| p.into()))
    }

    /// List all patients.
    pub fn list_patients(&self) -> Result<Vec<FfiPatient>, MedwardError> {
        let db = self.db.lock()?;
        let patients = db.list_patients()?;
        Ok(patients.into_iter().map(|p| p.into()).collect())
    }

    /// Update a patient's demographic fields (the bed link is managed by
    /// admission/discharge only).
    pub fn update_patient(&self, patient: FfiPatient) -> Result<bool, MedwardError> {
        let db = self.db.lock()?;
        Ok(db.update_patient(&patient.into())?)
    }

    /// Delete a patient. A bed they occupy is released without a discharge
    /// archive entry, and their dependent records are removed.
    pub fn delete_patient(&self, id: String) -> Result<bool, MedwardError> {
        let db = self.db.lock()?;
        Ok(db.delete_patient(&id)?)
    }

    // =========================================================================
    // Bed Operations
    // =========================================================================

    /// List all beds.
    pub fn list_beds(&self) -> Result<Vec<FfiBed>, MedwardError> {
        let db = self.db.lock()?;
        let beds = db.list_beds()?;
        Ok(beds.into_iter().map(|b| b.into()).collect())
    }

    /// List beds available for admission.
    pub fn list_available_beds(&self) -> Result<Vec<FfiBed>, MedwardError> {
        let db = self.db.lock()?;
        let beds = db.list_available_beds()?;
        Ok(beds.into_iter().map(|b| b.into()).collect())
    }

    /// Get a bed by ID.
    pub fn get_bed(&self, bed_id: i64) -> Result<Option<FfiBed>, MedwardError> {
        let db = self.db.lock()?;
        let bed = db.get_bed(bed_id)?;
        Ok(bed.map(|b| b.into()))
    }

    /// Overwrite a bed's clinical snapshot and propagate new lab metrics to
    /// the occupant's permanent record.
    pub fn update_bed(&self, bed: FfiBed) -> Result<FfiSyncReport, MedwardError> {
        let db = self.db.lock()?;
        let sync = LabSync::new(&db);
        let report = sync.write_snapshot(&bed.into())?;
        Ok(report.into())
    }

    // =========================================================================
    // Admission / Discharge
    // =========================================================================

    /// Admit a patient to an available bed.
    pub fn admit_patient(
        &self,
        patient_id: String,
        bed_id: i64,
        intake: FfiAdmissionIntake,
    ) -> Result<FfiBed, MedwardError> {
        let db = self.db.lock()?;
        let lifecycle = Lifecycle::new(&db);
        let bed = lifecycle.admit(&patient_id, bed_id, intake.into())?;
        Ok(bed.into())
    }

    /// Discharge a bed's occupant, archiving the snapshot.
    pub fn discharge_bed(&self, bed_id: i64) -> Result<FfiDischargeRecord, MedwardError> {
        let db = self.db.lock()?;
        let lifecycle = Lifecycle::new(&db);
        let record = lifecycle.discharge(bed_id)?;
        Ok(record.into())
    }

    /// List the discharge history, newest first.
    pub fn list_discharge_history(&self) -> Result<Vec<FfiDischargeRecord>, MedwardError> {
        let db = self.db.lock()?;
        let records = db.list_discharge_history()?;
        Ok(records.into_iter().map(|r| r.into()).collect())
    }

    // =========================================================================
    // Lab Results
    // =========================================================================

    /// Record a lab result; an admitted patient's bed snapshot picks it up
    /// in the same operation.
    pub fn add_lab_result(
        &self,
        patient_id: String,
        result: FfiLabResult,
    ) -> Result<FfiLabResult, MedwardError> {
        let db = self.db.lock()?;
        let sync = LabSync::new(&db);
        let result: LabResult = result.into();
        let _ = sync.record_result(&patient_id, &result)?;
        Ok(result.into())
    }

    /// Delete a lab result; the matching snapshot metric is removed from the
    /// owner's bed, if occupied.
    pub fn delete_lab_result(&self, result_id: String) -> Result<bool, MedwardError> {
        let db = self.db.lock()?;
        let sync = LabSync::new(&db);
        Ok(sync.delete_result(&result_id)?)
    }

    /// List a patient's lab results, newest first.
    pub fn list_lab_results(&self, patient_id: String) -> Result<Vec<FfiLabResult>, MedwardError> {
        let db = self.db.lock()?;
        let results = db.list_lab_results(&patient_id)?;
        Ok(results.into_iter().map(|r| r.into()).collect())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: String,
    pub name: String,
    pub dob: String,
    pub gender: Option<String>,
    pub blood_type: Option<String>,
    pub allergies: Vec<String>,
    pub chronic_conditions: Vec<String>,
    pub contact: Option<String>,
    pub bed_id: Option<i64>,
}

impl From<Patient> for FfiPatient {
    fn from(patient: Patient) -> Self {
        Self {
            id: patient.id,
            name: patient.name,
            dob: patient.dob,
            gender: patient.gender,
            blood_type: patient.blood_type,
            allergies: patient.allergies,
            chronic_conditions: patient.chronic_conditions,
            contact: patient.contact,
            bed_id: patient.bed_id,
        }
    }
}

impl From<FfiPatient> for Patient {
    fn from(patient: FfiPatient) -> Self {
        let mut inner = Patient::new(patient.name, patient.dob);
        if !patient.id.is_empty() {
            inner.id = patient.id;
        }
        inner.gender = patient.gender;
        inner.blood_type = patient.blood_type;
        inner.allergies = patient.allergies;
        inner.chronic_conditions = patient.chronic_conditions;
        inner.contact = patient.contact;
        inner.bed_id = patient.bed_id;
        inner
    }
}

/// FFI-safe bed. `pavilion` and `bed_label` are derived from the id on the
/// way out and ignored on the way in.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiBed {
    pub id: i64,
    pub status: String,
    pub pavilion: String,
    pub bed_label: String,
    pub patient_id: Option<String>,
    pub condition: Option<String>,
    pub admission_date: Option<String>,
    pub clinical_summary: Vec<String>,
    pub plan: Vec<String>,
    pub care_plan: Option<FfiCarePlan>,
    pub lab_sections: Vec<FfiLabSection>,
}

impl From<Bed> for FfiBed {
    fn from(bed: Bed) -> Self {
        let pavilion = bed.location().label();
        let bed_label = bed.label();
        Self {
            id: bed.id,
            status: match bed.status {
                BedStatus::Available => "available".to_string(),
                BedStatus::Occupied => "occupied".to_string(),
            },
            pavilion,
            bed_label,
            patient_id: bed.patient_id,
            condition: bed.condition,
            admission_date: bed.admission_date,
            clinical_summary: bed.clinical_summary,
            plan: bed.plan,
            care_plan: bed.care_plan.map(|cp| cp.into()),
            lab_sections: bed.lab_sections.into_iter().map(|s| s.into()).collect(),
        }
    }
}

impl From<FfiBed> for Bed {
    fn from(bed: FfiBed) -> Self {
        Bed {
            id: bed.id,
            status: if bed.status == "occupied" {
                BedStatus::Occupied
            } else {
                BedStatus::Available
            },
            patient_id: bed.patient_id,
            condition: bed.condition,
            admission_date: bed.admission_date,
            clinical_summary: bed.clinical_summary,
            plan: bed.plan,
            care_plan: bed.care_plan.map(|cp| cp.into()),
            lab_sections: bed.lab_sections.into_iter().map(|s| s.into()).collect(),
        }
    }
}

/// FFI-safe care plan.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCarePlan {
    pub hgt_1400: String,
    pub hgt_2200: String,
    pub hgt_0600: String,
    pub catheter_type: String,
    pub needle_size: String,
    pub nasogastric_tube: String,
    pub foley_tube: String,
    pub oxygen_mode: String,
    pub venoclysis: bool,
    pub microdropper: bool,
    pub triple_way_valve: bool,
}

impl From<CarePlan> for FfiCarePlan {
    fn from(cp: CarePlan) -> Self {
        Self {
            hgt_1400: cp.hgt_1400,
            hgt_2200: cp.hgt_2200,
            hgt_0600: cp.hgt_0600,
            catheter_type: cp.catheter_type,
            needle_size: cp.needle_size,
            nasogastric_tube: cp.nasogastric_tube,
            foley_tube: cp.foley_tube,
            oxygen_mode: cp.oxygen_mode,
            venoclysis: cp.venoclysis,
            microdropper: cp.microdropper,
            triple_way_valve: cp.triple_way_valve,
        }
    }
}

impl From<FfiCarePlan> for CarePlan {
    fn from(cp: FfiCarePlan) -> Self {
        Self {
            hgt_1400: cp.hgt_1400,
            hgt_2200: cp.hgt_2200,
            hgt_0600: cp.hgt_0600,
            catheter_type: cp.catheter_type,
            needle_size: cp.needle_size,
            nasogastric_tube: cp.nasogastric_tube,
            foley_tube: cp.foley_tube,
            oxygen_mode: cp.oxygen_mode,
            venoclysis: cp.venoclysis,
            microdropper: cp.microdropper,
            triple_way_valve: cp.triple_way_valve,
        }
    }
}

/// FFI-safe lab section.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiLabSection {
    pub title: String,
    pub date: String,
    pub metrics: Vec<FfiLabMetric>,
}

impl From<LabSection> for FfiLabSection {
    fn from(section: LabSection) -> Self {
        Self {
            title: section.title,
            date: section.date,
            metrics: section.metrics.into_iter().map(|m| m.into()).collect(),
        }
    }
}

impl From<FfiLabSection> for LabSection {
    fn from(section: FfiLabSection) -> Self {
        Self {
            title: section.title,
            date: section.date,
            metrics: section.metrics.into_iter().map(|m| m.into()).collect(),
        }
    }
}

/// FFI-safe lab metric.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiLabMetric {
    pub name: String,
    pub value: String,
    pub kind: String,
    pub category: Option<String>,
    pub is_abnormal: bool,
}

impl From<LabMetric> for FfiLabMetric {
    fn from(metric: LabMetric) -> Self {
        Self {
            name: metric.name,
            value: metric.value,
            kind: metric.kind.as_str().to_string(),
            category: metric.category,
            is_abnormal: metric.is_abnormal,
        }
    }
}

impl From<FfiLabMetric> for LabMetric {
    fn from(metric: FfiLabMetric) -> Self {
        Self {
            name: metric.name,
            value: metric.value,
            kind: parse_kind(&metric.kind),
            category: metric.category,
            is_abnormal: metric.is_abnormal,
        }
    }
}

/// FFI-safe lab result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiLabResult {
    pub id: String,
    pub date: String,
    pub test_name: String,
    pub category: Option<String>,
    pub kind: String,
    pub value: Option<f64>,
    pub text_value: Option<String>,
    pub unit: Option<String>,
    pub is_abnormal: bool,
    pub file_name: Option<String>,
    pub file_url: Option<String>,
}

impl From<LabResult> for FfiLabResult {
    fn from(result: LabResult) -> Self {
        Self {
            id: result.id,
            date: result.date,
            test_name: result.test_name,
            category: result.category,
            kind: result.kind.as_str().to_string(),
            value: result.value,
            text_value: result.text_value,
            unit: result.unit,
            is_abnormal: result.is_abnormal,
            file_name: result.file_name,
            file_url: result.file_url,
        }
    }
}

impl From<FfiLabResult> for LabResult {
    fn from(result: FfiLabResult) -> Self {
        let mut inner = LabResult::new(result.date, result.test_name, parse_kind(&result.kind));
        if !result.id.is_empty() {
            inner.id = result.id;
        }
        inner.category = result.category;
        inner.value = result.value;
        inner.text_value = result.text_value;
        inner.unit = result.unit;
        inner.is_abnormal = result.is_abnormal;
        inner.file_name = result.file_name;
        inner.file_url = result.file_url;
        inner
    }
}

/// FFI-safe admission intake.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAdmissionIntake {
    pub condition: String,
    pub clinical_summary: Vec<String>,
    pub plan: Vec<String>,
    pub care_plan: FfiCarePlan,
}

impl From<FfiAdmissionIntake> for AdmissionIntake {
    fn from(intake: FfiAdmissionIntake) -> Self {
        Self {
            condition: intake.condition,
            clinical_summary: intake.clinical_summary,
            plan: intake.plan,
            care_plan: intake.care_plan.into(),
        }
    }
}

/// FFI-safe discharge record.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDischargeRecord {
    pub id: String,
    pub original_bed_id: i64,
    pub patient_name: String,
    pub discharge_date: String,
    pub condition: Option<String>,
    pub clinical_summary: Vec<String>,
    pub plan: Vec<String>,
    pub lab_sections: Vec<FfiLabSection>,
}

impl From<DischargeRecord> for FfiDischargeRecord {
    fn from(record: DischargeRecord) -> Self {
        Self {
            id: record.id,
            original_bed_id: record.original_bed_id,
            patient_name: record.patient_name,
            discharge_date: record.discharge_date,
            condition: record.condition,
            clinical_summary: record.clinical_summary,
            plan: record.plan,
            lab_sections: record.lab_sections.into_iter().map(|s| s.into()).collect(),
        }
    }
}

/// FFI-safe sync report.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSyncReport {
    pub inserted: u32,
    pub skipped: u32,
}

impl From<SyncReport> for FfiSyncReport {
    fn from(report: SyncReport) -> Self {
        Self {
            inserted: report.inserted as u32,
            skipped: report.skipped as u32,
        }
    }
}

fn parse_kind(kind: &str) -> ResultKind {
    if kind.eq_ignore_ascii_case("qualitative") {
        ResultKind::Qualitative
    } else {
        ResultKind::Quantitative
    }
}
