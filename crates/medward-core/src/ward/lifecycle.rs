//! Admission/discharge lifecycle.
//!
//! Per bed the state machine is cyclic: available → occupied → available.
//! Only discharge-archive entries are terminal. Every transition writes both
//! sides of the patient↔bed link in one transaction; no other code path
//! touches either side.

use crate::db::{self, Database, DbError};
use crate::models::{Bed, BedStatus, CarePlan, DischargeRecord};
use crate::snapshot;

use super::{WardError, WardResult};

/// Caller-supplied clinical intake for an admission. The text fields are
/// opaque here; composing them is the caller's concern.
#[derive(Debug, Clone, Default)]
pub struct AdmissionIntake {
    /// Admitting condition
    pub condition: String,
    /// Clinical summary lines
    pub clinical_summary: Vec<String>,
    /// Plan lines
    pub plan: Vec<String>,
    /// Initial care-plan configuration
    pub care_plan: CarePlan,
}

/// Lifecycle manager.
pub struct Lifecycle<'a> {
    db: &'a Database,
}

impl<'a> Lifecycle<'a> {
    /// Create a new lifecycle manager.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Admit a patient to an available bed.
    ///
    /// The snapshot is populated from the intake plus an admission lab merge
    /// over the patient's history. The occupy write is status-guarded, so a
    /// concurrent admission that claimed the bed first is rejected even
    /// after the precondition check passed.
    pub fn admit(
        &self,
        patient_id: &str,
        bed_id: i64,
        intake: AdmissionIntake,
    ) -> WardResult<Bed> {
        // 1. Validate preconditions before any write
        let mut bed = self
            .db
            .get_bed(bed_id)?
            .ok_or(WardError::BedNotFound(bed_id))?;
        if !bed.is_available() {
            return Err(WardError::BedOccupied(bed_id));
        }

        let patient = self
            .db
            .get_patient(patient_id)?
            .ok_or_else(|| WardError::PatientNotFound(patient_id.to_string()))?;
        if let Some(current) = patient.bed_id {
            return Err(WardError::PatientAlreadyAdmitted {
                patient: patient.id,
                bed: current,
            });
        }

        // 2. Build the snapshot
        let history = self.db.list_lab_results(patient_id)?;
        bed.status = BedStatus::Occupied;
        bed.patient_id = Some(patient.id.clone());
        bed.condition = Some(intake.condition);
        bed.admission_date = Some(today());
        bed.clinical_summary = intake.clinical_summary;
        bed.plan = intake.plan;
        bed.care_plan = Some(intake.care_plan);
        bed.lab_sections = snapshot::admission_sections(&history);

        // 3. Claim the bed and link the patient atomically
        let tx = self.db.transaction()?;
        if !db::beds::occupy(&tx, &bed)? {
            return Err(WardError::BedOccupied(bed_id));
        }
        db::patients::set_bed_ref(&tx, &patient.id, Some(bed_id))?;
        tx.commit().map_err(DbError::from)?;

        Ok(bed)
    }

    /// Discharge a bed's occupant, archiving the snapshot.
    ///
    /// The archive row is written before the bed is cleared, inside one
    /// transaction: an archive failure rolls everything back and leaves the
    /// bed occupied, so the discharge can simply be retried.
    pub fn discharge(&self, bed_id: i64) -> WardResult<DischargeRecord> {
        let bed = self
            .db
            .get_bed(bed_id)?
            .ok_or(WardError::BedNotFound(bed_id))?;
        let patient_id = bed
            .patient_id
            .clone()
            .ok_or(WardError::BedNotOccupied(bed_id))?;

        // The name is captured as a plain string; the archive must survive
        // later patient deletion.
        let patient_name = self
            .db
            .get_patient(&patient_id)?
            .map(|p| p.name)
            .unwrap_or_else(|| "Unknown".to_string());

        let record = DischargeRecord::from_bed(&bed, patient_name, today());

        let tx = self.db.transaction()?;
        db::discharge::insert(&tx, &record)?;
        db::beds::clear(&tx, bed_id)?;
        db::patients::set_bed_ref(&tx, &patient_id, None)?;
        tx.commit().map_err(DbError::from)?;

        Ok(record)
    }
}

fn today() -> String {
    chrono::Utc::now().date_naive().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Patient;

    fn setup() -> (Database, Patient) {
        let db = Database::open_in_memory().unwrap();
        let patient = Patient::new("Maria Lopez".into(), "1958-03-12".into());
        db.insert_patient(&patient).unwrap();
        (db, patient)
    }

    fn intake() -> AdmissionIntake {
        AdmissionIntake {
            condition: "Community-acquired pneumonia".into(),
            clinical_summary: vec!["Patient: Maria Lopez".into()],
            plan: vec!["IV antibiotics".into()],
            care_plan: CarePlan::default(),
        }
    }

    #[test]
    fn test_admit_rejects_missing_bed() {
        let (db, patient) = setup();
        let lifecycle = Lifecycle::new(&db);

        let err = lifecycle.admit(&patient.id, 9_999, intake()).unwrap_err();
        assert!(matches!(err, WardError::BedNotFound(9_999)));
    }

    #[test]
    fn test_admit_rejects_unknown_patient() {
        let (db, _) = setup();
        let lifecycle = Lifecycle::new(&db);

        let err = lifecycle.admit("nobody", 7, intake()).unwrap_err();
        assert!(matches!(err, WardError::PatientNotFound(_)));
    }

    #[test]
    fn test_admit_rejects_occupied_bed() {
        let (db, patient) = setup();
        let other = Patient::new("Jorge Paz".into(), "1970-07-01".into());
        db.insert_patient(&other).unwrap();

        let lifecycle = Lifecycle::new(&db);
        lifecycle.admit(&patient.id, 7, intake()).unwrap();

        let err = lifecycle.admit(&other.id, 7, intake()).unwrap_err();
        assert!(matches!(err, WardError::BedOccupied(7)));
        // The loser's link was never written
        assert!(db.get_patient(&other.id).unwrap().unwrap().bed_id.is_none());
    }

    #[test]
    fn test_admit_rejects_double_admission() {
        let (db, patient) = setup();
        let lifecycle = Lifecycle::new(&db);
        lifecycle.admit(&patient.id, 7, intake()).unwrap();

        let err = lifecycle.admit(&patient.id, 8, intake()).unwrap_err();
        assert!(matches!(
            err,
            WardError::PatientAlreadyAdmitted { bed: 7, .. }
        ));
    }

    #[test]
    fn test_discharge_rejects_vacant_bed() {
        let (db, _) = setup();
        let lifecycle = Lifecycle::new(&db);

        let err = lifecycle.discharge(7).unwrap_err();
        assert!(matches!(err, WardError::BedNotOccupied(7)));
    }
}
