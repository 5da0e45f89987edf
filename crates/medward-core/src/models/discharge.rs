//! Discharge archive models.

use serde::{Deserialize, Serialize};

use super::bed::Bed;
use super::labs::LabSection;

/// Archival copy of a bed snapshot taken at discharge time. The patient name
/// is captured as a plain string so the record survives patient deletion.
/// Created once per discharge and immutable afterward.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DischargeRecord {
    /// Unique record ID
    pub id: String,
    /// Bed the patient was discharged from
    pub original_bed_id: i64,
    /// Patient name at discharge time (not a live reference)
    pub patient_name: String,
    /// Discharge date (YYYY-MM-DD)
    pub discharge_date: String,
    /// Condition at discharge
    pub condition: Option<String>,
    /// Clinical summary lines
    pub clinical_summary: Vec<String>,
    /// Plan lines
    pub plan: Vec<String>,
    /// Lab snapshot sections
    pub lab_sections: Vec<LabSection>,
    /// Creation timestamp
    pub created_at: String,
}

impl DischargeRecord {
    /// Capture a bed snapshot verbatim.
    pub fn from_bed(bed: &Bed, patient_name: String, discharge_date: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            original_bed_id: bed.id,
            patient_name,
            discharge_date,
            condition: bed.condition.clone(),
            clinical_summary: bed.clinical_summary.clone(),
            plan: bed.plan.clone(),
            lab_sections: bed.lab_sections.clone(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
