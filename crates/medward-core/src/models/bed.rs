//! Bed models: occupancy status, the embedded clinical snapshot, and the
//! care-plan configuration record.

use serde::{Deserialize, Serialize};

use super::labs::LabSection;
use crate::locator::{self, WardLocation};

/// Occupancy status of a bed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BedStatus {
    Available,
    Occupied,
}

/// Monitoring/device configuration attached to an occupied bed. Copied by
/// value into anything generated while the bed is occupied, never referenced.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CarePlan {
    /// Glucose check at 14:00 (mg%)
    #[serde(default)]
    pub hgt_1400: String,
    /// Glucose check at 22:00 (mg%)
    #[serde(default)]
    pub hgt_2200: String,
    /// Glucose check at 06:00 (mg%)
    #[serde(default)]
    pub hgt_0600: String,
    /// IV catheter descriptor
    #[serde(default)]
    pub catheter_type: String,
    /// Needle size
    #[serde(default)]
    pub needle_size: String,
    /// Nasogastric tube type
    #[serde(default)]
    pub nasogastric_tube: String,
    /// Foley tube type
    #[serde(default)]
    pub foley_tube: String,
    /// Oxygen delivery mode
    #[serde(default)]
    pub oxygen_mode: String,
    /// Venoclysis kit in use
    #[serde(default)]
    pub venoclysis: bool,
    /// Microdropper in use
    #[serde(default)]
    pub microdropper: bool,
    /// Triple-way valve in use
    #[serde(default)]
    pub triple_way_valve: bool,
}

/// A physical bed. The ward location is derived from the id at read time and
/// never stored; the clinical snapshot fields mirror the occupant's records
/// while the bed is occupied and are all cleared when it is not.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bed {
    /// Global bed number (1..N)
    pub id: i64,
    /// Occupancy status
    pub status: BedStatus,
    /// Occupant patient ID; set iff status is Occupied
    pub patient_id: Option<String>,
    /// Free-text admitting condition
    pub condition: Option<String>,
    /// Admission date (YYYY-MM-DD)
    pub admission_date: Option<String>,
    /// Clinical summary lines
    pub clinical_summary: Vec<String>,
    /// Plan lines
    pub plan: Vec<String>,
    /// Care-plan configuration
    pub care_plan: Option<CarePlan>,
    /// Lab snapshot sections, newest first
    pub lab_sections: Vec<LabSection>,
}

impl Bed {
    /// An empty available bed.
    pub fn vacant(id: i64) -> Self {
        Self {
            id,
            status: BedStatus::Available,
            patient_id: None,
            condition: None,
            admission_date: None,
            clinical_summary: Vec::new(),
            plan: Vec::new(),
            care_plan: None,
            lab_sections: Vec::new(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == BedStatus::Available
    }

    /// Clear occupancy and every snapshot field.
    pub fn clear_snapshot(&mut self) {
        self.status = BedStatus::Available;
        self.patient_id = None;
        self.condition = None;
        self.admission_date = None;
        self.clinical_summary.clear();
        self.plan.clear();
        self.care_plan = None;
        self.lab_sections.clear();
    }

    /// Ward location derived from the bed id. Any ward text found in storage
    /// is superseded by this computation.
    pub fn location(&self) -> WardLocation {
        locator::locate(self.id)
    }

    /// Display label, always `"Bed {id}"`.
    pub fn label(&self) -> String {
        locator::bed_label(self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::labs::{LabMetric, ResultKind};

    #[test]
    fn test_vacant_bed() {
        let bed = Bed::vacant(12);
        assert!(bed.is_available());
        assert!(bed.patient_id.is_none());
        assert!(bed.lab_sections.is_empty());
        assert_eq!(bed.label(), "Bed 12");
    }

    #[test]
    fn test_clear_snapshot() {
        let mut bed = Bed::vacant(3);
        bed.status = BedStatus::Occupied;
        bed.patient_id = Some("patient-1".into());
        bed.condition = Some("Pneumonia".into());
        bed.admission_date = Some("2024-01-01".into());
        bed.clinical_summary = vec!["line".into()];
        bed.plan = vec!["plan".into()];
        bed.care_plan = Some(CarePlan::default());
        bed.lab_sections = vec![LabSection {
            title: "Admission (Latest Labs)".into(),
            date: "2024-01-01".into(),
            metrics: vec![LabMetric {
                name: "Glucose".into(),
                value: "100 mg/dL".into(),
                kind: ResultKind::Quantitative,
                category: None,
                is_abnormal: false,
            }],
        }];

        bed.clear_snapshot();

        assert_eq!(bed, Bed::vacant(3));
    }

    #[test]
    fn test_location_is_derived() {
        assert_eq!(Bed::vacant(49).location().label(), "Pavilion 2 I");
    }
}
