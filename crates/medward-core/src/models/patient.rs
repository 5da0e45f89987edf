//! Patient models.

use serde::{Deserialize, Serialize};

/// A patient record. `bed_id` mirrors the occupied bed's occupant reference;
/// the two are only ever written together by the ward lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    /// Patient UUID
    pub id: String,
    /// Full name
    pub name: String,
    /// Date of birth (YYYY-MM-DD)
    pub dob: String,
    /// Gender
    pub gender: Option<String>,
    /// Blood type (e.g., "O+")
    pub blood_type: Option<String>,
    /// Known allergies
    pub allergies: Vec<String>,
    /// Chronic conditions
    pub chronic_conditions: Vec<String>,
    /// Contact info
    pub contact: Option<String>,
    /// Occupied bed, if admitted
    pub bed_id: Option<i64>,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl Patient {
    /// Create a new patient with required fields.
    pub fn new(name: String, dob: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            dob,
            gender: None,
            blood_type: None,
            allergies: Vec::new(),
            chronic_conditions: Vec::new(),
            contact: None,
            bed_id: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Check if this patient currently occupies a bed.
    pub fn is_admitted(&self) -> bool {
        self.bed_id.is_some()
    }

    /// Touch the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}
