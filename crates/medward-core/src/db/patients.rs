//! Patient database operations.

use rusqlite::{params, Connection, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::Patient;

impl Database {
    /// Insert a new patient.
    pub fn insert_patient(&self, patient: &Patient) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO patients (
                id, name, dob, gender, blood_type, allergies,
                chronic_conditions, contact, bed_id, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                patient.id,
                patient.name,
                patient.dob,
                patient.gender,
                patient.blood_type,
                serde_json::to_string(&patient.allergies)?,
                serde_json::to_string(&patient.chronic_conditions)?,
                patient.contact,
                patient.bed_id,
                patient.created_at,
                patient.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Update a patient's demographic fields. The bed reference is managed
    /// exclusively by the ward lifecycle and is deliberately not written here.
    pub fn update_patient(&self, patient: &Patient) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE patients SET
                name = ?2,
                dob = ?3,
                gender = ?4,
                blood_type = ?5,
                allergies = ?6,
                chronic_conditions = ?7,
                contact = ?8,
                updated_at = datetime('now')
            WHERE id = ?1
            "#,
            params![
                patient.id,
                patient.name,
                patient.dob,
                patient.gender,
                patient.blood_type,
                serde_json::to_string(&patient.allergies)?,
                serde_json::to_string(&patient.chronic_conditions)?,
                patient.contact,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a patient by id.
    pub fn get_patient(&self, id: &str) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                &format!("{} WHERE id = ?", SELECT_PATIENTS),
                [id],
                map_patient_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List all patients ordered by name.
    pub fn list_patients(&self) -> DbResult<Vec<Patient>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} ORDER BY name", SELECT_PATIENTS))?;
        let rows = stmt.query_map([], map_patient_row)?;

        let mut patients = Vec::new();
        for row in rows {
            patients.push(row?.try_into()?);
        }
        Ok(patients)
    }

    /// Set or clear a patient's bed reference.
    pub fn set_patient_bed(&self, patient_id: &str, bed_id: Option<i64>) -> DbResult<bool> {
        set_bed_ref(&self.conn, patient_id, bed_id)
    }

    /// Delete a patient and their dependent records. If the patient occupies
    /// a bed it is released in the same transaction, without a discharge
    /// archive entry (deletion is not a discharge).
    pub fn delete_patient(&self, id: &str) -> DbResult<bool> {
        let bed_id: Option<i64> = self
            .conn
            .query_row("SELECT bed_id FROM patients WHERE id = ?", [id], |row| {
                row.get(0)
            })
            .optional()?
            .flatten();

        let tx = self.transaction()?;

        if let Some(bed_id) = bed_id {
            super::beds::clear(&tx, bed_id)?;
        }

        // Manual cascade over dependent rows
        super::labs::delete_for_patient(&tx, id)?;
        let rows_affected = tx.execute("DELETE FROM patients WHERE id = ?", [id])?;

        tx.commit()?;
        Ok(rows_affected > 0)
    }
}

/// Write one side of the patient↔bed link. Only the ward lifecycle calls
/// this, always alongside the matching bed write.
pub(crate) fn set_bed_ref(
    conn: &Connection,
    patient_id: &str,
    bed_id: Option<i64>,
) -> DbResult<bool> {
    let rows_affected = conn.execute(
        "UPDATE patients SET bed_id = ?2, updated_at = datetime('now') WHERE id = ?1",
        params![patient_id, bed_id],
    )?;
    Ok(rows_affected > 0)
}

const SELECT_PATIENTS: &str = r#"
    SELECT id, name, dob, gender, blood_type, allergies,
           chronic_conditions, contact, bed_id, created_at, updated_at
    FROM patients
"#;

fn map_patient_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PatientRow> {
    Ok(PatientRow {
        id: row.get(0)?,
        name: row.get(1)?,
        dob: row.get(2)?,
        gender: row.get(3)?,
        blood_type: row.get(4)?,
        allergies: row.get(5)?,
        chronic_conditions: row.get(6)?,
        contact: row.get(7)?,
        bed_id: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

/// Intermediate row struct for database mapping.
struct PatientRow {
    id: String,
    name: String,
    dob: String,
    gender: Option<String>,
    blood_type: Option<String>,
    allergies: String,
    chronic_conditions: String,
    contact: Option<String>,
    bed_id: Option<i64>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<PatientRow> for Patient {
    type Error = DbError;

    fn try_from(row: PatientRow) -> Result<Self, Self::Error> {
        Ok(Patient {
            id: row.id,
            name: row.name,
            dob: row.dob,
            gender: row.gender,
            blood_type: row.blood_type,
            allergies: serde_json::from_str(&row.allergies)?,
            chronic_conditions: serde_json::from_str(&row.chronic_conditions)?,
            contact: row.contact,
            bed_id: row.bed_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
