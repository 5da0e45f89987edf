//! Bed database operations.
//!
//! Ward location is never read from this table; it is derived from the bed
//! id at the model layer.

use rusqlite::{params, Connection, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::{Bed, BedStatus, CarePlan, LabSection};

impl Database {
    /// Get a bed by id.
    pub fn get_bed(&self, bed_id: i64) -> DbResult<Option<Bed>> {
        self.conn
            .query_row(
                &format!("{} WHERE id = ?", SELECT_BEDS),
                [bed_id],
                map_bed_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List all beds ordered by id.
    pub fn list_beds(&self) -> DbResult<Vec<Bed>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} ORDER BY id", SELECT_BEDS))?;
        let rows = stmt.query_map([], map_bed_row)?;

        let mut beds = Vec::new();
        for row in rows {
            beds.push(row?.try_into()?);
        }
        Ok(beds)
    }

    /// List beds currently available for admission.
    pub fn list_available_beds(&self) -> DbResult<Vec<Bed>> {
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE status = 'available' ORDER BY id",
            SELECT_BEDS
        ))?;
        let rows = stmt.query_map([], map_bed_row)?;

        let mut beds = Vec::new();
        for row in rows {
            beds.push(row?.try_into()?);
        }
        Ok(beds)
    }

    /// Overwrite a bed's clinical snapshot fields (not its occupancy).
    pub fn update_bed_snapshot(&self, bed: &Bed) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE beds SET
                condition = ?2,
                admission_date = ?3,
                clinical_summary = ?4,
                plan = ?5,
                care_plan = ?6,
                lab_sections = ?7,
                updated_at = datetime('now')
            WHERE id = ?1
            "#,
            params![
                bed.id,
                bed.condition,
                bed.admission_date,
                serde_json::to_string(&bed.clinical_summary)?,
                serde_json::to_string(&bed.plan)?,
                bed.care_plan
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()?,
                serde_json::to_string(&bed.lab_sections)?,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Release a bed: status back to available, occupant and every clinical
    /// field cleared.
    pub fn clear_bed_clinical_fields(&self, bed_id: i64) -> DbResult<()> {
        clear(&self.conn, bed_id)
    }
}

/// Claim an available bed for an occupant, writing the full snapshot. The
/// status guard makes this a compare-and-swap: a bed occupied since the
/// caller's read leaves zero rows affected.
pub(crate) fn occupy(conn: &Connection, bed: &Bed) -> DbResult<bool> {
    let rows_affected = conn.execute(
        r#"
        UPDATE beds SET
            status = 'occupied',
            patient_id = ?2,
            condition = ?3,
            admission_date = ?4,
            clinical_summary = ?5,
            plan = ?6,
            care_plan = ?7,
            lab_sections = ?8,
            updated_at = datetime('now')
        WHERE id = ?1 AND status = 'available'
        "#,
        params![
            bed.id,
            bed.patient_id,
            bed.condition,
            bed.admission_date,
            serde_json::to_string(&bed.clinical_summary)?,
            serde_json::to_string(&bed.plan)?,
            bed.care_plan
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?,
            serde_json::to_string(&bed.lab_sections)?,
        ],
    )?;
    Ok(rows_affected > 0)
}

/// Clear occupancy and snapshot in one statement.
pub(crate) fn clear(conn: &Connection, bed_id: i64) -> DbResult<()> {
    conn.execute(
        r#"
        UPDATE beds SET
            status = 'available',
            patient_id = NULL,
            condition = NULL,
            admission_date = NULL,
            clinical_summary = NULL,
            plan = NULL,
            care_plan = NULL,
            lab_sections = NULL,
            updated_at = datetime('now')
        WHERE id = ?
        "#,
        [bed_id],
    )?;
    Ok(())
}

const SELECT_BEDS: &str = r#"
    SELECT id, status, patient_id, condition, admission_date,
           clinical_summary, plan, care_plan, lab_sections
    FROM beds
"#;

fn map_bed_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<BedRow> {
    Ok(BedRow {
        id: row.get(0)?,
        status: row.get(1)?,
        patient_id: row.get(2)?,
        condition: row.get(3)?,
        admission_date: row.get(4)?,
        clinical_summary: row.get(5)?,
        plan: row.get(6)?,
        care_plan: row.get(7)?,
        lab_sections: row.get(8)?,
    })
}

/// Intermediate row struct for database mapping.
struct BedRow {
    id: i64,
    status: String,
    patient_id: Option<String>,
    condition: Option<String>,
    admission_date: Option<String>,
    clinical_summary: Option<String>,
    plan: Option<String>,
    care_plan: Option<String>,
    lab_sections: Option<String>,
}

impl TryFrom<BedRow> for Bed {
    type Error = DbError;

    fn try_from(row: BedRow) -> Result<Self, Self::Error> {
        let clinical_summary: Vec<String> = row
            .clinical_summary
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?
            .unwrap_or_default();
        let plan: Vec<String> = row
            .plan
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?
            .unwrap_or_default();
        let care_plan: Option<CarePlan> = row
            .care_plan
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;
        let lab_sections: Vec<LabSection> = row
            .lab_sections
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?
            .unwrap_or_default();

        Ok(Bed {
            id: row.id,
            status: string_to_status(&row.status)?,
            patient_id: row.patient_id,
            condition: row.condition,
            admission_date: row.admission_date,
            clinical_summary,
            plan,
            care_plan,
            lab_sections,
        })
    }
}

fn string_to_status(s: &str) -> Result<BedStatus, DbError> {
    match s {
        "available" => Ok(BedStatus::Available),
        "occupied" => Ok(BedStatus::Occupied),
        _ => Err(DbError::Constraint(format!("Unknown bed status: {}", s))),
    }
}
