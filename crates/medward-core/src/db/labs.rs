//! Lab result database operations (the permanent per-patient record).

use rusqlite::{params, Connection, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::{LabResult, ResultKind};

impl Database {
    /// Insert a new lab result for a patient.
    pub fn insert_lab_result(&self, result: &LabResult, patient_id: &str) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO lab_results (
                id, patient_id, date, test_name, category, kind,
                value, text_value, unit, is_abnormal, file_name, file_url, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                result.id,
                patient_id,
                result.date,
                result.test_name,
                result.category,
                result.kind.as_str(),
                result.value,
                result.text_value,
                result.unit,
                result.is_abnormal,
                result.file_name,
                result.file_url,
                result.created_at,
            ],
        )?;
        Ok(())
    }

    /// Get a result and its owning patient id.
    pub fn get_lab_result(&self, id: &str) -> DbResult<Option<(String, LabResult)>> {
        self.conn
            .query_row(
                &format!("{} WHERE id = ?", SELECT_LAB_RESULTS),
                [id],
                map_lab_row,
            )
            .optional()?
            .map(|row| {
                let patient_id = row.patient_id.clone();
                row.try_into().map(|result| (patient_id, result))
            })
            .transpose()
    }

    /// List a patient's results, newest first. This ordering is what the
    /// admission merge relies on to find the latest batch.
    pub fn list_lab_results(&self, patient_id: &str) -> DbResult<Vec<LabResult>> {
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE patient_id = ? ORDER BY date DESC, created_at DESC",
            SELECT_LAB_RESULTS
        ))?;
        let rows = stmt.query_map([patient_id], map_lab_row)?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?.try_into()?);
        }
        Ok(results)
    }

    /// Delete a result.
    pub fn delete_lab_result(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM lab_results WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

/// Remove every result belonging to a patient (patient-deletion cascade).
pub(crate) fn delete_for_patient(conn: &Connection, patient_id: &str) -> DbResult<()> {
    conn.execute("DELETE FROM lab_results WHERE patient_id = ?", [patient_id])?;
    Ok(())
}

const SELECT_LAB_RESULTS: &str = r#"
    SELECT id, patient_id, date, test_name, category, kind,
           value, text_value, unit, is_abnormal, file_name, file_url, created_at
    FROM lab_results
"#;

fn map_lab_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<LabResultRow> {
    Ok(LabResultRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        date: row.get(2)?,
        test_name: row.get(3)?,
        category: row.get(4)?,
        kind: row.get(5)?,
        value: row.get(6)?,
        text_value: row.get(7)?,
        unit: row.get(8)?,
        is_abnormal: row.get(9)?,
        file_name: row.get(10)?,
        file_url: row.get(11)?,
        created_at: row.get(12)?,
    })
}

/// Intermediate row struct for database mapping.
struct LabResultRow {
    id: String,
    patient_id: String,
    date: String,
    test_name: String,
    category: Option<String>,
    kind: String,
    value: Option<f64>,
    text_value: Option<String>,
    unit: Option<String>,
    is_abnormal: bool,
    file_name: Option<String>,
    file_url: Option<String>,
    created_at: String,
}

impl TryFrom<LabResultRow> for LabResult {
    type Error = DbError;

    fn try_from(row: LabResultRow) -> Result<Self, Self::Error> {
        Ok(LabResult {
            id: row.id,
            date: row.date,
            test_name: row.test_name,
            category: row.category,
            kind: string_to_kind(&row.kind)?,
            value: row.value,
            text_value: row.text_value,
            unit: row.unit,
            is_abnormal: row.is_abnormal,
            file_name: row.file_name,
            file_url: row.file_url,
            created_at: row.created_at,
        })
    }
}

fn string_to_kind(s: &str) -> Result<ResultKind, DbError> {
    match s {
        "quantitative" => Ok(ResultKind::Quantitative),
        "qualitative" => Ok(ResultKind::Qualitative),
        _ => Err(DbError::Constraint(format!("Unknown result kind: {}", s))),
    }
}
