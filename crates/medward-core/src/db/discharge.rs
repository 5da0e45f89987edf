//! Discharge archive database operations (append-only).

use rusqlite::{params, Connection};

use super::{Database, DbError, DbResult};
use crate::models::{DischargeRecord, LabSection};

impl Database {
    /// Insert a discharge archive record.
    pub fn insert_discharge(&self, record: &DischargeRecord) -> DbResult<()> {
        insert(&self.conn, record)
    }

    /// List the discharge history, newest first.
    pub fn list_discharge_history(&self) -> DbResult<Vec<DischargeRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, original_bed_id, patient_name, discharge_date, condition,
                   clinical_summary, plan, lab_sections, created_at
            FROM discharge_history
            ORDER BY created_at DESC, discharge_date DESC
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(DischargeRow {
                id: row.get(0)?,
                original_bed_id: row.get(1)?,
                patient_name: row.get(2)?,
                discharge_date: row.get(3)?,
                condition: row.get(4)?,
                clinical_summary: row.get(5)?,
                plan: row.get(6)?,
                lab_sections: row.get(7)?,
                created_at: row.get(8)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?.try_into()?);
        }
        Ok(records)
    }
}

/// Archive insert, usable inside the discharge transaction. The table's
/// triggers reject any later update or delete.
pub(crate) fn insert(conn: &Connection, record: &DischargeRecord) -> DbResult<()> {
    conn.execute(
        r#"
        INSERT INTO discharge_history (
            id, original_bed_id, patient_name, discharge_date, condition,
            clinical_summary, plan, lab_sections, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
        params![
            record.id,
            record.original_bed_id,
            record.patient_name,
            record.discharge_date,
            record.condition,
            serde_json::to_string(&record.clinical_summary)?,
            serde_json::to_string(&record.plan)?,
            serde_json::to_string(&record.lab_sections)?,
            record.created_at,
        ],
    )?;
    Ok(())
}

/// Intermediate row struct for database mapping.
struct DischargeRow {
    id: String,
    original_bed_id: i64,
    patient_name: String,
    discharge_date: String,
    condition: Option<String>,
    clinical_summary: String,
    plan: String,
    lab_sections: String,
    created_at: String,
}

impl TryFrom<DischargeRow> for DischargeRecord {
    type Error = DbError;

    fn try_from(row: DischargeRow) -> Result<Self, Self::Error> {
        let lab_sections: Vec<LabSection> = serde_json::from_str(&row.lab_sections)?;

        Ok(DischargeRecord {
            id: row.id,
            original_bed_id: row.original_bed_id,
            patient_name: row.patient_name,
            discharge_date: row.discharge_date,
            condition: row.condition,
            clinical_summary: serde_json::from_str(&row.clinical_summary)?,
            plan: serde_json::from_str(&row.plan)?,
            lab_sections,
            created_at: row.created_at,
        })
    }
}
