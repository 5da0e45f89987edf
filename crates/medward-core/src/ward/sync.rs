//! Snapshot↔record lab reconciliation.
//!
//! The bed snapshot is a denormalized mirror of the per-patient lab store.
//! Writes to either side flow through this manager so the two stay in step:
//! - snapshot written → metrics missing from the permanent store are inserted
//!   (`sync_bed_labs`, keyed by [`LabKey`])
//! - permanent result recorded → folded into the occupied bed's snapshot
//! - permanent result deleted → taken back out of the snapshot

use std::collections::HashSet;

use crate::db::{Database, DbError};
use crate::models::{Bed, LabKey, LabMetric, LabResult, LabSection, ResultKind};
use crate::snapshot;

use super::{WardError, WardResult};

/// Default category when neither the metric nor its section provides one.
const FALLBACK_CATEGORY: &str = "General";

/// Outcome of a snapshot→record pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    /// Results inserted into the permanent store
    pub inserted: usize,
    /// Metrics already present by key
    pub skipped: usize,
}

/// Synchronization manager.
pub struct LabSync<'a> {
    db: &'a Database,
}

impl<'a> LabSync<'a> {
    /// Create a new sync manager.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Overwrite a bed's snapshot, then propagate new metrics to the
    /// permanent store of the occupant (if any).
    pub fn write_snapshot(&self, bed: &Bed) -> WardResult<SyncReport> {
        if !self.db.update_bed_snapshot(bed)? {
            return Err(WardError::BedNotFound(bed.id));
        }

        match &bed.patient_id {
            Some(patient_id) => self.sync_bed_labs(patient_id, &bed.lab_sections),
            None => Ok(SyncReport::default()),
        }
    }

    /// Insert every snapshot metric not yet present in the patient's
    /// permanent store.
    ///
    /// Idempotent across repeated calls for an unchanged snapshot, but NOT
    /// atomic across metrics: each insert is independent, and a failure on
    /// one metric neither aborts the loop nor rolls back earlier inserts.
    /// Failures are aggregated into [`WardError::SyncIncomplete`].
    pub fn sync_bed_labs(
        &self,
        patient_id: &str,
        sections: &[LabSection],
    ) -> WardResult<SyncReport> {
        let existing = self.db.list_lab_results(patient_id)?;
        let mut seen: HashSet<LabKey> = existing.iter().map(|r| r.key()).collect();

        let mut report = SyncReport::default();
        let mut failed = Vec::new();

        for section in sections {
            for metric in &section.metrics {
                let key = LabKey::new(&metric.name, &section.date);
                if seen.contains(&key) {
                    report.skipped += 1;
                    continue;
                }

                let result = result_from_metric(metric, section);
                match self.db.insert_lab_result(&result, patient_id) {
                    Ok(()) => {
                        seen.insert(key);
                        report.inserted += 1;
                    }
                    Err(e) => failed.push(format!("{}: {}", key, e)),
                }
            }
        }

        if !failed.is_empty() {
            return Err(WardError::SyncIncomplete { failed });
        }
        Ok(report)
    }

    /// Record a new permanent result and fold it into the occupant's bed
    /// snapshot. Returns the updated bed when the patient is admitted.
    pub fn record_result(
        &self,
        patient_id: &str,
        result: &LabResult,
    ) -> WardResult<Option<Bed>> {
        let patient = self
            .db
            .get_patient(patient_id)?
            .ok_or_else(|| WardError::PatientNotFound(patient_id.to_string()))?;

        let tx = self.db.transaction()?;
        self.db.insert_lab_result(result, patient_id)?;

        let mut updated = None;
        if let Some(bed_id) = patient.bed_id {
            if let Some(mut bed) = self.db.get_bed(bed_id)? {
                snapshot::merge_result(&mut bed.lab_sections, result);
                self.db.update_bed_snapshot(&bed)?;
                updated = Some(bed);
            }
        }

        tx.commit().map_err(DbError::from)?;
        Ok(updated)
    }

    /// Delete a permanent result and remove its metric from the occupant's
    /// bed snapshot. The bed is not rewritten when no metric matched.
    pub fn delete_result(&self, result_id: &str) -> WardResult<bool> {
        let Some((patient_id, result)) = self.db.get_lab_result(result_id)? else {
            return Ok(false);
        };
        let bed_id = self
            .db
            .get_patient(&patient_id)?
            .and_then(|p| p.bed_id);

        let tx = self.db.transaction()?;
        self.db.delete_lab_result(result_id)?;

        if let Some(bed_id) = bed_id {
            if let Some(mut bed) = self.db.get_bed(bed_id)? {
                if snapshot::remove_result(&mut bed.lab_sections, &result) {
                    self.db.update_bed_snapshot(&bed)?;
                }
            }
        }

        tx.commit().map_err(DbError::from)?;
        Ok(true)
    }
}

/// Reconstruct a permanent result from a snapshot metric.
///
/// A quantitative display value is split into leading number + unit; when the
/// leading token is not numeric the whole display value degrades to a textual
/// record rather than being rejected.
fn result_from_metric(metric: &LabMetric, section: &LabSection) -> LabResult {
    let mut result = LabResult::new(section.date.clone(), metric.name.clone(), metric.kind);
    result.is_abnormal = metric.is_abnormal;
    result.category = metric
        .category
        .clone()
        .filter(|c| !c.is_empty())
        .or_else(|| (!section.title.is_empty()).then(|| section.title.clone()))
        .or_else(|| Some(FALLBACK_CATEGORY.to_string()));

    match metric.kind {
        ResultKind::Quantitative => match parse_display_value(&metric.value) {
            Some((value, unit)) => {
                result.value = Some(value);
                result.unit = unit;
            }
            None => result.text_value = Some(metric.value.clone()),
        },
        ResultKind::Qualitative => result.text_value = Some(metric.value.clone()),
    }

    result
}

/// Split `"100 mg/dL"` into `(100.0, Some("mg/dL"))`. `None` when the leading
/// whitespace-delimited token does not parse as a number.
fn parse_display_value(value: &str) -> Option<(f64, Option<String>)> {
    let mut tokens = value.split_whitespace();
    let number: f64 = tokens.next()?.parse().ok()?;
    let unit = tokens.collect::<Vec<_>>().join(" ");
    Some((number, (!unit.is_empty()).then_some(unit)))
}
