//! Snapshot↔record synchronization integration tests.

use medward_core::db::Database;
use medward_core::models::{CarePlan, LabMetric, LabResult, LabSection, Patient, ResultKind};
use medward_core::snapshot::TODAY_SECTION_TITLE;
use medward_core::ward::{AdmissionIntake, LabSync, Lifecycle};

fn setup_db() -> (Database, Patient) {
    let db = Database::open_in_memory().unwrap();
    let patient = Patient::new("Maria Lopez".into(), "1958-03-12".into());
    db.insert_patient(&patient).unwrap();
    (db, patient)
}

fn admit(db: &Database, patient: &Patient, bed_id: i64) {
    Lifecycle::new(db)
        .admit(
            &patient.id,
            bed_id,
            AdmissionIntake {
                condition: "Observation".into(),
                clinical_summary: vec![],
                plan: vec![],
                care_plan: CarePlan::default(),
            },
        )
        .unwrap();
}

fn make_metric(name: &str, value: &str) -> LabMetric {
    LabMetric {
        name: name.into(),
        value: value.into(),
        kind: ResultKind::Quantitative,
        category: None,
        is_abnormal: false,
    }
}

fn make_section(date: &str, metrics: Vec<LabMetric>) -> LabSection {
    LabSection {
        title: "Ward round labs".into(),
        date: date.into(),
        metrics,
    }
}

fn bed_updated_at(db: &Database, bed_id: i64) -> String {
    db.conn()
        .query_row("SELECT updated_at FROM beds WHERE id = ?", [bed_id], |row| {
            row.get(0)
        })
        .unwrap()
}

fn set_bed_updated_at(db: &Database, bed_id: i64, stamp: &str) {
    db.conn()
        .execute(
            "UPDATE beds SET updated_at = ?1 WHERE id = ?2",
            rusqlite::params![stamp, bed_id],
        )
        .unwrap();
}

#[test]
fn test_sync_is_idempotent() {
    let (db, patient) = setup_db();
    let sections = vec![make_section(
        "2024-01-01",
        vec![make_metric("Glucose", "100 mg/dL")],
    )];

    let sync = LabSync::new(&db);
    let first = sync.sync_bed_labs(&patient.id, &sections).unwrap();
    assert_eq!(first.inserted, 1);
    assert_eq!(first.skipped, 0);

    let second = sync.sync_bed_labs(&patient.id, &sections).unwrap();
    assert_eq!(second.inserted, 0);
    assert_eq!(second.skipped, 1);

    let results = db.list_lab_results(&patient.id).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].key().to_string(), "glucose|2024-01-01");
}

#[test]
fn test_sync_dedup_key_is_case_insensitive() {
    let (db, patient) = setup_db();

    let mut existing = LabResult::new(
        "2024-01-01".into(),
        "Glucose".into(),
        ResultKind::Quantitative,
    );
    existing.value = Some(95.0);
    db.insert_lab_result(&existing, &patient.id).unwrap();

    let sections = vec![make_section(
        "2024-01-01",
        vec![make_metric(" GLUCOSE ", "100 mg/dL")],
    )];
    let report = LabSync::new(&db)
        .sync_bed_labs(&patient.id, &sections)
        .unwrap();

    assert_eq!(report.inserted, 0);
    assert_eq!(report.skipped, 1);
    assert_eq!(db.list_lab_results(&patient.id).unwrap().len(), 1);
}

#[test]
fn test_sync_parses_values_and_degrades_gracefully() {
    let (db, patient) = setup_db();
    let sections = vec![make_section(
        "2024-01-01",
        vec![
            make_metric("Glucose", "100 mg/dL"),
            make_metric("Troponin", "pending repeat"),
        ],
    )];

    LabSync::new(&db)
        .sync_bed_labs(&patient.id, &sections)
        .unwrap();

    let results = db.list_lab_results(&patient.id).unwrap();
    let glucose = results.iter().find(|r| r.test_name == "Glucose").unwrap();
    assert_eq!(glucose.value, Some(100.0));
    assert_eq!(glucose.unit, Some("mg/dL".into()));
    assert_eq!(glucose.category, Some("Ward round labs".into()));

    // Malformed quantitative value became a textual record, not an error
    let troponin = results.iter().find(|r| r.test_name == "Troponin").unwrap();
    assert!(troponin.value.is_none());
    assert_eq!(troponin.text_value, Some("pending repeat".into()));
}

#[test]
fn test_write_snapshot_propagates_new_metrics() {
    let (db, patient) = setup_db();
    admit(&db, &patient, 7);

    let mut bed = db.get_bed(7).unwrap().unwrap();
    bed.lab_sections = vec![make_section(
        "2024-01-03",
        vec![make_metric("Sodium", "140 mEq/L")],
    )];

    let report = LabSync::new(&db).write_snapshot(&bed).unwrap();
    assert_eq!(report.inserted, 1);

    // Snapshot persisted and permanent store reconciled
    let stored = db.get_bed(7).unwrap().unwrap();
    assert_eq!(stored.lab_sections.len(), 1);
    let results = db.list_lab_results(&patient.id).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].test_name, "Sodium");
}

#[test]
fn test_record_result_mirrors_into_bed() {
    let (db, patient) = setup_db();
    admit(&db, &patient, 7);

    let mut result = LabResult::new(
        "2024-01-05".into(),
        "Glucose".into(),
        ResultKind::Quantitative,
    );
    result.value = Some(118.0);
    result.unit = Some("mg/dL".into());

    let sync = LabSync::new(&db);
    let updated = sync.record_result(&patient.id, &result).unwrap().unwrap();

    assert_eq!(updated.lab_sections.len(), 1);
    assert_eq!(updated.lab_sections[0].title, TODAY_SECTION_TITLE);
    assert_eq!(updated.lab_sections[0].date, "2024-01-05");
    assert_eq!(updated.lab_sections[0].metrics[0].value, "118 mg/dL");

    // Same-date follow-up lands in the same section
    let mut follow_up = LabResult::new(
        "2024-01-05".into(),
        "Creatinine".into(),
        ResultKind::Quantitative,
    );
    follow_up.value = Some(1.1);
    let updated = sync.record_result(&patient.id, &follow_up).unwrap().unwrap();
    assert_eq!(updated.lab_sections.len(), 1);
    assert_eq!(updated.lab_sections[0].metrics.len(), 2);

    assert_eq!(db.list_lab_results(&patient.id).unwrap().len(), 2);
}

#[test]
fn test_record_result_without_bed_only_stores() {
    let (db, patient) = setup_db();

    let result = LabResult::new(
        "2024-01-05".into(),
        "Glucose".into(),
        ResultKind::Quantitative,
    );
    let updated = LabSync::new(&db).record_result(&patient.id, &result).unwrap();

    assert!(updated.is_none());
    assert_eq!(db.list_lab_results(&patient.id).unwrap().len(), 1);
}

#[test]
fn test_delete_result_removes_metric_and_empty_section() {
    let (db, patient) = setup_db();
    admit(&db, &patient, 7);

    let mut result = LabResult::new(
        "2024-01-05".into(),
        "Glucose".into(),
        ResultKind::Quantitative,
    );
    result.value = Some(118.0);
    let sync = LabSync::new(&db);
    sync.record_result(&patient.id, &result).unwrap();

    assert!(sync.delete_result(&result.id).unwrap());

    assert!(db.list_lab_results(&patient.id).unwrap().is_empty());
    let bed = db.get_bed(7).unwrap().unwrap();
    assert!(bed.lab_sections.is_empty());
}

#[test]
fn test_delete_without_matching_metric_skips_bed_write() {
    let (db, patient) = setup_db();
    admit(&db, &patient, 7);

    // Permanent-only result, never mirrored into the snapshot
    let result = LabResult::new(
        "2024-01-05".into(),
        "Glucose".into(),
        ResultKind::Quantitative,
    );
    db.insert_lab_result(&result, &patient.id).unwrap();

    let sentinel = "2000-01-01 00:00:00";
    set_bed_updated_at(&db, 7, sentinel);

    assert!(LabSync::new(&db).delete_result(&result.id).unwrap());

    // No metric matched, so the bed row was not rewritten
    assert_eq!(bed_updated_at(&db, 7), sentinel);
    assert!(db.list_lab_results(&patient.id).unwrap().is_empty());
}

#[test]
fn test_delete_unknown_result_is_noop() {
    let (db, _) = setup_db();
    assert!(!LabSync::new(&db).delete_result("missing").unwrap());
}
