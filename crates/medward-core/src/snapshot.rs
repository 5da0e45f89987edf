//! Bed snapshot lab-section maintenance.
//!
//! Pure merge logic over the section list embedded in a bed record:
//! - admission merge: seed the snapshot from the latest batch of a patient's
//!   lab history
//! - incremental merge: fold one newly recorded result into the sections
//! - removal: take a deleted result back out of the sections
//!
//! Sections are ordered newest first; new sections are prepended.

use crate::models::{LabMetric, LabResult, LabSection};

/// Title of the section built at admission time.
pub const ADMISSION_SECTION_TITLE: &str = "Admission (Latest Labs)";
/// Reserved title matched as a fallback target for incremental merges.
pub const TODAY_SECTION_TITLE: &str = "Today's Results";

/// Build the admission snapshot from a patient's lab history (ordered newest
/// first): exactly one section holding the results whose date equals the most
/// recent result's date. Empty history yields no sections.
pub fn admission_sections(history: &[LabResult]) -> Vec<LabSection> {
    let Some(latest) = history.first() else {
        return Vec::new();
    };

    let batch_date = latest.date.clone();
    let metrics: Vec<LabMetric> = history
        .iter()
        .filter(|r| r.date == batch_date)
        .map(LabMetric::from_result)
        .collect();

    vec![LabSection {
        title: ADMISSION_SECTION_TITLE.to_string(),
        date: batch_date,
        metrics,
    }]
}

/// Fold one new result into the sections. The target is the first section
/// matching the result's date, or the reserved "Today's Results" section as
/// fallback; when neither exists a new section is prepended. Metrics in other
/// sections are never touched.
pub fn merge_result(sections: &mut Vec<LabSection>, result: &LabResult) {
    let metric = LabMetric::from_result(result);

    if let Some(section) = sections
        .iter_mut()
        .find(|s| s.date == result.date || s.title == TODAY_SECTION_TITLE)
    {
        section.metrics.push(metric);
    } else {
        sections.insert(
            0,
            LabSection {
                title: TODAY_SECTION_TITLE.to_string(),
                date: result.date.clone(),
                metrics: vec![metric],
            },
        );
    }
}

/// Remove a deleted result's metric(s) from the sections: in sections whose
/// date matches, drop metrics whose test name normalizes to the result's
/// (same trim+lowercase policy as the sync dedup key), then drop any section
/// left empty. Returns whether anything changed so callers can skip the bed
/// write when nothing did.
pub fn remove_result(sections: &mut Vec<LabSection>, result: &LabResult) -> bool {
    let key = result.key();
    let mut changed = false;

    for section in sections.iter_mut() {
        if section.date != result.date {
            continue;
        }
        let before = section.metrics.len();
        section.metrics.retain(|m| !key.matches_name(&m.name));
        if section.metrics.len() != before {
            changed = true;
        }
    }

    let before_sections = sections.len();
    sections.retain(|s| !s.metrics.is_empty());

    changed || sections.len() != before_sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResultKind;

    fn make_result(date: &str, name: &str, value: f64) -> LabResult {
        let mut result = LabResult::new(date.into(), name.into(), ResultKind::Quantitative);
        result.value = Some(value);
        result.unit = Some("mg/dL".into());
        result
    }

    #[test]
    fn test_admission_sections_latest_batch_only() {
        let history = vec![
            make_result("2024-01-02", "Glucose", 100.0),
            make_result("2024-01-02", "Creatinine", 1.1),
            make_result("2024-01-01", "Glucose", 95.0),
        ];

        let sections = admission_sections(&history);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, ADMISSION_SECTION_TITLE);
        assert_eq!(sections[0].date, "2024-01-02");
        assert_eq!(sections[0].metrics.len(), 2);
        assert_eq!(sections[0].metrics[0].value, "100 mg/dL");
    }

    #[test]
    fn test_admission_sections_empty_history() {
        assert!(admission_sections(&[]).is_empty());
    }

    #[test]
    fn test_merge_appends_to_matching_date() {
        let mut sections = admission_sections(&[make_result("2024-01-02", "Glucose", 100.0)]);

        merge_result(&mut sections, &make_result("2024-01-02", "Creatinine", 1.1));

        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].metrics.len(), 2);
    }

    #[test]
    fn test_merge_prepends_new_section() {
        let mut sections = admission_sections(&[make_result("2024-01-02", "Glucose", 100.0)]);

        merge_result(&mut sections, &make_result("2024-01-05", "Sodium", 140.0));

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].title, TODAY_SECTION_TITLE);
        assert_eq!(sections[0].date, "2024-01-05");
        assert_eq!(sections[1].metrics.len(), 1);
    }

    #[test]
    fn test_merge_falls_back_to_today_section() {
        let mut sections = vec![LabSection {
            title: TODAY_SECTION_TITLE.into(),
            date: "2024-01-05".into(),
            metrics: Vec::new(),
        }];

        merge_result(&mut sections, &make_result("2024-01-06", "Sodium", 140.0));

        // No date match, but the reserved title catches the metric.
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].metrics.len(), 1);
    }

    #[test]
    fn test_remove_drops_metric_and_empty_section() {
        let mut sections = admission_sections(&[
            make_result("2024-01-02", "Glucose", 100.0),
            make_result("2024-01-02", "Creatinine", 1.1),
        ]);
        merge_result(&mut sections, &make_result("2024-01-05", "Sodium", 140.0));

        assert!(remove_result(&mut sections, &make_result("2024-01-05", "Sodium", 140.0)));
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].metrics.len(), 2);

        assert!(remove_result(&mut sections, &make_result("2024-01-02", "GLUCOSE", 0.0)));
        assert_eq!(sections[0].metrics.len(), 1);
        assert_eq!(sections[0].metrics[0].name, "Creatinine");
    }

    #[test]
    fn test_remove_without_match_reports_no_change() {
        let mut sections = admission_sections(&[make_result("2024-01-02", "Glucose", 100.0)]);
        let original = sections.clone();

        // Wrong date: same name elsewhere is left alone.
        assert!(!remove_result(&mut sections, &make_result("2024-01-03", "Glucose", 0.0)));
        assert!(!remove_result(&mut sections, &make_result("2024-01-02", "Sodium", 0.0)));
        assert_eq!(sections, original);
    }
}
