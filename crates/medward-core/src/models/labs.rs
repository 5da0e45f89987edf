//! Lab result models: the permanent per-patient record and the bed-snapshot
//! mirror (sections of display-formatted metrics).

use std::fmt;

use serde::{Deserialize, Serialize};

/// How a lab result is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    /// Numeric value with an optional unit
    Quantitative,
    /// Free-text value
    Qualitative,
}

impl ResultKind {
    /// Canonical string form, also used as the storage encoding.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultKind::Quantitative => "quantitative",
            ResultKind::Qualitative => "qualitative",
        }
    }
}

/// A permanent lab result, scoped to a patient and independent of bed
/// occupancy. Exactly one of `value` / `text_value` is meaningful, selected
/// by `kind`; parse degradation (see the synchronizer) may store text under
/// a `Quantitative` kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabResult {
    /// Unique result ID
    pub id: String,
    /// Calendar date of the result (YYYY-MM-DD)
    pub date: String,
    /// Test name (e.g., "Glucose")
    pub test_name: String,
    /// Category (e.g., "Biochemistry")
    pub category: Option<String>,
    /// Result kind
    pub kind: ResultKind,
    /// Numeric value (quantitative)
    pub value: Option<f64>,
    /// Text value (qualitative, or degraded quantitative)
    pub text_value: Option<String>,
    /// Unit for the numeric value
    pub unit: Option<String>,
    /// Abnormal flag
    pub is_abnormal: bool,
    /// Attached file name, if any (storage handled elsewhere)
    pub file_name: Option<String>,
    /// Attached file URL, if any
    pub file_url: Option<String>,
    /// Creation timestamp
    pub created_at: String,
}

impl LabResult {
    /// Create a new result with required fields.
    pub fn new(date: String, test_name: String, kind: ResultKind) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            date,
            test_name,
            category: None,
            kind,
            value: None,
            text_value: None,
            unit: None,
            is_abnormal: false,
            file_name: None,
            file_url: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Display text for this result: `"{value} {unit}"` trimmed when a
    /// numeric value is present, the text value verbatim otherwise, and
    /// `"No result"` when neither is set.
    pub fn display_value(&self) -> String {
        if let Some(value) = self.value {
            format!("{} {}", value, self.unit.as_deref().unwrap_or(""))
                .trim()
                .to_string()
        } else if let Some(text) = self.text_value.as_deref().filter(|t| !t.trim().is_empty()) {
            text.to_string()
        } else {
            "No result".to_string()
        }
    }

    /// The dedup key of this result.
    pub fn key(&self) -> LabKey {
        LabKey::new(&self.test_name, &self.date)
    }
}

/// One metric inside a bed-snapshot lab section. Values are pre-formatted
/// display text; reference ranges are not part of the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabMetric {
    /// Test name
    pub name: String,
    /// Formatted display value
    pub value: String,
    /// Result kind
    pub kind: ResultKind,
    /// Category carried over from the source result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Abnormal flag
    #[serde(default)]
    pub is_abnormal: bool,
}

impl LabMetric {
    /// Build the snapshot mirror of a permanent result.
    pub fn from_result(result: &LabResult) -> Self {
        Self {
            name: result.test_name.clone(),
            value: result.display_value(),
            kind: result.kind,
            category: result.category.clone(),
            is_abnormal: result.is_abnormal,
        }
    }
}

/// A date-grouped section of snapshot metrics. Sections with the same date
/// are coalesced, never duplicated; the newest section comes first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabSection {
    /// Section title
    pub title: String,
    /// Calendar date shared by all metrics in the section (YYYY-MM-DD)
    pub date: String,
    /// Ordered metrics
    pub metrics: Vec<LabMetric>,
}

/// Structured dedup key for snapshot↔record reconciliation: lowercased and
/// trimmed test name plus calendar date.
///
/// `Display` renders the documented wire format
/// `"{testNameLowercaseTrimmed}|{date}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LabKey {
    test_name: String,
    date: String,
}

impl LabKey {
    /// Build a key, normalizing the test name.
    pub fn new(test_name: &str, date: &str) -> Self {
        Self {
            test_name: test_name.trim().to_lowercase(),
            date: date.to_string(),
        }
    }

    /// Whether `name` normalizes to this key's test name.
    pub fn matches_name(&self, name: &str) -> bool {
        self.test_name == name.trim().to_lowercase()
    }
}

impl fmt::Display for LabKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.test_name, self.date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_value_quantitative() {
        let mut result = LabResult::new(
            "2024-01-01".into(),
            "Glucose".into(),
            ResultKind::Quantitative,
        );
        result.value = Some(100.0);
        result.unit = Some("mg/dL".into());
        assert_eq!(result.display_value(), "100 mg/dL");
    }

    #[test]
    fn test_display_value_trims_missing_unit() {
        let mut result = LabResult::new(
            "2024-01-01".into(),
            "Glucose".into(),
            ResultKind::Quantitative,
        );
        result.value = Some(7.5);
        assert_eq!(result.display_value(), "7.5");
    }

    #[test]
    fn test_display_value_qualitative() {
        let mut result = LabResult::new(
            "2024-01-01".into(),
            "Urine culture".into(),
            ResultKind::Qualitative,
        );
        result.text_value = Some("Negative".into());
        assert_eq!(result.display_value(), "Negative");
    }

    #[test]
    fn test_display_value_empty() {
        let result = LabResult::new(
            "2024-01-01".into(),
            "Glucose".into(),
            ResultKind::Quantitative,
        );
        assert_eq!(result.display_value(), "No result");
    }

    #[test]
    fn test_lab_key_normalizes() {
        let key = LabKey::new("  Glucose ", "2024-01-01");
        assert_eq!(key.to_string(), "glucose|2024-01-01");
        assert_eq!(key, LabKey::new("GLUCOSE", "2024-01-01"));
        assert!(key.matches_name("gLuCoSe "));
        assert!(!key.matches_name("glucagon"));
    }

    #[test]
    fn test_metric_from_result_carries_flags() {
        let mut result = LabResult::new(
            "2024-01-01".into(),
            "Hemoglobin".into(),
            ResultKind::Quantitative,
        );
        result.value = Some(9.2);
        result.unit = Some("g/dL".into());
        result.category = Some("Hematology".into());
        result.is_abnormal = true;

        let metric = LabMetric::from_result(&result);
        assert_eq!(metric.name, "Hemoglobin");
        assert_eq!(metric.value, "9.2 g/dL");
        assert_eq!(metric.category, Some("Hematology".into()));
        assert!(metric.is_abnormal);
    }
}
