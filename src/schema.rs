//! Canonical description of the condition record
//!
//! Single source of truth for field bounds, tag vocabularies, and which
//! optional-answer fields are mandatory. The validator and both store
//! clients query this module; it performs no I/O itself.

/// ---------------------------------------------------------------------------
/// Numeric Bounds
/// ---------------------------------------------------------------------------

/// Inclusive range for a numeric field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds<T> {
  pub min: T,
  pub max: T,
}

impl<T: PartialOrd + Copy> Bounds<T> {
  pub fn contains(&self, value: T) -> bool {
    value >= self.min && value <= self.max
  }
}

/// Subjective 0-100 sliders: health, fatigue, sleep quality, appetite,
/// injury severity, training intensity
pub const SCALE: Bounds<i64> = Bounds { min: 0, max: 100 };

/// Sleep duration in decimal hours (7h30m -> 7.5)
pub const SLEEP_TIME: Bounds<f64> = Bounds { min: 0.0, max: 24.0 };

/// Bristol stool scale
pub const BOWEL_SHAPE: Bounds<i64> = Bounds { min: 1, max: 7 };

/// Previous day's running distance in km
pub const RUNNING_DISTANCE: Bounds<f64> = Bounds { min: 0.0, max: 100.0 };

pub const PULSE: Bounds<i64> = Bounds { min: 30, max: 200 };
pub const TEMPERATURE: Bounds<f64> = Bounds { min: 34.0, max: 42.0 };
pub const WEIGHT: Bounds<f64> = Bounds { min: 20.0, max: 150.0 };

/// Previous day's training time in minutes, warm-up/cool-down excluded
pub const EXERCISE_TIME: Bounds<i64> = Bounds { min: 0, max: 300 };

/// Borg CR10 rating of perceived exertion
pub const EXERCISE_RPE: Bounds<i64> = Bounds { min: 0, max: 10 };

/// ---------------------------------------------------------------------------
/// Tag Vocabularies
/// ---------------------------------------------------------------------------

pub const SLEEP_ISSUE_TAGS: &[&str] = &[
  "dreamed",
  "woke_repeatedly",
  "frequent_toilet",
  "night_sweats",
  "hard_to_fall_asleep",
  "none",
];

pub const SYMPTOM_TAGS: &[&str] = &[
  "none",
  "cough",
  "runny_nose",
  "headache",
  "shortness_of_breath",
  "diarrhea",
  "sore_throat",
  "chills",
  "stomach_ache",
  "feverish",
  "malaise",
  "nausea",
  "phlegm",
  "menstruation",
  "irregular_bleeding",
  "medication",
  "other",
];

/// Sentinel symptom that makes `other_symptoms` free text mandatory
pub const OTHER_SYMPTOM: &str = "other";

pub fn is_known_sleep_issue(tag: &str) -> bool {
  SLEEP_ISSUE_TAGS.contains(&tag)
}

pub fn is_known_symptom(tag: &str) -> bool {
  SYMPTOM_TAGS.contains(&tag)
}

/// ---------------------------------------------------------------------------
/// Per-Deployment Requirements
/// ---------------------------------------------------------------------------

/// Which optional-answer fields a deployment treats as mandatory, plus the
/// bounds that have varied across deployments. Data, not code: the validator
/// never hard-codes these.
#[derive(Debug, Clone)]
pub struct RecordSchema {
  pub sleep_issues_required: bool,
  pub symptoms_required: bool,
  pub exercise_time_required: bool,
  pub exercise_rpe_required: bool,
  pub spo2: Bounds<i64>,
}

impl Default for RecordSchema {
  fn default() -> Self {
    Self {
      sleep_issues_required: true,
      symptoms_required: true,
      exercise_time_required: true,
      exercise_rpe_required: true,
      spo2: Bounds { min: 70, max: 100 },
    }
  }
}

/// ---------------------------------------------------------------------------
/// Export Columns
/// ---------------------------------------------------------------------------

/// Column order for the spreadsheet export. Every stored field except the
/// `exported` bookkeeping flag, id first.
pub const EXPORT_COLUMNS: &[&str] = &[
  "id",
  "date",
  "team",
  "name",
  "health",
  "fatigue",
  "sleep_time",
  "sleep_quality",
  "sleep_issues",
  "appetite",
  "injury",
  "injury_part",
  "injury_severity",
  "training_intensity",
  "bowel_movement",
  "bowel_shape",
  "running_distance",
  "spo2",
  "pulse",
  "temperature",
  "weight",
  "symptoms",
  "other_symptoms",
  "exercise_time",
  "exercise_rpe",
];

/// Header row for the export sheet
pub fn export_header() -> Vec<String> {
  EXPORT_COLUMNS.iter().map(|c| c.to_string()).collect()
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_bounds_are_inclusive() {
    assert!(SCALE.contains(0));
    assert!(SCALE.contains(100));
    assert!(!SCALE.contains(-1));
    assert!(!SCALE.contains(101));

    assert!(SLEEP_TIME.contains(0.0));
    assert!(SLEEP_TIME.contains(24.0));
    assert!(!SLEEP_TIME.contains(24.1));

    assert!(BOWEL_SHAPE.contains(1));
    assert!(BOWEL_SHAPE.contains(7));
    assert!(!BOWEL_SHAPE.contains(0));
    assert!(!BOWEL_SHAPE.contains(8));
  }

  #[test]
  fn test_tag_vocabularies_include_sentinels() {
    assert!(is_known_symptom(OTHER_SYMPTOM));
    assert!(is_known_symptom("none"));
    assert!(is_known_sleep_issue("none"));
    assert!(!is_known_symptom("sprained_ankle"));
    assert!(!is_known_sleep_issue("other"));
  }

  #[test]
  fn test_default_schema_requires_all_optional_answers() {
    let schema = RecordSchema::default();
    assert!(schema.sleep_issues_required);
    assert!(schema.symptoms_required);
    assert!(schema.exercise_time_required);
    assert!(schema.exercise_rpe_required);
    assert_eq!(schema.spo2, Bounds { min: 70, max: 100 });
  }

  #[test]
  fn test_export_columns_exclude_bookkeeping() {
    assert!(!EXPORT_COLUMNS.contains(&"exported"));
    assert_eq!(EXPORT_COLUMNS[0], "id");
    assert_eq!(export_header().len(), EXPORT_COLUMNS.len());
  }
}
