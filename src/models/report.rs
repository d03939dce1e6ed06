use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// ---------------------------------------------------------------------------
/// Enumerated Answers
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Injury {
  #[default]
  None,
  Present,
}

impl std::fmt::Display for Injury {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::None => write!(f, "none"),
      Self::Present => write!(f, "present"),
    }
  }
}

impl std::str::FromStr for Injury {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "none" => Ok(Self::None),
      "present" => Ok(Self::Present),
      _ => Err(format!("Unknown injury answer: {}", s)),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BowelMovement {
  Yes,
  #[default]
  No,
}

impl std::fmt::Display for BowelMovement {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Yes => write!(f, "yes"),
      Self::No => write!(f, "no"),
    }
  }
}

impl std::str::FromStr for BowelMovement {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "yes" => Ok(Self::Yes),
      "no" => Ok(Self::No),
      _ => Err(format!("Unknown bowel movement answer: {}", s)),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Raw Input
/// ---------------------------------------------------------------------------

/// The field map handed over by the form layer, before validation. Numeric
/// answers stay optional and text answers unstripped until `validate` has
/// looked at them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawReport {
  pub date: Option<NaiveDate>,
  #[serde(default)]
  pub team: String,
  #[serde(default)]
  pub name: String,
  pub health: Option<i64>,
  pub fatigue: Option<i64>,
  pub sleep_time: Option<f64>,
  pub sleep_quality: Option<i64>,
  #[serde(default)]
  pub sleep_issues: Vec<String>,
  pub appetite: Option<i64>,
  #[serde(default)]
  pub injury: Injury,
  #[serde(default)]
  pub injury_part: String,
  pub injury_severity: Option<i64>,
  pub training_intensity: Option<i64>,
  #[serde(default)]
  pub bowel_movement: BowelMovement,
  pub bowel_shape: Option<i64>,
  pub running_distance: Option<f64>,
  pub spo2: Option<i64>,
  pub pulse: Option<i64>,
  pub temperature: Option<f64>,
  pub weight: Option<f64>,
  #[serde(default)]
  pub symptoms: Vec<String>,
  #[serde(default)]
  pub other_symptoms: String,
  pub exercise_time: Option<i64>,
  pub exercise_rpe: Option<i64>,
}

/// ---------------------------------------------------------------------------
/// Validated Report
/// ---------------------------------------------------------------------------

/// One respondent's validated daily report, before the store has assigned
/// an id. Conditional fields are normalized: `injury_part` is empty unless
/// an injury is present, `bowel_shape` is set only when there was a bowel
/// movement, `other_symptoms` only when "other" was selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionReport {
  pub date: NaiveDate,
  pub team: String,
  pub name: String,
  pub health: i64,
  pub fatigue: i64,
  pub sleep_time: f64,
  pub sleep_quality: i64,
  pub sleep_issues: Vec<String>,
  pub appetite: i64,
  pub injury: Injury,
  pub injury_part: String,
  pub injury_severity: i64,
  pub training_intensity: i64,
  pub bowel_movement: BowelMovement,
  pub bowel_shape: Option<i64>,
  pub running_distance: f64,
  pub spo2: i64,
  pub pulse: i64,
  pub temperature: f64,
  pub weight: f64,
  pub symptoms: Vec<String>,
  pub other_symptoms: String,
  pub exercise_time: Option<i64>,
  pub exercise_rpe: Option<i64>,
}

/// ---------------------------------------------------------------------------
/// Stored Row
/// ---------------------------------------------------------------------------

/// A condition row as the primary store returns it. `id` is assigned on
/// insert and immutable; `exported` starts false and is flipped exactly once
/// by the reconciler. Tag sets travel as comma-joined strings on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredConditionRecord {
  pub id: i64,
  pub date: NaiveDate,
  pub team: String,
  pub name: String,
  pub health: i64,
  pub fatigue: i64,
  pub sleep_time: f64,
  pub sleep_quality: i64,
  pub sleep_issues: String,
  pub appetite: i64,
  pub injury: Injury,
  pub injury_part: String,
  pub injury_severity: i64,
  pub training_intensity: i64,
  pub bowel_movement: BowelMovement,
  pub bowel_shape: Option<i64>,
  pub running_distance: f64,
  pub spo2: i64,
  pub pulse: i64,
  pub temperature: f64,
  pub weight: f64,
  pub symptoms: String,
  pub other_symptoms: String,
  pub exercise_time: Option<i64>,
  pub exercise_rpe: Option<i64>,
  pub exported: bool,
}

impl StoredConditionRecord {
  /// Render this record as one spreadsheet row, cell order matching
  /// `schema::EXPORT_COLUMNS`. Absent answers become empty cells.
  pub fn sheet_cells(&self) -> Vec<String> {
    vec![
      self.id.to_string(),
      self.date.to_string(),
      self.team.clone(),
      self.name.clone(),
      self.health.to_string(),
      self.fatigue.to_string(),
      self.sleep_time.to_string(),
      self.sleep_quality.to_string(),
      self.sleep_issues.clone(),
      self.appetite.to_string(),
      self.injury.to_string(),
      self.injury_part.clone(),
      self.injury_severity.to_string(),
      self.training_intensity.to_string(),
      self.bowel_movement.to_string(),
      self.bowel_shape.map(|s| s.to_string()).unwrap_or_default(),
      self.running_distance.to_string(),
      self.spo2.to_string(),
      self.pulse.to_string(),
      self.temperature.to_string(),
      self.weight.to_string(),
      self.symptoms.clone(),
      self.other_symptoms.clone(),
      self.exercise_time.map(|t| t.to_string()).unwrap_or_default(),
      self.exercise_rpe.map(|r| r.to_string()).unwrap_or_default(),
    ]
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
