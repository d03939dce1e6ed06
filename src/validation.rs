//! Boundary validation for raw condition reports
//!
//! Turns the form layer's loosely-typed field map into a `ConditionReport`,
//! or reports every violated rule at once. Pure: no I/O, no clock.

use crate::models::{BowelMovement, ConditionReport, Injury, RawReport};
use crate::schema::{self, Bounds, RecordSchema};

/// ---------------------------------------------------------------------------
/// Violations
/// ---------------------------------------------------------------------------

/// One unmet requirement, named by the offending field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
  pub field: &'static str,
  pub message: String,
}

impl std::fmt::Display for FieldViolation {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}: {}", self.field, self.message)
  }
}

#[derive(Debug, thiserror::Error)]
#[error("{} field(s) failed validation", .violations.len())]
pub struct ValidationError {
  pub violations: Vec<FieldViolation>,
}

impl ValidationError {
  pub fn cites(&self, field: &str) -> bool {
    self.violations.iter().any(|v| v.field == field)
  }
}

/// ---------------------------------------------------------------------------
/// Conditional Requirements
/// ---------------------------------------------------------------------------

/// A field that is mandatory only when another answer makes it so. Evaluated
/// uniformly from a table so new dependent fields compose without touching a
/// branch chain.
struct ConditionalRule {
  field: &'static str,
  message: &'static str,
  applies: fn(&RawReport) -> bool,
  satisfied: fn(&RawReport) -> bool,
}

fn injury_reported(raw: &RawReport) -> bool {
  raw.injury == Injury::Present
}

fn injury_part_given(raw: &RawReport) -> bool {
  !raw.injury_part.trim().is_empty()
}

fn other_symptom_selected(raw: &RawReport) -> bool {
  raw.symptoms.iter().any(|s| s == schema::OTHER_SYMPTOM)
}

fn other_symptoms_given(raw: &RawReport) -> bool {
  !raw.other_symptoms.trim().is_empty()
}

fn bowel_movement_reported(raw: &RawReport) -> bool {
  raw.bowel_movement == BowelMovement::Yes
}

fn bowel_shape_given(raw: &RawReport) -> bool {
  matches!(raw.bowel_shape, Some(shape) if schema::BOWEL_SHAPE.contains(shape))
}

static CONDITIONAL_RULES: &[ConditionalRule] = &[
  ConditionalRule {
    field: "injury_part",
    message: "required when an injury is present",
    applies: injury_reported,
    satisfied: injury_part_given,
  },
  ConditionalRule {
    field: "other_symptoms",
    message: "required when \"other\" is among the symptoms",
    applies: other_symptom_selected,
    satisfied: other_symptoms_given,
  },
  ConditionalRule {
    field: "bowel_shape",
    message: "a value from 1 to 7 is required when a bowel movement is reported",
    applies: bowel_movement_reported,
    satisfied: bowel_shape_given,
  },
];

/// ---------------------------------------------------------------------------
/// Validation
/// ---------------------------------------------------------------------------

fn violation(field: &'static str, message: impl Into<String>) -> FieldViolation {
  FieldViolation {
    field,
    message: message.into(),
  }
}

fn check_required_i64(
  violations: &mut Vec<FieldViolation>,
  field: &'static str,
  value: Option<i64>,
  bounds: Bounds<i64>,
) {
  match value {
    None => violations.push(violation(field, "an answer is required")),
    Some(v) if !bounds.contains(v) => violations.push(violation(
      field,
      format!("{} is outside {}..={}", v, bounds.min, bounds.max),
    )),
    Some(_) => {}
  }
}

fn check_required_f64(
  violations: &mut Vec<FieldViolation>,
  field: &'static str,
  value: Option<f64>,
  bounds: Bounds<f64>,
) {
  match value {
    None => violations.push(violation(field, "an answer is required")),
    Some(v) if !bounds.contains(v) => violations.push(violation(
      field,
      format!("{} is outside {}..={}", v, bounds.min, bounds.max),
    )),
    Some(_) => {}
  }
}

/// Validate a raw field map against the deployment's schema. All violated
/// rules are reported together, not just the first.
pub fn validate(raw: &RawReport, schema: &RecordSchema) -> Result<ConditionReport, ValidationError> {
  let mut violations = Vec::new();

  // Identity
  if raw.date.is_none() {
    violations.push(violation("date", "an answer is required"));
  }
  if raw.team.trim().is_empty() {
    violations.push(violation("team", "an answer is required"));
  }
  if raw.name.trim().is_empty() {
    violations.push(violation("name", "an answer is required"));
  }

  // Subjective scales
  check_required_i64(&mut violations, "health", raw.health, schema::SCALE);
  check_required_i64(&mut violations, "fatigue", raw.fatigue, schema::SCALE);
  check_required_i64(&mut violations, "sleep_quality", raw.sleep_quality, schema::SCALE);
  check_required_i64(&mut violations, "appetite", raw.appetite, schema::SCALE);
  check_required_i64(&mut violations, "injury_severity", raw.injury_severity, schema::SCALE);
  check_required_i64(
    &mut violations,
    "training_intensity",
    raw.training_intensity,
    schema::SCALE,
  );

  // Sleep and vitals
  check_required_f64(&mut violations, "sleep_time", raw.sleep_time, schema::SLEEP_TIME);
  check_required_f64(
    &mut violations,
    "running_distance",
    raw.running_distance,
    schema::RUNNING_DISTANCE,
  );
  check_required_i64(&mut violations, "spo2", raw.spo2, schema.spo2);
  check_required_i64(&mut violations, "pulse", raw.pulse, schema::PULSE);
  check_required_f64(&mut violations, "temperature", raw.temperature, schema::TEMPERATURE);
  check_required_f64(&mut violations, "weight", raw.weight, schema::WEIGHT);

  // Tag sets: membership always, non-emptiness per deployment
  for tag in &raw.sleep_issues {
    if !schema::is_known_sleep_issue(tag) {
      violations.push(violation("sleep_issues", format!("unknown tag \"{}\"", tag)));
    }
  }
  if schema.sleep_issues_required && raw.sleep_issues.is_empty() {
    violations.push(violation("sleep_issues", "at least one selection is required"));
  }
  for tag in &raw.symptoms {
    if !schema::is_known_symptom(tag) {
      violations.push(violation("symptoms", format!("unknown tag \"{}\"", tag)));
    }
  }
  if schema.symptoms_required && raw.symptoms.is_empty() {
    violations.push(violation("symptoms", "at least one selection is required"));
  }

  // Conditional requirements
  for rule in CONDITIONAL_RULES {
    if (rule.applies)(raw) && !(rule.satisfied)(raw) {
      violations.push(violation(rule.field, rule.message));
    }
  }

  // Select-style training answers
  match raw.exercise_time {
    None if schema.exercise_time_required => {
      violations.push(violation("exercise_time", "an answer is required"))
    }
    Some(t) if !schema::EXERCISE_TIME.contains(t) => violations.push(violation(
      "exercise_time",
      format!("{} is outside {}..={}", t, schema::EXERCISE_TIME.min, schema::EXERCISE_TIME.max),
    )),
    _ => {}
  }
  match raw.exercise_rpe {
    None if schema.exercise_rpe_required => {
      violations.push(violation("exercise_rpe", "an answer is required"))
    }
    Some(r) if !schema::EXERCISE_RPE.contains(r) => violations.push(violation(
      "exercise_rpe",
      format!("{} is outside {}..={}", r, schema::EXERCISE_RPE.min, schema::EXERCISE_RPE.max),
    )),
    _ => {}
  }

  let Some(date) = raw.date else {
    return Err(ValidationError { violations });
  };
  if !violations.is_empty() {
    return Err(ValidationError { violations });
  }

  // Normalize conditional fields: answers whose precondition does not hold
  // are dropped, whatever the form sent.
  Ok(ConditionReport {
    date,
    team: raw.team.trim().to_string(),
    name: raw.name.trim().to_string(),
    health: raw.health.unwrap_or_default(),
    fatigue: raw.fatigue.unwrap_or_default(),
    sleep_time: raw.sleep_time.unwrap_or_default(),
    sleep_quality: raw.sleep_quality.unwrap_or_default(),
    sleep_issues: raw.sleep_issues.clone(),
    appetite: raw.appetite.unwrap_or_default(),
    injury: raw.injury,
    injury_part: if raw.injury == Injury::Present {
      raw.injury_part.trim().to_string()
    } else {
      String::new()
    },
    injury_severity: raw.injury_severity.unwrap_or_default(),
    training_intensity: raw.training_intensity.unwrap_or_default(),
    bowel_movement: raw.bowel_movement,
    bowel_shape: if raw.bowel_movement == BowelMovement::Yes {
      raw.bowel_shape
    } else {
      None
    },
    running_distance: raw.running_distance.unwrap_or_default(),
    spo2: raw.spo2.unwrap_or_default(),
    pulse: raw.pulse.unwrap_or_default(),
    temperature: raw.temperature.unwrap_or_default(),
    weight: raw.weight.unwrap_or_default(),
    symptoms: raw.symptoms.clone(),
    other_symptoms: if other_symptom_selected(raw) {
      raw.other_symptoms.trim().to_string()
    } else {
      String::new()
    },
    exercise_time: raw.exercise_time,
    exercise_rpe: raw.exercise_rpe,
  })
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
