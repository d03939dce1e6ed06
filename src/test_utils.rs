//! Test utilities and helpers for integration and unit testing
//!
//! This module provides common test infrastructure including:
//! - Mock data factories
//! - Mock-server config builders
//! - A recording sleeper for retry tests

use std::cell::RefCell;
use std::time::Duration;

use chrono::NaiveDate;

use crate::delivery::Sleeper;
use crate::models::{BowelMovement, ConditionReport, Injury, RawReport, StoredConditionRecord};
use crate::schema::RecordSchema;
use crate::sheets::SheetsConfig;
use crate::validation;

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

/// A raw field map that passes the default schema
pub fn valid_raw_report() -> RawReport {
  RawReport {
    date: NaiveDate::from_ymd_opt(2025, 6, 1),
    team: "A".to_string(),
    name: "B".to_string(),
    health: Some(70),
    fatigue: Some(40),
    sleep_time: Some(7.5),
    sleep_quality: Some(60),
    sleep_issues: vec!["none".to_string()],
    appetite: Some(80),
    injury: Injury::None,
    injury_part: String::new(),
    injury_severity: Some(100),
    training_intensity: Some(50),
    bowel_movement: BowelMovement::Yes,
    bowel_shape: Some(4),
    running_distance: Some(12.0),
    spo2: Some(97),
    pulse: Some(52),
    temperature: Some(36.4),
    weight: Some(61.5),
    symptoms: vec!["none".to_string()],
    other_symptoms: String::new(),
    exercise_time: Some(90),
    exercise_rpe: Some(4),
  }
}

/// The validated form of `valid_raw_report`
pub fn valid_condition_report() -> ConditionReport {
  validation::validate(&valid_raw_report(), &RecordSchema::default())
    .expect("factory fixture must validate")
}

/// A row as the primary store would return it, not yet exported
pub fn stored_record(id: i64) -> StoredConditionRecord {
  let report = valid_condition_report();
  StoredConditionRecord {
    id,
    date: report.date,
    team: report.team,
    name: report.name,
    health: report.health,
    fatigue: report.fatigue,
    sleep_time: report.sleep_time,
    sleep_quality: report.sleep_quality,
    sleep_issues: report.sleep_issues.join(", "),
    appetite: report.appetite,
    injury: report.injury,
    injury_part: report.injury_part,
    injury_severity: report.injury_severity,
    training_intensity: report.training_intensity,
    bowel_movement: report.bowel_movement,
    bowel_shape: report.bowel_shape,
    running_distance: report.running_distance,
    spo2: report.spo2,
    pulse: report.pulse,
    temperature: report.temperature,
    weight: report.weight,
    symptoms: report.symptoms.join(", "),
    other_symptoms: report.other_symptoms,
    exercise_time: report.exercise_time,
    exercise_rpe: report.exercise_rpe,
    exported: false,
  }
}

/// The same row as raw JSON, for mock response bodies
pub fn stored_record_json(id: i64) -> serde_json::Value {
  serde_json::to_value(stored_record(id)).expect("stored record serializes")
}

/// ---------------------------------------------------------------------------
/// Mock Server Configs
/// ---------------------------------------------------------------------------

/// Sheets config pointing every endpoint at a local mock server
pub fn sheets_test_config(server: &mockito::Server) -> SheetsConfig {
  SheetsConfig {
    client_id: "client".to_string(),
    client_secret: "secret".to_string(),
    refresh_token: "refresh".to_string(),
    spreadsheet_id: "sheet-1".to_string(),
    sheet_name: "condition".to_string(),
    token_url: format!("{}/token", server.url()),
    api_base: format!("{}/sheets", server.url()),
  }
}

/// ---------------------------------------------------------------------------
/// Recording Sleeper
/// ---------------------------------------------------------------------------

/// Records requested backoff delays instead of waiting them out
#[derive(Default)]
pub struct RecordingSleeper {
  pub delays: RefCell<Vec<Duration>>,
}

impl Sleeper for RecordingSleeper {
  async fn sleep(&self, duration: Duration) {
    self.delays.borrow_mut().push(duration);
  }
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_raw_fixture_validates() {
    let report = valid_condition_report();
    assert_eq!(report.team, "A");
    assert_eq!(report.bowel_shape, Some(4));
  }

  #[test]
  fn test_stored_record_round_trips_through_json() {
    let json = stored_record_json(11);
    let parsed: StoredConditionRecord = serde_json::from_value(json).unwrap();
    assert_eq!(parsed, stored_record(11));
    assert!(!parsed.exported);
  }
}
