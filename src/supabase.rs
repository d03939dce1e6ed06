//! Supabase REST client for the condition table
//!
//! The primary store. One table, three operations: insert a new report row,
//! fetch rows not yet exported, flip a row's exported flag.

use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use url::Url;

use crate::models::{BowelMovement, ConditionReport, Injury, StoredConditionRecord};

/// ---------------------------------------------------------------------------
/// Configuration Constants
/// ---------------------------------------------------------------------------

const DEFAULT_TABLE: &str = "condition";
const REQUEST_TIMEOUT_SECONDS: u64 = 10;

#[derive(Debug, Clone)]
pub struct SupabaseConfig {
  pub url: String,
  pub key: String,
  pub table: String,
}

impl SupabaseConfig {
  pub fn from_env() -> Result<Self, SupabaseError> {
    Ok(Self {
      url: env::var("SUPABASE_URL")
        .map_err(|_| SupabaseError::MissingConfig("SUPABASE_URL".into()))?,
      key: env::var("SUPABASE_KEY")
        .map_err(|_| SupabaseError::MissingConfig("SUPABASE_KEY".into()))?,
      table: env::var("CONDITION_TABLE").unwrap_or_else(|_| DEFAULT_TABLE.to_string()),
    })
  }

  fn table_url(&self) -> Result<Url, SupabaseError> {
    Url::parse(&format!("{}/rest/v1/{}", self.url, self.table))
      .map_err(|e| SupabaseError::Api(format!("Bad store URL: {}", e)))
  }
}

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SupabaseError {
  #[error("Missing configuration: {0}")]
  MissingConfig(String),

  #[error("HTTP request failed: {0}")]
  Request(#[from] reqwest::Error),

  #[error("Store rejected the request: {0} {1}")]
  Rejected(reqwest::StatusCode, String),

  #[error("API error: {0}")]
  Api(String),
}

/// ---------------------------------------------------------------------------
/// Wire Format
/// ---------------------------------------------------------------------------

/// Insert payload for the condition table. Tag sets are flattened to the
/// comma-joined strings the table stores.
#[derive(Debug, Clone, Serialize)]
pub struct ConditionRow {
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

impl ConditionRow {
  /// New rows always land unexported; only the reconciler flips the flag.
  pub fn from_report(report: &ConditionReport) -> Self {
    Self {
      date: report.date,
      team: report.team.clone(),
      name: report.name.clone(),
      health: report.health,
      fatigue: report.fatigue,
      sleep_time: report.sleep_time,
      sleep_quality: report.sleep_quality,
      sleep_issues: report.sleep_issues.join(", "),
      appetite: report.appetite,
      injury: report.injury,
      injury_part: report.injury_part.clone(),
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
      other_symptoms: report.other_symptoms.clone(),
      exercise_time: report.exercise_time,
      exercise_rpe: report.exercise_rpe,
      exported: false,
    }
  }
}

fn http_client() -> Result<Client, SupabaseError> {
  Ok(
    Client::builder()
      .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECONDS))
      .build()?,
  )
}

/// ---------------------------------------------------------------------------
/// Insert
/// ---------------------------------------------------------------------------

/// Row shape of a `return=representation` insert response
#[derive(Debug, Deserialize)]
struct InsertedRow {
  id: i64,
}

/// Insert one row; 201 plus the representation carrying the new id is the
/// only success.
pub async fn insert_condition(
  config: &SupabaseConfig,
  row: &ConditionRow,
) -> Result<i64, SupabaseError> {
  let client = http_client()?;

  let response = client
    .post(config.table_url()?)
    .header("apikey", &config.key)
    .header("Authorization", format!("Bearer {}", config.key))
    .header("Prefer", "return=representation")
    .json(row)
    .send()
    .await?;

  if response.status() != reqwest::StatusCode::CREATED {
    let status = response.status();
    let error_text = response.text().await.unwrap_or_default();
    return Err(SupabaseError::Rejected(status, error_text));
  }

  let rows: Vec<InsertedRow> = response.json().await?;
  rows
    .first()
    .map(|r| r.id)
    .ok_or_else(|| SupabaseError::Api("Insert returned no representation".into()))
}

/// ---------------------------------------------------------------------------
/// Query Unexported
/// ---------------------------------------------------------------------------

/// Fetch every row with `exported = false`, in the order the store returns
/// them. The reconciler appends to the sheet in exactly this order.
pub async fn fetch_unexported(
  config: &SupabaseConfig,
) -> Result<Vec<StoredConditionRecord>, SupabaseError> {
  let client = http_client()?;

  let mut url = config.table_url()?;
  url
    .query_pairs_mut()
    .append_pair("exported", "eq.false")
    .append_pair("select", "*");

  let response = client
    .get(url)
    .header("apikey", &config.key)
    .header("Authorization", format!("Bearer {}", config.key))
    .send()
    .await?;

  if !response.status().is_success() {
    let status = response.status();
    let error_text = response.text().await.unwrap_or_default();
    return Err(SupabaseError::Rejected(status, error_text));
  }

  let response_text = response.text().await?;
  serde_json::from_str(&response_text)
    .map_err(|e| SupabaseError::Api(format!("Failed to parse rows: {}", e)))
}

/// ---------------------------------------------------------------------------
/// Mark Exported
/// ---------------------------------------------------------------------------

/// Flip one row's exported flag. Called once per row, never as a batch, so a
/// crash mid-reconciliation leaves a precise boundary.
pub async fn mark_exported(config: &SupabaseConfig, id: i64) -> Result<(), SupabaseError> {
  let client = http_client()?;

  let mut url = config.table_url()?;
  url
    .query_pairs_mut()
    .append_pair("id", &format!("eq.{}", id));

  let response = client
    .patch(url)
    .header("apikey", &config.key)
    .header("Authorization", format!("Bearer {}", config.key))
    .json(&serde_json::json!({ "exported": true }))
    .send()
    .await?;

  if !response.status().is_success() {
    let status = response.status();
    let error_text = response.text().await.unwrap_or_default();
    return Err(SupabaseError::Rejected(status, error_text));
  }

  Ok(())
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::{stored_record_json, valid_condition_report};
  use mockito::Matcher;
  use serial_test::serial;

  fn test_config(server: &mockito::Server) -> SupabaseConfig {
    SupabaseConfig {
      url: server.url(),
      key: "test-key".to_string(),
      table: "condition".to_string(),
    }
  }

  #[test]
  #[serial]
  fn test_config_from_env() {
    temp_env::with_vars(
      [
        ("SUPABASE_URL", Some("https://example.supabase.co")),
        ("SUPABASE_KEY", Some("secret")),
        ("CONDITION_TABLE", None),
      ],
      || {
        let config = SupabaseConfig::from_env().unwrap();
        assert_eq!(config.url, "https://example.supabase.co");
        assert_eq!(config.table, DEFAULT_TABLE);
      },
    );
  }

  #[test]
  #[serial]
  fn test_config_from_env_reports_missing_key() {
    temp_env::with_vars(
      [
        ("SUPABASE_URL", Some("https://example.supabase.co")),
        ("SUPABASE_KEY", None),
      ],
      || {
        let err = SupabaseConfig::from_env().unwrap_err();
        assert!(matches!(err, SupabaseError::MissingConfig(ref name) if name == "SUPABASE_KEY"));
      },
    );
  }

  #[test]
  fn test_condition_row_stamps_unexported_and_joins_tags() {
    let report = valid_condition_report();
    let row = ConditionRow::from_report(&report);
    assert!(!row.exported);
    assert_eq!(row.sleep_issues, report.sleep_issues.join(", "));
    assert_eq!(row.symptoms, report.symptoms.join(", "));
  }

  #[tokio::test]
  async fn test_insert_returns_assigned_id() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("POST", "/rest/v1/condition")
      .match_header("apikey", "test-key")
      .match_header("authorization", "Bearer test-key")
      .match_header("prefer", "return=representation")
      .with_status(201)
      .with_body(r#"[{"id": 17}]"#)
      .create_async()
      .await;

    let config = test_config(&server);
    let row = ConditionRow::from_report(&valid_condition_report());
    let id = insert_condition(&config, &row).await.unwrap();

    assert_eq!(id, 17);
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_insert_rejects_non_201() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("POST", "/rest/v1/condition")
      .with_status(200)
      .with_body("[]")
      .create_async()
      .await;

    let config = test_config(&server);
    let row = ConditionRow::from_report(&valid_condition_report());
    let err = insert_condition(&config, &row).await.unwrap_err();

    assert!(matches!(err, SupabaseError::Rejected(status, _) if status == 200));
  }

  #[tokio::test]
  async fn test_fetch_unexported_preserves_order() {
    let mut server = mockito::Server::new_async().await;
    let body = serde_json::json!([
      stored_record_json(3),
      stored_record_json(1),
      stored_record_json(2),
    ]);
    server
      .mock("GET", "/rest/v1/condition")
      .match_query(Matcher::AllOf(vec![
        Matcher::UrlEncoded("exported".into(), "eq.false".into()),
        Matcher::UrlEncoded("select".into(), "*".into()),
      ]))
      .with_status(200)
      .with_body(body.to_string())
      .create_async()
      .await;

    let config = test_config(&server);
    let records = fetch_unexported(&config).await.unwrap();

    let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![3, 1, 2]);
    assert!(records.iter().all(|r| !r.exported));
  }

  #[tokio::test]
  async fn test_mark_exported_patches_one_id() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("PATCH", "/rest/v1/condition")
      .match_query(Matcher::UrlEncoded("id".into(), "eq.9".into()))
      .match_body(Matcher::JsonString(r#"{"exported": true}"#.to_string()))
      .with_status(204)
      .create_async()
      .await;

    let config = test_config(&server);
    mark_exported(&config, 9).await.unwrap();
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_mark_exported_surfaces_rejection() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("PATCH", "/rest/v1/condition")
      .match_query(Matcher::UrlEncoded("id".into(), "eq.9".into()))
      .with_status(500)
      .with_body("boom")
      .create_async()
      .await;

    let config = test_config(&server);
    let err = mark_exported(&config, 9).await.unwrap_err();
    assert!(matches!(err, SupabaseError::Rejected(status, _) if status == 500));
  }
}
