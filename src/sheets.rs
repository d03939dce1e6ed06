//! Google Sheets client for the condition export sheet
//!
//! The secondary store. Short-lived access tokens are minted from a
//! long-lived refresh token; provisioning that refresh token (consent flow
//! or service account) happens outside this system. The sheet gets one
//! header row ever, and data rows are appended in batch, never upserted.

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration as StdDuration;

/// ---------------------------------------------------------------------------
/// Configuration Constants
/// ---------------------------------------------------------------------------

const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const TOKEN_REFRESH_BUFFER_MINUTES: i64 = 5;
const REQUEST_TIMEOUT_SECONDS: u64 = 10;

#[derive(Debug, Clone)]
pub struct SheetsConfig {
  pub client_id: String,
  pub client_secret: String,
  pub refresh_token: String,
  pub spreadsheet_id: String,
  pub sheet_name: String,
  /// Overridable endpoints so tests can point at a local server
  pub token_url: String,
  pub api_base: String,
}

impl SheetsConfig {
  pub fn from_env() -> Result<Self, SheetsError> {
    Ok(Self {
      client_id: env::var("GOOGLE_CLIENT_ID")
        .map_err(|_| SheetsError::MissingConfig("GOOGLE_CLIENT_ID".into()))?,
      client_secret: env::var("GOOGLE_CLIENT_SECRET")
        .map_err(|_| SheetsError::MissingConfig("GOOGLE_CLIENT_SECRET".into()))?,
      refresh_token: env::var("GOOGLE_REFRESH_TOKEN")
        .map_err(|_| SheetsError::MissingConfig("GOOGLE_REFRESH_TOKEN".into()))?,
      spreadsheet_id: env::var("SPREADSHEET_ID")
        .map_err(|_| SheetsError::MissingConfig("SPREADSHEET_ID".into()))?,
      sheet_name: env::var("SHEET_NAME")
        .map_err(|_| SheetsError::MissingConfig("SHEET_NAME".into()))?,
      token_url: GOOGLE_TOKEN_URL.to_string(),
      api_base: SHEETS_API_BASE.to_string(),
    })
  }
}

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SheetsError {
  #[error("Missing configuration: {0}")]
  MissingConfig(String),

  #[error("HTTP request failed: {0}")]
  Request(#[from] reqwest::Error),

  #[error("OAuth error: {0}")]
  OAuth(String),

  #[error("API error: {0}")]
  Api(String),
}

/// ---------------------------------------------------------------------------
/// Access Tokens
/// ---------------------------------------------------------------------------

/// Response from the Google token endpoint (refresh grant carries no new
/// refresh token)
#[allow(dead_code)]
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
  pub access_token: String,
  pub expires_in: i64, // seconds
  pub token_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetsTokens {
  pub access_token: String,
  pub expires_at: DateTime<Utc>,
}

impl SheetsTokens {
  pub fn from_response(resp: TokenResponse) -> Self {
    Self {
      access_token: resp.access_token,
      expires_at: Utc::now() + Duration::seconds(resp.expires_in),
    }
  }

  pub fn needs_refresh(&self) -> bool {
    let buffer = Duration::minutes(TOKEN_REFRESH_BUFFER_MINUTES);
    Utc::now() + buffer >= self.expires_at
  }
}

fn http_client() -> Result<Client, SheetsError> {
  Ok(
    Client::builder()
      .timeout(StdDuration::from_secs(REQUEST_TIMEOUT_SECONDS))
      .build()?,
  )
}

/// Mint an access token from the configured refresh token
pub async fn fetch_access_token(config: &SheetsConfig) -> Result<SheetsTokens, SheetsError> {
  let client = http_client()?;

  let response = client
    .post(&config.token_url)
    .form(&[
      ("client_id", config.client_id.as_str()),
      ("client_secret", config.client_secret.as_str()),
      ("refresh_token", config.refresh_token.as_str()),
      ("grant_type", "refresh_token"),
    ])
    .send()
    .await?;

  if !response.status().is_success() {
    let error_text = response.text().await.unwrap_or_default();
    return Err(SheetsError::OAuth(format!("Token refresh failed: {}", error_text)));
  }

  let token_response: TokenResponse = response.json().await?;
  Ok(SheetsTokens::from_response(token_response))
}

/// ---------------------------------------------------------------------------
/// Sheet Values
/// ---------------------------------------------------------------------------

/// Value range returned by a read; `values` is absent entirely when the
/// requested range is empty
#[derive(Debug, Deserialize)]
struct ValueRange {
  #[serde(default)]
  values: Vec<Vec<String>>,
}

/// Does the sheet already have a header row?
pub async fn header_present(config: &SheetsConfig, access_token: &str) -> Result<bool, SheetsError> {
  let client = http_client()?;

  let url = format!(
    "{}/{}/values/{}!1:1",
    config.api_base, config.spreadsheet_id, config.sheet_name
  );

  let response = client
    .get(&url)
    .header("Authorization", format!("Bearer {}", access_token))
    .send()
    .await?;

  if !response.status().is_success() {
    let error_text = response.text().await.unwrap_or_default();
    return Err(SheetsError::Api(format!("Failed to read header row: {}", error_text)));
  }

  let range: ValueRange = response.json().await?;
  Ok(!range.values.is_empty())
}

/// Append rows after the sheet's current contents, preserving the given
/// order. RAW input: cells land exactly as rendered, no formula parsing.
pub async fn append_rows(
  config: &SheetsConfig,
  access_token: &str,
  rows: &[Vec<String>],
) -> Result<(), SheetsError> {
  if rows.is_empty() {
    return Ok(());
  }

  let client = http_client()?;

  let url = format!(
    "{}/{}/values/{}!A1:append?valueInputOption=RAW",
    config.api_base, config.spreadsheet_id, config.sheet_name
  );

  let response = client
    .post(&url)
    .header("Authorization", format!("Bearer {}", access_token))
    .json(&serde_json::json!({ "values": rows }))
    .send()
    .await?;

  if !response.status().is_success() {
    let error_text = response.text().await.unwrap_or_default();
    return Err(SheetsError::Api(format!("Failed to append rows: {}", error_text)));
  }

  Ok(())
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
