//! Submission pipeline: validated report to primary store, with retry
//!
//! One network call per attempt, linear backoff between attempts, last error
//! surfaced after exhaustion. Not idempotent: a retry after a success whose
//! acknowledgment was lost can create a duplicate row. An idempotency key
//! would close that window; the stores in use do not accept one.

use std::future::Future;
use std::time::Duration;

use crate::models::{ConditionReport, SubmissionSession};
use crate::supabase::{self, ConditionRow, SupabaseConfig, SupabaseError};

/// ---------------------------------------------------------------------------
/// Retry Policy
/// ---------------------------------------------------------------------------

const MAX_ATTEMPTS: u32 = 3;
const BASE_BACKOFF_MS: u64 = 1000;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
  pub max_attempts: u32,
  pub base_delay: Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      max_attempts: MAX_ATTEMPTS,
      base_delay: Duration::from_millis(BASE_BACKOFF_MS),
    }
  }
}

impl RetryPolicy {
  /// Linear backoff: base, 2x base, 3x base, ...
  pub fn delay_for(&self, attempt: u32) -> Duration {
    self.base_delay * attempt
  }
}

/// Injected sleep so tests never wait on real time
pub trait Sleeper {
  fn sleep(&self, duration: Duration) -> impl Future<Output = ()>;
}

pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
  async fn sleep(&self, duration: Duration) {
    tokio::time::sleep(duration).await;
  }
}

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
  #[error("This session already submitted a report")]
  AlreadySubmitted,

  #[error("Request timed out")]
  Timeout,

  #[error("HTTP request failed: {0}")]
  Request(String),

  #[error("Store rejected the report: {0}")]
  Rejected(String),

  #[error("Missing configuration: {0}")]
  MissingConfig(String),
}

impl From<SupabaseError> for DeliveryError {
  fn from(e: SupabaseError) -> Self {
    match e {
      SupabaseError::MissingConfig(name) => DeliveryError::MissingConfig(name),
      SupabaseError::Request(e) if e.is_timeout() => DeliveryError::Timeout,
      SupabaseError::Request(e) => DeliveryError::Request(e.to_string()),
      SupabaseError::Rejected(status, body) => {
        DeliveryError::Rejected(format!("{} {}", status, body))
      }
      SupabaseError::Api(message) => DeliveryError::Rejected(message),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Submission
/// ---------------------------------------------------------------------------

/// Deliver a validated report to the primary store. Stamps the row
/// unexported, retries per the policy, and marks the session submitted only
/// after the store acknowledges creation.
pub async fn submit_report<S: Sleeper>(
  config: &SupabaseConfig,
  session: &mut SubmissionSession,
  report: &ConditionReport,
  policy: &RetryPolicy,
  sleeper: &S,
) -> Result<i64, DeliveryError> {
  if session.submitted() {
    return Err(DeliveryError::AlreadySubmitted);
  }

  let row = ConditionRow::from_report(report);

  let mut last_error = DeliveryError::Request("no attempts were made".into());
  for attempt in 1..=policy.max_attempts {
    match supabase::insert_condition(config, &row).await {
      Ok(id) => {
        session.mark_submitted();
        println!("Report stored with id {}", id);
        return Ok(id);
      }
      Err(e) => {
        let e = DeliveryError::from(e);
        eprintln!("Warning: submission attempt {} failed: {}", attempt, e);
        last_error = e;
        if attempt < policy.max_attempts {
          sleeper.sleep(policy.delay_for(attempt)).await;
        }
      }
    }
  }

  Err(last_error)
}

/// Submission with the default policy and real clock
pub async fn submit(
  config: &SupabaseConfig,
  session: &mut SubmissionSession,
  report: &ConditionReport,
) -> Result<i64, DeliveryError> {
  submit_report(config, session, report, &RetryPolicy::default(), &TokioSleeper).await
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::{valid_condition_report, RecordingSleeper};

  fn test_config(server: &mockito::Server) -> SupabaseConfig {
    SupabaseConfig {
      url: server.url(),
      key: "test-key".to_string(),
      table: "condition".to_string(),
    }
  }

  fn fast_policy() -> RetryPolicy {
    RetryPolicy {
      max_attempts: 3,
      base_delay: Duration::from_millis(10),
    }
  }

  #[test]
  fn test_linear_backoff_is_non_decreasing() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.delay_for(1), Duration::from_secs(1));
    assert_eq!(policy.delay_for(2), Duration::from_secs(2));
    assert_eq!(policy.delay_for(3), Duration::from_secs(3));
  }

  #[tokio::test]
  async fn test_submit_succeeds_on_first_attempt() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("POST", "/rest/v1/condition")
      .with_status(201)
      .with_body(r#"[{"id": 5}]"#)
      .expect(1)
      .create_async()
      .await;

    let config = test_config(&server);
    let mut session = SubmissionSession::new();
    let sleeper = RecordingSleeper::default();

    let id = submit_report(
      &config,
      &mut session,
      &valid_condition_report(),
      &fast_policy(),
      &sleeper,
    )
    .await
    .unwrap();

    assert_eq!(id, 5);
    assert!(session.submitted());
    assert!(sleeper.delays.borrow().is_empty());
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_validate_then_submit_round_trip() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("POST", "/rest/v1/condition")
      .with_status(201)
      .with_body(r#"[{"id": 8}]"#)
      .create_async()
      .await;

    let mut raw = crate::test_utils::valid_raw_report();
    raw.symptoms = vec!["other".to_string()];
    raw.other_symptoms = "rash".to_string();
    let report =
      crate::validation::validate(&raw, &crate::schema::RecordSchema::default()).unwrap();

    let config = test_config(&server);
    let mut session = SubmissionSession::new();
    let sleeper = RecordingSleeper::default();

    let id = submit_report(&config, &mut session, &report, &fast_policy(), &sleeper)
      .await
      .unwrap();
    assert_eq!(id, 8);
  }

  #[tokio::test]
  async fn test_submit_retries_three_times_with_growing_backoff() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("POST", "/rest/v1/condition")
      .with_status(500)
      .with_body("unavailable")
      .expect(3)
      .create_async()
      .await;

    let config = test_config(&server);
    let mut session = SubmissionSession::new();
    let sleeper = RecordingSleeper::default();

    let err = submit_report(
      &config,
      &mut session,
      &valid_condition_report(),
      &fast_policy(),
      &sleeper,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, DeliveryError::Rejected(_)));
    assert!(!session.submitted());
    mock.assert_async().await;

    // Two sleeps between three attempts, non-decreasing
    let delays = sleeper.delays.borrow();
    assert_eq!(delays.len(), 2);
    assert!(delays[0] <= delays[1]);
  }

  #[tokio::test]
  async fn test_submitted_session_is_refused_without_network() {
    let server = mockito::Server::new_async().await;
    let config = test_config(&server);

    let mut session = SubmissionSession::new();
    session.mark_submitted();
    let sleeper = RecordingSleeper::default();

    // No mocks registered: a refused session must not reach the network
    let err = submit_report(
      &config,
      &mut session,
      &valid_condition_report(),
      &fast_policy(),
      &sleeper,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, DeliveryError::AlreadySubmitted));
  }
}
