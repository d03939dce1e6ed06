//! Operator-triggered export of unexported reports to the condition sheet
//!
//! At-least-once into the sheet: a failed batch append marks nothing, a
//! failed per-row mark leaves that row eligible for the next run. Duplicate
//! sheet rows are tolerated; silently losing a report is not. Intended to
//! run one instance at a time.

use std::env;

use crate::schema;
use crate::sheets::{self, SheetsConfig, SheetsError};
use crate::supabase::{self, SupabaseConfig, SupabaseError};

/// ---------------------------------------------------------------------------
/// Admin Gate
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AdminConfig {
  password: String,
}

impl AdminConfig {
  pub fn from_env() -> Result<Self, ExportError> {
    Ok(Self {
      password: env::var("ADMIN_PASSWORD")
        .map_err(|_| ExportError::MissingConfig("ADMIN_PASSWORD".into()))?,
    })
  }

  pub fn new(password: impl Into<String>) -> Self {
    Self {
      password: password.into(),
    }
  }
}

/// Proof of a passed admin-password check. `reconcile` cannot be called
/// without one.
#[derive(Debug)]
pub struct AdminAccess {
  _guard: (),
}

impl AdminAccess {
  pub fn authenticate(config: &AdminConfig, input: &str) -> Result<Self, ExportError> {
    if input == config.password {
      Ok(Self { _guard: () })
    } else {
      Err(ExportError::NotAuthorized)
    }
  }
}

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
  #[error("Missing configuration: {0}")]
  MissingConfig(String),

  #[error("Admin password does not match")]
  NotAuthorized,

  #[error("Primary store error: {0}")]
  Store(#[from] SupabaseError),

  #[error("Sheet error: {0}")]
  Sheet(#[from] SheetsError),

  #[error("Marked {marked} of {attempted} exported; ids {failed:?} stay unexported and will re-export next run")]
  MarkExported {
    marked: usize,
    attempted: usize,
    failed: Vec<i64>,
  },
}

/// ---------------------------------------------------------------------------
/// Reconciliation
/// ---------------------------------------------------------------------------

/// Drain unexported reports from the primary store into the sheet.
///
/// Order of operations matters: the sheet append happens first and as one
/// batch, then each row is marked exported individually, in the same order.
/// A crash between the two leaves every row unexported (future duplicates,
/// no loss); a crash mid-marking leaves a precise boundary.
pub async fn reconcile(
  _access: &AdminAccess,
  supabase_config: &SupabaseConfig,
  sheets_config: &SheetsConfig,
) -> Result<usize, ExportError> {
  let records = supabase::fetch_unexported(supabase_config).await?;
  if records.is_empty() {
    println!("No unexported records");
    return Ok(0);
  }

  let tokens = sheets::fetch_access_token(sheets_config).await?;

  if !sheets::header_present(sheets_config, &tokens.access_token).await? {
    sheets::append_rows(sheets_config, &tokens.access_token, &[schema::export_header()]).await?;
  }

  let rows: Vec<Vec<String>> = records.iter().map(|r| r.sheet_cells()).collect();
  sheets::append_rows(sheets_config, &tokens.access_token, &rows).await?;

  let mut marked = 0;
  let mut failed = Vec::new();
  for record in &records {
    match supabase::mark_exported(supabase_config, record.id).await {
      Ok(()) => marked += 1,
      Err(e) => {
        eprintln!("Warning: failed to mark record {} exported: {}", record.id, e);
        failed.push(record.id);
      }
    }
  }

  if failed.is_empty() {
    println!("Export complete: {} records", marked);
    Ok(marked)
  } else {
    Err(ExportError::MarkExported {
      marked,
      attempted: records.len(),
      failed,
    })
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
