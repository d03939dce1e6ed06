use std::process::ExitCode;

use condition_log::delivery;
use condition_log::export::{self, AdminAccess, AdminConfig};
use condition_log::models::{RawReport, SubmissionSession};
use condition_log::schema::RecordSchema;
use condition_log::sheets::SheetsConfig;
use condition_log::supabase::SupabaseConfig;
use condition_log::validation;

#[tokio::main]
async fn main() -> ExitCode {
  // Load environment variables from .env file
  dotenvy::dotenv().ok();

  let args: Vec<String> = std::env::args().collect();
  match (args.get(1).map(String::as_str), args.get(2)) {
    (Some("submit"), Some(path)) => submit_command(path).await,
    (Some("export"), Some(password)) => export_command(password).await,
    _ => usage(),
  }
}

fn usage() -> ExitCode {
  eprintln!("Usage: condition-log submit <report.json>");
  eprintln!("       condition-log export <admin-password>");
  ExitCode::FAILURE
}

async fn submit_command(path: &str) -> ExitCode {
  let text = match std::fs::read_to_string(path) {
    Ok(text) => text,
    Err(e) => {
      eprintln!("Failed to read {}: {}", path, e);
      return ExitCode::FAILURE;
    }
  };
  let raw: RawReport = match serde_json::from_str(&text) {
    Ok(raw) => raw,
    Err(e) => {
      eprintln!("Failed to parse {}: {}", path, e);
      return ExitCode::FAILURE;
    }
  };

  let report = match validation::validate(&raw, &RecordSchema::default()) {
    Ok(report) => report,
    Err(e) => {
      eprintln!("Report not submitted:");
      for violation in &e.violations {
        eprintln!("  {}", violation);
      }
      return ExitCode::FAILURE;
    }
  };

  let config = match SupabaseConfig::from_env() {
    Ok(config) => config,
    Err(e) => {
      eprintln!("{}", e);
      return ExitCode::FAILURE;
    }
  };

  let mut session = SubmissionSession::new();
  match delivery::submit(&config, &mut session, &report).await {
    Ok(id) => {
      println!("Submitted as record {}", id);
      ExitCode::SUCCESS
    }
    Err(e) => {
      eprintln!("Submission failed after retries: {}. Please try again.", e);
      ExitCode::FAILURE
    }
  }
}

async fn export_command(password: &str) -> ExitCode {
  let run = async {
    let admin = AdminConfig::from_env()?;
    let access = AdminAccess::authenticate(&admin, password)?;
    let supabase_config = SupabaseConfig::from_env()?;
    let sheets_config = SheetsConfig::from_env()?;
    export::reconcile(&access, &supabase_config, &sheets_config).await
  };

  match run.await {
    Ok(count) => {
      println!("Exported {} record(s)", count);
      ExitCode::SUCCESS
    }
    Err(e) => {
      eprintln!("Export failed: {}", e);
      ExitCode::FAILURE
    }
  }
}
