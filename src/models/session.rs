/// Per-session submission context. The form layer keeps one of these per
/// respondent session and passes it through the pipeline; a session that has
/// already submitted is refused rather than creating a second row.
#[derive(Debug, Clone, Default)]
pub struct SubmissionSession {
  submitted: bool,
}

impl SubmissionSession {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn submitted(&self) -> bool {
    self.submitted
  }

  pub(crate) fn mark_submitted(&mut self) {
    self.submitted = true;
  }
}
