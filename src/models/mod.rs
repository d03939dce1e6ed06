pub mod report;
pub mod session;

pub use report::{BowelMovement, ConditionReport, Injury, RawReport, StoredConditionRecord};
pub use session::SubmissionSession;
