pub mod alert;
pub mod cycle;
pub mod error;
pub mod registry;
pub mod result;
pub mod streak;

pub use alert::{Alert, AlertKind, Severity};
pub use cycle::{CycleReport, CHECK_TIMEOUT_MESSAGE, CYCLE_BUDGET_MESSAGE};
pub use error::ApiError;
pub use registry::CheckDescriptor;
pub use result::{CheckResult, CheckStatus, DeprecationInfo, MAX_DETAILS_BYTES};
pub use streak::FailureStreak;
