pub mod db;
pub mod error;
pub mod rings;

pub use db::Store;
pub use error::{StoreError, StoreResult};
pub use rings::{ReportSummary, RingBuffers, TraceEntry};
