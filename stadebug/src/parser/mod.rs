pub mod report;
pub mod schema;

// Re-export for convenience
pub use report::{
    default_rules, BlockDiagnostic, BlockError, LineRule, ParseOutcome, PathBuilder, ReportParser,
    PATH_MARKER,
};
pub use schema::*;
