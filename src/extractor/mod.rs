pub mod extraction_log;
pub mod launcher;
pub mod tool;

pub use extraction_log::{log_entry_for, ExtractionLog, LOG_FILE_NAME};
pub use launcher::{BatchLauncher, BatchSummary, FailedArchive, ItemOutcome, DEFAULT_WORKERS};
pub use tool::{PsarcTool, ToolOutput, ToolRunner};
