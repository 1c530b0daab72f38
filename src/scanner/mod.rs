pub mod archive_scanner;

pub use archive_scanner::{ArchiveScanner, WorkItem, DEFAULT_EXTENSION};
