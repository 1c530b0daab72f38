use crate::error::{AutoPsarcError, Result};
use crate::extractor::extraction_log::{log_entry_for, ExtractionLog};
use crate::extractor::tool::ToolRunner;
use crate::scanner::WorkItem;
use crate::ui::output::ProgressAwareOutput;
use crate::ui::progress::ProgressReporter;
use crate::ui::OutputFormatter;
use rayon::prelude::*;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

pub const DEFAULT_WORKERS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Extracted,
    Skipped,
    Failed { message: String },
}

/// An archive the tool could not extract, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct FailedArchive {
    pub archive_path: PathBuf,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub total: usize,
    pub extracted: usize,
    pub skipped: usize,
    pub failed: Vec<FailedArchive>,
    pub elapsed: Duration,
}

impl BatchSummary {
    fn from_outcomes(outcomes: Vec<(&WorkItem, ItemOutcome)>, elapsed: Duration) -> Self {
        let mut summary = Self {
            total: outcomes.len(),
            elapsed,
            ..Self::default()
        };

        for (item, outcome) in outcomes {
            match outcome {
                ItemOutcome::Extracted => summary.extracted += 1,
                ItemOutcome::Skipped => summary.skipped += 1,
                ItemOutcome::Failed { message } => summary.failed.push(FailedArchive {
                    archive_path: item.archive_path.clone(),
                    message,
                }),
            }
        }

        summary.failed.sort();
        summary
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Runs the external tool over a fixed list of work items on a bounded pool.
pub struct BatchLauncher<'a> {
    tool: &'a dyn ToolRunner,
    workers: usize,
}

impl<'a> BatchLauncher<'a> {
    pub fn new(tool: &'a dyn ToolRunner, workers: usize) -> Self {
        Self { tool, workers }
    }

    /// Processes every item. Individual failures are reported and counted;
    /// only an unusable worker pool aborts the batch.
    pub fn run(
        &self,
        items: &[WorkItem],
        log: Option<&ExtractionLog>,
        progress: &dyn ProgressReporter,
        formatter: &OutputFormatter,
    ) -> Result<BatchSummary> {
        if self.workers == 0 {
            return Err(AutoPsarcError::WorkerPool {
                message: "at least one worker is required".to_string(),
            });
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("autopsarc-worker-{}", i))
            .build()
            .map_err(|e| AutoPsarcError::WorkerPool {
                message: e.to_string(),
            })?;

        log::debug!(
            "dispatching {} archives to {} workers",
            items.len(),
            self.workers
        );

        let start = Instant::now();
        let output = ProgressAwareOutput::new(formatter, progress);
        progress.start(items.len() as u64);

        let outcomes: Vec<(&WorkItem, ItemOutcome)> = pool.install(|| {
            items
                .par_iter()
                .map(|item| {
                    let outcome = self.process_item(item, log, &output);
                    progress.advance(&item.display_path());
                    (item, outcome)
                })
                .collect()
        });

        let summary = BatchSummary::from_outcomes(outcomes, start.elapsed());
        progress.finish(&format!(
            "{} extracted, {} skipped, {} failed",
            summary.extracted,
            summary.skipped,
            summary.failed_count()
        ));

        Ok(summary)
    }

    fn process_item(
        &self,
        item: &WorkItem,
        log: Option<&ExtractionLog>,
        output: &ProgressAwareOutput,
    ) -> ItemOutcome {
        let pending_log_entry = match log {
            Some(log) => {
                let entry = log_entry_for(&item.archive_path);
                if log.contains(&entry) {
                    output.info(&format!(
                        "Skipping already extracted: {}",
                        item.archive_path.display()
                    ));
                    return ItemOutcome::Skipped;
                }
                Some((log, entry))
            }
            None => None,
        };

        if let Err(e) = fs::create_dir_all(&item.output_dir) {
            let message = format!(
                "Cannot create output directory {}: {}",
                item.output_dir.display(),
                e
            );
            output.error(&message);
            return ItemOutcome::Failed { message };
        }

        output.info(&format!(
            "Extracting: {} -> {}",
            item.archive_path.display(),
            item.output_dir.display()
        ));

        let result = match self.tool.extract(&item.archive_path, &item.output_dir) {
            Ok(result) => result,
            Err(e) => {
                let message = format!("Error extracting {}: {}", item.file_name(), e);
                output.error(&message);
                return ItemOutcome::Failed { message };
            }
        };

        if !result.success {
            output.tool_failure(&item.file_name(), &result);
            return ItemOutcome::Failed {
                message: format!(
                    "{} exited with {}",
                    self.tool.name(),
                    result
                        .exit_code
                        .map(|c| c.to_string())
                        .unwrap_or_else(|| "signal".to_string())
                ),
            };
        }

        if let Some((log, entry)) = pending_log_entry {
            if let Err(e) = log.append(&entry) {
                output.warning(&format!(
                    "Extracted {} but could not record it in {}: {}",
                    item.file_name(),
                    log.path().display(),
                    e
                ));
            }
        }

        log::debug!("extracted {}", item.archive_path.display());
        ItemOutcome::Extracted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::tool::ToolOutput;
    use crate::scanner::ArchiveScanner;
    use crate::ui::progress::{BarProgress, NoopProgress};
    use crate::ui::OutputMode;
    use std::collections::HashSet;
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Records every call and fails for archives whose name contains "broken".
    #[derive(Default)]
    struct RecordingTool {
        calls: Mutex<Vec<(PathBuf, PathBuf)>>,
    }

    impl RecordingTool {
        fn calls(&self) -> Vec<(PathBuf, PathBuf)> {
            let mut calls = self.calls.lock().unwrap().clone();
            calls.sort();
            calls
        }
    }

    impl ToolRunner for RecordingTool {
        fn extract(&self, archive: &Path, output_dir: &Path) -> Result<ToolOutput> {
            self.calls
                .lock()
                .unwrap()
                .push((archive.to_path_buf(), output_dir.to_path_buf()));

            if archive.to_string_lossy().contains("broken") {
                Ok(ToolOutput::failed(1, "partial output", "corrupt header"))
            } else {
                Ok(ToolOutput::succeeded())
            }
        }

        fn name(&self) -> String {
            "recording".to_string()
        }
    }

    fn quiet_formatter() -> OutputFormatter {
        OutputFormatter::new(OutputMode::Plain, 0, true)
    }

    fn make_archives(root: &Path, names: &[&str]) {
        for name in names {
            let path = root.join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, b"PSAR").unwrap();
        }
    }

    fn scan(input: &Path, output: &Path) -> Vec<WorkItem> {
        ArchiveScanner::default().scan(input, output).unwrap()
    }

    #[test]
    fn test_invokes_tool_once_per_archive() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        make_archives(input.path(), &["a/x.psarc", "b/y.psarc", "c.psarc"]);
        let items = scan(input.path(), output.path());

        let tool = RecordingTool::default();
        let summary = BatchLauncher::new(&tool, 4)
            .run(&items, None, &NoopProgress, &quiet_formatter())
            .unwrap();

        assert_eq!(summary.total, 3);
        assert_eq!(summary.extracted, 3);
        assert_eq!(
            tool.calls(),
            vec![
                (input.path().join("a/x.psarc"), output.path().join("a").join("x")),
                (input.path().join("b/y.psarc"), output.path().join("b").join("y")),
                (input.path().join("c.psarc"), output.path().join("c")),
            ]
        );
        assert!(output.path().join("a").join("x").is_dir());
    }

    #[test]
    fn test_failure_does_not_stop_other_items() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        make_archives(
            input.path(),
            &["one.psarc", "broken.psarc", "two.psarc", "three.psarc"],
        );
        let items = scan(input.path(), output.path());

        let tool = RecordingTool::default();
        let summary = BatchLauncher::new(&tool, 2)
            .run(&items, None, &NoopProgress, &quiet_formatter())
            .unwrap();

        assert_eq!(tool.calls().len(), 4);
        assert_eq!(summary.extracted, 3);
        assert_eq!(summary.failed_count(), 1);
        assert_eq!(summary.failed[0].archive_path, input.path().join("broken.psarc"));
        assert_eq!(summary.failed[0].message, "recording exited with 1");
        assert!(!summary.is_clean());
    }

    #[test]
    fn test_log_mode_rerun_invokes_nothing() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        make_archives(input.path(), &["a/x.psarc", "b/y.psarc"]);
        let items = scan(input.path(), output.path());

        let first = RecordingTool::default();
        let log = ExtractionLog::open(output.path()).unwrap();
        BatchLauncher::new(&first, 4)
            .run(&items, Some(&log), &NoopProgress, &quiet_formatter())
            .unwrap();
        assert_eq!(first.calls().len(), 2);

        let second = RecordingTool::default();
        let log = ExtractionLog::open(output.path()).unwrap();
        let summary = BatchLauncher::new(&second, 4)
            .run(&items, Some(&log), &NoopProgress, &quiet_formatter())
            .unwrap();

        assert!(second.calls().is_empty());
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.extracted, 0);
    }

    #[test]
    fn test_log_mode_retries_only_unlogged_archives() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        make_archives(input.path(), &["good.psarc", "broken.psarc"]);
        let items = scan(input.path(), output.path());

        let log = ExtractionLog::open(output.path()).unwrap();
        BatchLauncher::new(&RecordingTool::default(), 2)
            .run(&items, Some(&log), &NoopProgress, &quiet_formatter())
            .unwrap();

        let tool = RecordingTool::default();
        let log = ExtractionLog::open(output.path()).unwrap();
        BatchLauncher::new(&tool, 2)
            .run(&items, Some(&log), &NoopProgress, &quiet_formatter())
            .unwrap();

        let calls: Vec<PathBuf> = tool.calls().into_iter().map(|(a, _)| a).collect();
        assert_eq!(calls, vec![input.path().join("broken.psarc")]);
    }

    #[test]
    fn test_without_log_mode_nothing_is_recorded() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        make_archives(input.path(), &["x.psarc"]);
        let items = scan(input.path(), output.path());

        let tool = RecordingTool::default();
        BatchLauncher::new(&tool, 1)
            .run(&items, None, &NoopProgress, &quiet_formatter())
            .unwrap();
        BatchLauncher::new(&tool, 1)
            .run(&items, None, &NoopProgress, &quiet_formatter())
            .unwrap();

        assert_eq!(tool.calls().len(), 2);
        assert!(!output.path().join("extraction.log").exists());
    }

    #[test]
    fn test_concurrent_workers_log_each_archive_once() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let names: Vec<String> = (0..64).map(|i| format!("d{}/song{}.psarc", i % 5, i)).collect();
        let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
        make_archives(input.path(), &name_refs);
        let items = scan(input.path(), output.path());

        let log = ExtractionLog::open(output.path()).unwrap();
        let summary = BatchLauncher::new(&RecordingTool::default(), 8)
            .run(&items, Some(&log), &BarProgress::hidden(), &quiet_formatter())
            .unwrap();
        assert_eq!(summary.extracted, 64);

        let content = fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 64);

        let unique: HashSet<&str> = lines.iter().copied().collect();
        let expected: HashSet<String> = items
            .iter()
            .map(|item| log_entry_for(&item.archive_path).to_string_lossy().into_owned())
            .collect();
        assert_eq!(unique.len(), 64);
        assert!(expected.iter().all(|e| unique.contains(e.as_str())));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let tool = RecordingTool::default();
        let result = BatchLauncher::new(&tool, 0).run(&[], None, &NoopProgress, &quiet_formatter());
        assert!(matches!(result, Err(AutoPsarcError::WorkerPool { .. })));
    }

    #[test]
    fn test_empty_batch() {
        let tool = RecordingTool::default();
        let summary = BatchLauncher::new(&tool, DEFAULT_WORKERS)
            .run(&[], None, &NoopProgress, &quiet_formatter())
            .unwrap();
        assert_eq!(summary.total, 0);
        assert!(summary.is_clean());
    }
}
