use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

/// Progress reporting strategy for a batch run.
///
/// Implementations are shared across worker threads.
pub trait ProgressReporter: Send + Sync {
    fn start(&self, total: u64);

    /// Called once per finished work item.
    fn advance(&self, current_item: &str);

    fn finish(&self, message: &str);

    /// Runs `f` with the progress display hidden so console output stays readable.
    fn suspend(&self, f: &mut dyn FnMut());

    fn is_enabled(&self) -> bool;
}

/// Reports nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn start(&self, _total: u64) {}

    fn advance(&self, _current_item: &str) {}

    fn finish(&self, _message: &str) {}

    fn suspend(&self, f: &mut dyn FnMut()) {
        f()
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

/// Terminal progress bar backed by indicatif.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new() -> Self {
        Self::with_bar(ProgressBar::new(0))
    }

    /// Bar that never draws, for tests.
    pub fn hidden() -> Self {
        Self::with_bar(ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::hidden()))
    }

    fn with_bar(bar: ProgressBar) -> Self {
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>5}/{len:5} archives {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
        );
        Self { bar }
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn length(&self) -> Option<u64> {
        self.bar.length()
    }
}

impl Default for BarProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for BarProgress {
    fn start(&self, total: u64) {
        self.bar.set_length(total);
        self.bar.set_position(0);
        self.bar.set_message("Extracting PSARC files");
        self.bar.enable_steady_tick(Duration::from_millis(100));
    }

    fn advance(&self, current_item: &str) {
        self.bar.set_message(current_item.to_string());
        self.bar.inc(1);
    }

    fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    fn suspend(&self, f: &mut dyn FnMut()) {
        self.bar.suspend(f)
    }

    fn is_enabled(&self) -> bool {
        true
    }
}

/// Picks the reporter for this run.
pub fn select_progress(enabled: bool) -> Box<dyn ProgressReporter> {
    if enabled {
        Box::new(BarProgress::new())
    } else {
        Box::new(NoopProgress)
    }
}

pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs > 0 {
        format!("{}s", secs)
    } else {
        format!("{}ms", duration.as_millis())
    }
}
