use crate::error::{AutoPsarcError, UserFriendlyError};
use crate::extractor::{BatchSummary, ToolOutput};
use crate::ui::progress::{format_duration, ProgressReporter};
use console::{style, Emoji, Term};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputMode {
    Human,
    Json,
    Plain,
}

// Emojis with text fallbacks
static CHECKMARK: Emoji = Emoji("✅ ", "✓ ");
static CROSS: Emoji = Emoji("❌ ", "✗ ");
static INFO: Emoji = Emoji("ℹ️  ", "i ");
static WARNING: Emoji = Emoji("⚠️  ", "! ");
static ROCKET: Emoji = Emoji("🚀 ", "> ");
static PACKAGE: Emoji = Emoji("📦 ", "* ");

pub struct OutputFormatter {
    mode: OutputMode,
    use_colors: bool,
    verbose_level: u8,
    quiet: bool,
}

impl OutputFormatter {
    pub fn new(mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let use_colors = match mode {
            OutputMode::Human => Term::stdout().features().colors_supported() && !quiet,
            _ => false,
        };

        Self {
            mode,
            use_colors,
            verbose_level: if quiet { 0 } else { verbose },
            quiet,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    // Core messaging methods

    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        match self.mode {
            OutputMode::Human => self.print_human_message(MessageType::Success, message),
            OutputMode::Json => self.print_json_message("success", message),
            OutputMode::Plain => println!("SUCCESS: {}", message),
        }
    }

    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Human => self.print_human_message(MessageType::Error, message),
            OutputMode::Json => self.print_json_message("error", message),
            OutputMode::Plain => eprintln!("ERROR: {}", message),
        }
    }

    pub fn warning(&self, message: &str) {
        if self.should_show_message(0) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Warning, message),
                OutputMode::Json => self.print_json_message("warning", message),
                OutputMode::Plain => println!("WARNING: {}", message),
            }
        }
    }

    /// Per-item status; shown with `-v`.
    pub fn info(&self, message: &str) {
        if self.should_show_message(1) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Info, message),
                OutputMode::Json => self.print_json_message("info", message),
                OutputMode::Plain => println!("INFO: {}", message),
            }
        }
    }

    pub fn debug(&self, message: &str) {
        if self.should_show_message(2) {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        println!("  {}", style(message).dim());
                    } else {
                        println!("  DEBUG: {}", message);
                    }
                }
                OutputMode::Json => self.print_json_message("debug", message),
                OutputMode::Plain => println!("DEBUG: {}", message),
            }
        }
    }

    pub fn start_operation(&self, operation: &str) {
        if self.should_show_message(0) {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        println!("{}{}", ROCKET, style(operation).bold());
                    } else {
                        println!("> {}", operation);
                    }
                }
                OutputMode::Json => self.print_json_message("operation_start", operation),
                OutputMode::Plain => println!("STARTING: {}", operation),
            }
        }
    }

    // Extraction failures and user-friendly errors

    /// Reports a non-zero exit of the external tool with both captured streams.
    pub fn tool_failure(&self, archive_name: &str, output: &ToolOutput) {
        match self.mode {
            OutputMode::Json => {
                self.print_json_object(&serde_json::json!({
                    "type": "extraction_failed",
                    "archive": archive_name,
                    "exit_code": output.exit_code,
                    "stdout": output.stdout,
                    "stderr": output.stderr,
                    "timestamp": chrono::Utc::now().to_rfc3339()
                }));
            }
            OutputMode::Human | OutputMode::Plain => {
                self.error(&format!("Error extracting {}:", archive_name));
                eprintln!("STDOUT:\n{}", output.stdout.trim_end());
                eprintln!("STDERR:\n{}", output.stderr.trim_end());
            }
        }
    }

    pub fn print_user_friendly_error(&self, error: &AutoPsarcError) {
        self.error(&error.user_message());

        if let Some(suggestion) = error.suggestion() {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        eprintln!(
                            "{}{}",
                            INFO,
                            style(format!("Suggestion: {}", suggestion)).cyan()
                        );
                    } else {
                        eprintln!("Suggestion: {}", suggestion);
                    }
                }
                OutputMode::Json => {
                    self.print_json_object(&serde_json::json!({
                        "type": "suggestion",
                        "message": suggestion
                    }));
                }
                OutputMode::Plain => {
                    eprintln!("SUGGESTION: {}", suggestion);
                }
            }
        }
    }

    // Summary and reporting

    pub fn print_batch_summary(&self, summary: &BatchSummary) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Human => self.print_human_summary(summary),
            OutputMode::Json => self.print_json_summary(summary),
            OutputMode::Plain => self.print_plain_summary(summary),
        }
    }

    pub fn print_separator(&self) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Human => {
                if self.use_colors {
                    println!("{}", style("─".repeat(60)).dim());
                } else {
                    println!("{}", "-".repeat(60));
                }
            }
            OutputMode::Plain => println!("{}", "-".repeat(60)),
            OutputMode::Json => {}
        }
    }

    // Private helper methods

    fn should_show_message(&self, min_verbose_level: u8) -> bool {
        !self.quiet && self.verbose_level >= min_verbose_level
    }

    fn print_human_message(&self, msg_type: MessageType, message: &str) {
        if self.use_colors {
            let (emoji, styled) = match msg_type {
                MessageType::Success => (CHECKMARK, style(message).green().bold()),
                MessageType::Error => (CROSS, style(message).red().bold()),
                MessageType::Warning => (WARNING, style(message).yellow().bold()),
                MessageType::Info => (INFO, style(message).cyan()),
            };

            match msg_type {
                MessageType::Error => eprintln!("{}{}", emoji, styled),
                _ => println!("{}{}", emoji, styled),
            }
        } else {
            let prefix = match msg_type {
                MessageType::Success => "✓",
                MessageType::Error => "✗",
                MessageType::Warning => "!",
                MessageType::Info => "i",
            };

            match msg_type {
                MessageType::Error => eprintln!("{} {}", prefix, message),
                _ => println!("{} {}", prefix, message),
            }
        }
    }

    fn print_json_message(&self, level: &str, message: &str) {
        self.print_json_object(&serde_json::json!({
            "type": "message",
            "level": level,
            "message": message,
            "timestamp": chrono::Utc::now().to_rfc3339()
        }));
    }

    fn print_json_object(&self, obj: &serde_json::Value) {
        println!(
            "{}",
            serde_json::to_string(obj).unwrap_or_else(|_| "{}".to_string())
        );
    }

    fn print_human_summary(&self, summary: &BatchSummary) {
        println!();
        self.print_separator();

        if self.use_colors {
            println!("{}{}", PACKAGE, style("PSARC extraction finished").green().bold());
        } else {
            println!("* PSARC extraction finished");
        }

        println!();
        self.print_count("Archives found:", summary.total);
        self.print_count("Extracted:", summary.extracted);
        self.print_count("Skipped:", summary.skipped);
        self.print_count("Failed:", summary.failed_count());
        println!("  Time taken:      {}", format_duration(summary.elapsed));

        if !summary.failed.is_empty() {
            println!();
            println!("Failed archives:");
            for failed in &summary.failed {
                println!("  - {}: {}", failed.archive_path.display(), failed.message);
            }
        }

        self.print_separator();
    }

    fn print_count(&self, label: &str, count: usize) {
        let value = if self.use_colors {
            style(count).cyan().bold().to_string()
        } else {
            count.to_string()
        };
        println!("  {:<16} {}", label, value);
    }

    fn json_summary(&self, summary: &BatchSummary) -> serde_json::Value {
        let failed: Vec<serde_json::Value> = summary
            .failed
            .iter()
            .map(|f| {
                serde_json::json!({
                    "archive": f.archive_path.display().to_string(),
                    "message": f.message
                })
            })
            .collect();

        serde_json::json!({
            "type": "summary",
            "total": summary.total,
            "extracted": summary.extracted,
            "skipped": summary.skipped,
            "failed": failed,
            "duration_ms": summary.elapsed.as_millis() as u64,
            "timestamp": chrono::Utc::now().to_rfc3339()
        })
    }

    fn print_json_summary(&self, summary: &BatchSummary) {
        let object = self.json_summary(summary);
        println!(
            "{}",
            serde_json::to_string_pretty(&object).unwrap_or_else(|_| "{}".to_string())
        );
    }

    fn print_plain_summary(&self, summary: &BatchSummary) {
        println!("COMPLETED: PSARC extraction");
        println!("Archives: {}", summary.total);
        println!("Extracted: {}", summary.extracted);
        println!("Skipped: {}", summary.skipped);
        println!("Failed: {}", summary.failed_count());
        for failed in &summary.failed {
            println!("FAILED: {} ({})", failed.archive_path.display(), failed.message);
        }
        println!("Duration: {:?}", summary.elapsed);
    }
}

#[derive(Debug, Clone, Copy)]
enum MessageType {
    Success,
    Error,
    Warning,
    Info,
}

// Progress-aware output wrapper

/// Formatter access that pauses the progress display around each message.
pub struct ProgressAwareOutput<'a> {
    formatter: &'a OutputFormatter,
    progress: &'a dyn ProgressReporter,
}

impl<'a> ProgressAwareOutput<'a> {
    pub fn new(formatter: &'a OutputFormatter, progress: &'a dyn ProgressReporter) -> Self {
        Self {
            formatter,
            progress,
        }
    }

    pub fn suspend_and_print<F>(&self, f: F)
    where
        F: FnOnce(&OutputFormatter),
    {
        let mut f = Some(f);
        self.progress.suspend(&mut || {
            if let Some(f) = f.take() {
                f(self.formatter);
            }
        });
    }

    pub fn error(&self, message: &str) {
        self.suspend_and_print(|f| f.error(message));
    }

    pub fn warning(&self, message: &str) {
        self.suspend_and_print(|f| f.warning(message));
    }

    pub fn info(&self, message: &str) {
        self.suspend_and_print(|f| f.info(message));
    }

    pub fn tool_failure(&self, archive_name: &str, output: &ToolOutput) {
        self.suspend_and_print(|f| f.tool_failure(archive_name, output));
    }
}
