pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod scanner;
pub mod ui;

// Public API re-exports
pub use cli::{Action, Cli, OutputFormat};
pub use config::Config;
pub use error::{AutoPsarcError, Result, UserFriendlyError};

// Core functionality re-exports
pub use extractor::{
    BatchLauncher, BatchSummary, ExtractionLog, ItemOutcome, PsarcTool, ToolOutput, ToolRunner,
};
pub use scanner::{ArchiveScanner, WorkItem};
pub use ui::{OutputFormatter, OutputMode, ProgressReporter};

use console::Term;
use std::path::{Path, PathBuf};

/// Main library interface: owns the loaded configuration for one process run
/// and saves it back whenever it changes.
pub struct AutoPsarc {
    config: Config,
    config_path: PathBuf,
    output_formatter: OutputFormatter,
    quiet: bool,
    bundled_dirs: Vec<PathBuf>,
}

impl AutoPsarc {
    pub fn new(
        config: Config,
        config_path: PathBuf,
        output_mode: OutputMode,
        verbose: u8,
        quiet: bool,
    ) -> Self {
        Self {
            config,
            config_path,
            output_formatter: OutputFormatter::new(output_mode, verbose, quiet),
            quiet,
            bundled_dirs: Config::bundled_search_dirs(),
        }
    }

    /// Loads the configuration named by the command line.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let config_path = cli.config_path();
        let config = Config::load_from_file(&config_path)?;

        Ok(Self::new(
            config,
            config_path,
            cli.output_mode(),
            cli.verbose,
            cli.quiet,
        ))
    }

    /// Overrides where a bundled PSARC.exe is looked for.
    pub fn with_bundled_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.bundled_dirs = dirs;
        self
    }

    /// Validates, stores and saves a new tool path.
    pub fn set_tool_path(&mut self, path: &Path) -> Result<PathBuf> {
        self.config.set_tool_path(path)?;
        self.save_config()?;
        self.output_formatter
            .success(&format!("PSARC.exe path saved: {}", path.display()));
        Ok(path.to_path_buf())
    }

    /// Asks for the tool path on the terminal.
    pub fn prompt_tool_path() -> Result<PathBuf> {
        let term = Term::stdout();
        term.write_str("Enter full path to PSARC.exe: ")?;
        let line = term.read_line()?;
        Ok(config::clean_path_input(&line))
    }

    /// The configured tool, or a bundled one (which is then saved).
    pub fn resolve_tool(&mut self) -> Result<PsarcTool> {
        let (path, discovered) = self
            .config
            .resolve_tool_path(&self.bundled_dirs)
            .ok_or(AutoPsarcError::ToolNotFound)?;

        if discovered {
            self.save_config()?;
            self.output_formatter
                .info(&format!("Using bundled PSARC.exe: {}", path.display()));
        }

        Ok(PsarcTool::new(path))
    }

    /// Resolves the tool and extracts every archive under `input` into `output`.
    pub fn extract(
        &mut self,
        input: &Path,
        output: &Path,
        workers: usize,
        log_mode: bool,
    ) -> Result<BatchSummary> {
        let tool = self.resolve_tool()?;
        self.output_formatter
            .debug(&format!("PSARC tool: {}", tool.executable().display()));
        self.extract_with(&tool, input, output, workers, log_mode)
    }

    /// Same as [`extract`](Self::extract) with an explicit tool.
    pub fn extract_with(
        &mut self,
        tool: &dyn ToolRunner,
        input: &Path,
        output: &Path,
        workers: usize,
        log_mode: bool,
    ) -> Result<BatchSummary> {
        let input_dir = resolve_input_dir(input)?;
        let output_dir = resolve_output_dir(output)?;

        self.output_formatter.start_operation(&format!(
            "Scanning {} for PSARC files",
            input_dir.display()
        ));

        let items = ArchiveScanner::default().scan(&input_dir, &output_dir)?;

        // The log file exists after any log-mode run, even one with nothing to do
        let log = if log_mode {
            let log = ExtractionLog::open(&output_dir)?;
            self.output_formatter.debug(&format!(
                "Log mode: {} entries in {}",
                log.len(),
                log.path().display()
            ));
            Some(log)
        } else {
            None
        };

        let progress = self.progress_reporter()?;

        if items.is_empty() {
            self.output_formatter.warning(&format!(
                "No .psarc files found in {}",
                input_dir.display()
            ));
            return Ok(BatchSummary::default());
        }

        self.output_formatter.info(&format!(
            "Found {} PSARC files, extracting with {} workers",
            items.len(),
            workers
        ));

        let summary = BatchLauncher::new(tool, workers).run(
            &items,
            log.as_ref(),
            progress.as_ref(),
            &self.output_formatter,
        )?;

        self.output_formatter.print_batch_summary(&summary);
        Ok(summary)
    }

    /// Progress bars are available unless switched off in the config; the
    /// first run records that in the config file.
    fn progress_reporter(&mut self) -> Result<Box<dyn ProgressReporter>> {
        if self.config.progress_available().is_none() {
            self.config.record_progress_available(true);
            self.save_config()?;
        }

        let enabled = !self.quiet
            && self.output_formatter.mode() != OutputMode::Json
            && self.config.progress_available() == Some(true);

        Ok(ui::select_progress(enabled))
    }

    fn save_config(&self) -> Result<()> {
        self.config.save_to_file(&self.config_path)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    pub fn handle_error(&self, error: &AutoPsarcError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}

fn resolve_input_dir(input: &Path) -> Result<PathBuf> {
    std::fs::canonicalize(input).map_err(|_| AutoPsarcError::InvalidPath {
        path: input.display().to_string(),
    })
}

fn resolve_output_dir(output: &Path) -> Result<PathBuf> {
    if output.exists() {
        return Ok(std::fs::canonicalize(output)?);
    }
    if output.is_absolute() {
        Ok(output.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(output))
    }
}
