use crate::config::{clean_path_input, Config};
use crate::error::{AutoPsarcError, Result};
use crate::extractor::DEFAULT_WORKERS;
use crate::ui::OutputMode;
use clap::builder::TypedValueParser;
use clap::{CommandFactory, Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "autopsarc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "AutoPSARC extraction utility")]
#[command(
    long_about = "AutoPSARC finds every .psarc archive under an input directory and extracts \
                  each one with PSARC.exe into a mirrored folder tree, several at a time."
)]
#[command(after_help = "EXAMPLES:\n  \
    autopsarc --psarc \"C:\\Tools\\PSARC.exe\"\n  \
    autopsarc -i ./archives -o ./extracted\n  \
    autopsarc -i ./archives -o ./extracted -v -l --workers 6\n\n\
    Run with --help-full for a description of every option.")]
pub struct Cli {
    /// Directory to search for PSARC files
    #[arg(short, long, value_name = "DIR")]
    pub input: Option<PathBuf>,

    /// Directory to extract files to
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Verbose output level (-v shows each archive, -vv adds debug detail)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (no progress bar, only errors)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Enable log mode to skip previously extracted files
    #[arg(short, long)]
    pub log: bool,

    /// Number of parallel extraction workers
    #[arg(
        long,
        default_value_t = DEFAULT_WORKERS,
        value_parser = clap::value_parser!(u32).range(1..).map(|n| n as usize)
    )]
    pub workers: usize,

    /// Set the path to PSARC.exe and save it. Prompts when no path is given. Must be run standalone.
    #[arg(
        short,
        long,
        value_name = "PATH",
        num_args = 0..=1,
        conflicts_with_all = ["input", "output", "log", "workers"]
    )]
    pub psarc: Option<Option<String>>,

    /// Show detailed help and usage examples
    #[arg(long)]
    pub help_full: bool,

    /// Configuration file location
    #[arg(long, value_name = "FILE", env = "AUTOPSARC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for messages and the final summary
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

impl From<OutputFormat> for OutputMode {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        }
    }
}

/// What a parsed command line asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    FullHelp,
    /// Set the tool path; `None` means prompt for it.
    SetToolPath(Option<PathBuf>),
    Extract { input: PathBuf, output: PathBuf },
}

impl Cli {
    pub fn action(&self) -> Result<Action> {
        if self.help_full {
            return Ok(Action::FullHelp);
        }

        if let Some(ref psarc) = self.psarc {
            return Ok(Action::SetToolPath(
                psarc.as_deref().map(clean_path_input),
            ));
        }

        match (&self.input, &self.output) {
            (Some(input), Some(output)) => Ok(Action::Extract {
                input: input.clone(),
                output: output.clone(),
            }),
            (None, _) => Err(AutoPsarcError::MissingArgument {
                name: "--input".to_string(),
            }),
            (_, None) => Err(AutoPsarcError::MissingArgument {
                name: "--output".to_string(),
            }),
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output_format.into()
    }

    pub fn print_usage() {
        let _ = Self::command().print_help();
        println!();
    }
}

pub fn full_help() -> String {
    format!(
        "\
AutoPSARC {version} - Extended Help

Usage:
  --input / -i       : Directory to scan for PSARC files
  --output / -o      : Directory where files will be extracted
  --verbose / -v     : Show detailed status updates (repeat for debug output)
  --quiet / -q       : Only report errors; no progress bar
  --log / -l         : Enable log mode to skip previously extracted files
  --workers          : Number of parallel workers to use (default {workers})
  --psarc / -p       : Set the path to PSARC.exe (standalone use only)
  --config           : Use a different configuration file (env AUTOPSARC_CONFIG)
  --output-format    : human, plain or json
  --help-full        : Show this help message with examples

Each archive <input>/<dir>/<name>.psarc is extracted into <output>/<dir>/<name>
by running:
  PSARC.exe extract --input=<archive> --to=<folder> -y

In log mode, successfully extracted archives are recorded in
<output>/extraction.log and skipped on later runs.

The PSARC.exe location is stored in {config}.
If no path has been set, a PSARC.exe next to autopsarc is used.

Examples:
  autopsarc --psarc \"C:\\Tools\\PSARC.exe\"
  autopsarc -i ./archives -o ./extracted -v -l --workers 6
",
        version = env!("CARGO_PKG_VERSION"),
        workers = DEFAULT_WORKERS,
        config = Config::default_path().display(),
    )
}
