use thiserror::Error;

#[derive(Error, Debug)]
pub enum AutoPsarcError {
    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("PSARC tool not found")]
    ToolNotFound,

    #[error("Invalid PSARC tool path: {path}")]
    InvalidToolPath { path: String },

    #[error("Failed to launch {tool}: {source}")]
    ToolLaunch {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Path validation failed: {path}")]
    InvalidPath { path: String },

    #[error("Extraction log error: {message}")]
    Log { message: String },

    #[error("Worker pool error: {message}")]
    WorkerPool { message: String },

    #[error("Missing required argument: {name}")]
    MissingArgument { name: String },
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for AutoPsarcError {
    fn user_message(&self) -> String {
        match self {
            AutoPsarcError::Config { message } => {
                format!("Configuration error: {}", message)
            }
            AutoPsarcError::ToolNotFound => "PSARC.exe not found.".to_string(),
            AutoPsarcError::InvalidToolPath { path } => {
                format!("Provided PSARC.exe path is invalid: {}", path)
            }
            AutoPsarcError::ToolLaunch { tool, source } => {
                format!("Could not run {}: {}", tool, source)
            }
            AutoPsarcError::InvalidPath { path } => {
                format!("Invalid path: {}", path)
            }
            AutoPsarcError::Log { message } => {
                format!("Extraction log problem: {}", message)
            }
            AutoPsarcError::MissingArgument { name } => {
                format!("Missing required argument: {}", name)
            }
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            AutoPsarcError::ToolNotFound => Some(
                "Run with --psarc <PATH> to set the path to PSARC.exe, or place PSARC.exe next to autopsarc.".to_string()
            ),
            AutoPsarcError::InvalidToolPath { .. } => Some(
                "Check that the file exists. Quotes around the path are allowed.".to_string()
            ),
            AutoPsarcError::Config { .. } => Some(
                "Check the configuration file syntax, or delete it to start over with defaults.".to_string()
            ),
            AutoPsarcError::InvalidPath { .. } => Some(
                "Ensure the input directory exists and is a directory.".to_string()
            ),
            AutoPsarcError::Log { .. } => Some(
                "Ensure the output directory is writable.".to_string()
            ),
            AutoPsarcError::MissingArgument { .. } => Some(
                "Both --input and --output are required for extraction. See --help-full.".to_string()
            ),
            _ => None,
        }
    }
}

impl AutoPsarcError {
    /// Process exit code for errors that abort a run.
    pub fn exit_code(&self) -> i32 {
        match self {
            AutoPsarcError::MissingArgument { .. } => 2,
            _ => 1,
        }
    }
}

impl From<serde_json::Error> for AutoPsarcError {
    fn from(error: serde_json::Error) -> Self {
        AutoPsarcError::Config {
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AutoPsarcError>;
