use crate::error::{AutoPsarcError, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Captured result of one external tool run.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            exit_code: Some(0),
            ..Self::default()
        }
    }

    pub fn failed<S: Into<String>>(exit_code: i32, stdout: S, stderr: S) -> Self {
        Self {
            success: false,
            exit_code: Some(exit_code),
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }
}

/// Something that can extract a single archive into a directory.
pub trait ToolRunner: Send + Sync {
    fn extract(&self, archive: &Path, output_dir: &Path) -> Result<ToolOutput>;

    fn name(&self) -> String;
}

/// The external PSARC executable.
#[derive(Debug, Clone)]
pub struct PsarcTool {
    executable: PathBuf,
}

impl PsarcTool {
    pub fn new<P: Into<PathBuf>>(executable: P) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// `extract --input=<file> --to=<dir> -y`, with paths passed through unchanged.
    pub fn arguments(archive: &Path, output_dir: &Path) -> Vec<OsString> {
        let mut input = OsString::from("--input=");
        input.push(archive);
        let mut to = OsString::from("--to=");
        to.push(output_dir);

        vec![OsString::from("extract"), input, to, OsString::from("-y")]
    }
}

impl ToolRunner for PsarcTool {
    fn extract(&self, archive: &Path, output_dir: &Path) -> Result<ToolOutput> {
        let args = Self::arguments(archive, output_dir);
        log::debug!("running {} {:?}", self.executable.display(), args);

        let output = Command::new(&self.executable)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| AutoPsarcError::ToolLaunch {
                tool: self.executable.display().to_string(),
                source,
            })?;

        Ok(ToolOutput {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn name(&self) -> String {
        self.executable
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.executable.display().to_string())
    }
}
