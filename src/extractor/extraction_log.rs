use crate::error::{AutoPsarcError, Result};
use std::borrow::Cow;
use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const LOG_FILE_NAME: &str = "extraction.log";

/// Record of archives already extracted into an output directory.
///
/// The entry set is loaded once and stays fixed for the life of the value;
/// only the file grows. Appends from concurrent workers are serialized by
/// the writer lock, one flushed line per archive.
pub struct ExtractionLog {
    path: PathBuf,
    entries: HashSet<OsString>,
    writer: Mutex<File>,
}

impl ExtractionLog {
    /// Opens (creating if needed) `<output_dir>/extraction.log`.
    pub fn open<P: AsRef<Path>>(output_dir: P) -> Result<Self> {
        let output_dir = output_dir.as_ref();
        fs::create_dir_all(output_dir)?;

        let path = output_dir.join(LOG_FILE_NAME);
        let entries = Self::load_entries(&path)?;

        let writer = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| AutoPsarcError::Log {
                message: format!("cannot open {}: {}", path.display(), e),
            })?;

        log::debug!("loaded {} log entries from {}", entries.len(), path.display());

        Ok(Self {
            path,
            entries,
            writer: Mutex::new(writer),
        })
    }

    fn load_entries(path: &Path) -> Result<HashSet<OsString>> {
        if !path.exists() {
            return Ok(HashSet::new());
        }

        let content = fs::read(path).map_err(|e| AutoPsarcError::Log {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;

        Ok(content
            .split(|&b| b == b'\n')
            .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
            .filter(|line| !line.iter().all(u8::is_ascii_whitespace))
            .map(entry_from_bytes)
            .collect())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains<S: AsRef<OsStr>>(&self, entry: S) -> bool {
        self.entries.contains(entry.as_ref())
    }

    pub fn append<S: AsRef<OsStr>>(&self, entry: S) -> Result<()> {
        let mut line = entry_to_bytes(entry.as_ref()).into_owned();
        line.push(b'\n');

        let mut writer = self.writer.lock().map_err(|_| AutoPsarcError::Log {
            message: "log writer lock poisoned".to_string(),
        })?;

        writer.write_all(&line)?;
        writer.flush()?;
        Ok(())
    }
}

/// Absolute, resolved form of `path` used as the log key.
pub fn log_entry_for(path: &Path) -> OsString {
    let resolved = fs::canonicalize(path).unwrap_or_else(|_| {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    });
    resolved.into_os_string()
}

// Unix names are stored byte for byte; elsewhere paths are written as UTF-8.
#[cfg(unix)]
fn entry_to_bytes(entry: &OsStr) -> Cow<'_, [u8]> {
    use std::os::unix::ffi::OsStrExt;
    Cow::Borrowed(entry.as_bytes())
}

#[cfg(not(unix))]
fn entry_to_bytes(entry: &OsStr) -> Cow<'_, [u8]> {
    match entry.to_string_lossy() {
        Cow::Borrowed(s) => Cow::Borrowed(s.as_bytes()),
        Cow::Owned(s) => Cow::Owned(s.into_bytes()),
    }
}

#[cfg(unix)]
fn entry_from_bytes(line: &[u8]) -> OsString {
    use std::os::unix::ffi::OsStrExt;
    OsStr::from_bytes(line).to_os_string()
}

#[cfg(not(unix))]
fn entry_from_bytes(line: &[u8]) -> OsString {
    OsString::from(String::from_utf8_lossy(line).into_owned())
}
