use crate::error::{AutoPsarcError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const DEFAULT_EXTENSION: &str = "psarc";

/// One archive to extract and the directory it extracts into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub archive_path: PathBuf,
    pub relative_path: PathBuf,
    pub output_dir: PathBuf,
}

impl WorkItem {
    /// Re-roots `archive_path` under `output_root`, dropping the extension.
    pub fn new(archive_path: PathBuf, input_root: &Path, output_root: &Path) -> Result<Self> {
        let relative_path = archive_path
            .strip_prefix(input_root)
            .map_err(|_| AutoPsarcError::InvalidPath {
                path: format!(
                    "{} is not inside {}",
                    archive_path.display(),
                    input_root.display()
                ),
            })?
            .to_path_buf();

        let output_dir = output_root.join(relative_path.with_extension(""));

        Ok(Self {
            archive_path,
            relative_path,
            output_dir,
        })
    }

    pub fn file_name(&self) -> String {
        self.archive_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    pub fn display_path(&self) -> String {
        self.relative_path.display().to_string()
    }
}

pub struct ArchiveScanner {
    extension: String,
}

impl ArchiveScanner {
    pub fn new<S: Into<String>>(extension: S) -> Self {
        Self {
            extension: extension.into().trim_start_matches('.').to_lowercase(),
        }
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn is_archive(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.to_lowercase() == self.extension)
    }

    /// Finds every archive under `input_root`, sorted by relative path.
    pub fn scan<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_root: P,
        output_root: Q,
    ) -> Result<Vec<WorkItem>> {
        let input_root = input_root.as_ref();
        let output_root = output_root.as_ref();

        if !input_root.exists() {
            return Err(AutoPsarcError::InvalidPath {
                path: input_root.display().to_string(),
            });
        }

        if !input_root.is_dir() {
            return Err(AutoPsarcError::InvalidPath {
                path: format!("{} is not a directory", input_root.display()),
            });
        }

        let mut items = Vec::new();

        for entry in WalkDir::new(input_root).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    // Unreadable subtrees are skipped, the rest of the scan goes on
                    log::warn!("scan error: {}", err);
                    continue;
                }
            };

            if is_file_entry(&entry) && self.is_archive(entry.path()) {
                items.push(WorkItem::new(
                    entry.into_path(),
                    input_root,
                    output_root,
                )?);
            }
        }

        items.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        log::debug!(
            "found {} .{} files under {}",
            items.len(),
            self.extension,
            input_root.display()
        );

        Ok(items)
    }
}

/// Regular files, and symlinks that resolve to one. Directory links are not
/// descended into.
fn is_file_entry(entry: &walkdir::DirEntry) -> bool {
    let file_type = entry.file_type();
    file_type.is_file() || (file_type.is_symlink() && entry.path().is_file())
}

impl Default for ArchiveScanner {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSION)
    }
}
