use crate::error::{AutoPsarcError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = ".autopsarc_config.json";

/// Executable names looked for next to the running binary.
pub const BUNDLED_TOOL_NAMES: &[&str] = &["PSARC.exe", "psarc"];

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Path to the external PSARC extraction tool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub psarc_path: Option<PathBuf>,

    /// Whether progress bars can be shown. `None` until first determined.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_bar: Option<bool>,

    /// Keys this version does not use, written back unchanged on save.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-user config location, `~/.autopsarc_config.json`.
    pub fn default_path() -> PathBuf {
        let home = std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

        home.join(CONFIG_FILE_NAME)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| AutoPsarcError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_json::from_str(&content).map_err(|e| AutoPsarcError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self).map_err(|e| AutoPsarcError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| AutoPsarcError::Config {
                message: format!("Failed to create config directory {}: {}", parent.display(), e),
            })?;
        }

        std::fs::write(path, content).map_err(|e| AutoPsarcError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })?;

        log::debug!("saved config to {}", path.display());
        Ok(())
    }

    /// Validates and stores a new tool path.
    pub fn set_tool_path<P: Into<PathBuf>>(&mut self, path: P) -> Result<()> {
        let path = path.into();
        if !path.is_file() {
            return Err(AutoPsarcError::InvalidToolPath {
                path: path.display().to_string(),
            });
        }

        self.psarc_path = Some(path);
        Ok(())
    }

    /// Returns the configured tool if it still exists, otherwise the first
    /// bundled tool found in `search_dirs`. A bundled hit is recorded in the
    /// config; the second tuple element reports whether that happened so the
    /// caller knows to save.
    pub fn resolve_tool_path(&mut self, search_dirs: &[PathBuf]) -> Option<(PathBuf, bool)> {
        if let Some(path) = self.psarc_path.as_ref().filter(|p| p.exists()) {
            return Some((path.clone(), false));
        }

        let bundled = search_dirs
            .iter()
            .flat_map(|dir| BUNDLED_TOOL_NAMES.iter().map(move |name| dir.join(name)))
            .find(|candidate| candidate.is_file())?;

        log::info!("using bundled tool at {}", bundled.display());
        self.psarc_path = Some(bundled.clone());
        Some((bundled, true))
    }

    /// Directory holding the running executable, where a bundled tool may live.
    pub fn bundled_search_dirs() -> Vec<PathBuf> {
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .into_iter()
            .collect()
    }

    pub fn progress_available(&self) -> Option<bool> {
        self.progress_bar
    }

    /// Records progress-bar availability. Returns true if the stored value changed.
    pub fn record_progress_available(&mut self, available: bool) -> bool {
        if self.progress_bar == Some(available) {
            return false;
        }
        self.progress_bar = Some(available);
        true
    }
}

/// Strips whitespace and surrounding quotes from a user-supplied path.
pub fn clean_path_input(raw: &str) -> PathBuf {
    PathBuf::from(raw.trim().trim_matches('"').trim_matches('\''))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.psarc_path.is_none());
        assert!(config.progress_available().is_none());
    }

    #[test]
    fn test_missing_file_loads_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::load_from_file(temp_dir.path().join("absent.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_file_operations() {
        let temp_dir = TempDir::new().unwrap();
        let tool = temp_dir.path().join("PSARC.exe");
        fs::write(&tool, "").unwrap();
        let config_path = temp_dir.path().join("nested").join("config.json");

        let mut config = Config::new();
        config.set_tool_path(&tool).unwrap();
        config.record_progress_available(true);
        config.save_to_file(&config_path).unwrap();

        let loaded = Config::load_from_file(&config_path).unwrap();
        assert_eq!(loaded.psarc_path, Some(tool));
        assert_eq!(loaded.progress_available(), Some(true));
    }

    #[test]
    fn test_unknown_keys_survive_save() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        fs::write(
            &config_path,
            r#"{"psarc_path": "/x/PSARC.exe", "tqdm_enabled": true, "other": {"n": 1}}"#,
        )
        .unwrap();

        let mut config = Config::load_from_file(&config_path).unwrap();
        assert_eq!(config.psarc_path, Some(PathBuf::from("/x/PSARC.exe")));
        assert!(!config.extra.contains_key("psarc_path"));

        config.record_progress_available(true);
        config.save_to_file(&config_path).unwrap();

        let saved: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&config_path).unwrap()).unwrap();
        assert_eq!(saved["tqdm_enabled"], true);
        assert_eq!(saved["other"]["n"], 1);
        assert_eq!(saved["progress_bar"], true);
        assert_eq!(saved["psarc_path"], "/x/PSARC.exe");
    }

    #[test]
    fn test_malformed_config_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        fs::write(&config_path, "{ nope").unwrap();

        let result = Config::load_from_file(&config_path);
        assert!(matches!(result, Err(AutoPsarcError::Config { .. })));
    }

    #[test]
    fn test_set_tool_path_rejects_missing_file() {
        let mut config = Config::new();
        let result = config.set_tool_path("/definitely/not/here/PSARC.exe");
        assert!(matches!(result, Err(AutoPsarcError::InvalidToolPath { .. })));
        assert!(config.psarc_path.is_none());
    }

    #[test]
    fn test_resolve_prefers_configured_tool() {
        let temp_dir = TempDir::new().unwrap();
        let configured = temp_dir.path().join("configured.exe");
        fs::write(&configured, "").unwrap();
        fs::write(temp_dir.path().join("PSARC.exe"), "").unwrap();

        let mut config = Config::new();
        config.psarc_path = Some(configured.clone());

        let resolved = config.resolve_tool_path(&[temp_dir.path().to_path_buf()]);
        assert_eq!(resolved, Some((configured, false)));
    }

    #[test]
    fn test_resolve_falls_back_to_bundled_tool() {
        let temp_dir = TempDir::new().unwrap();
        let bundled = temp_dir.path().join("PSARC.exe");
        fs::write(&bundled, "").unwrap();

        let mut config = Config::new();
        config.psarc_path = Some(PathBuf::from("/gone/PSARC.exe"));

        let resolved = config.resolve_tool_path(&[temp_dir.path().to_path_buf()]);
        assert_eq!(resolved, Some((bundled.clone(), true)));
        assert_eq!(config.psarc_path, Some(bundled));
    }

    #[test]
    fn test_resolve_without_any_tool() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::new();
        assert!(config
            .resolve_tool_path(&[temp_dir.path().to_path_buf()])
            .is_none());
    }

    #[test]
    fn test_record_progress_available() {
        let mut config = Config::new();
        assert!(config.record_progress_available(false));
        assert!(!config.record_progress_available(false));
        assert!(config.record_progress_available(true));
    }

    #[test]
    fn test_clean_path_input() {
        assert_eq!(
            clean_path_input("  \"C:\\Tools\\PSARC.exe\" "),
            PathBuf::from("C:\\Tools\\PSARC.exe")
        );
        assert_eq!(clean_path_input("/usr/bin/psarc"), PathBuf::from("/usr/bin/psarc"));
    }
}
