//! Configuration management for vigil
//!
//! Stores settings in ~/.config/vigil/config.json

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_API_URL: &str = "http://localhost:8501/api";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL of the analysis service.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Forwarded verbatim to the analyze endpoint; its effect is entirely
    /// the service's responsibility.
    #[serde(default = "default_true")]
    pub privacy_first_mode: bool,
    /// Gates every automatic analysis trigger (open, save, edit).
    #[serde(default = "default_true")]
    pub enable: bool,
    /// Apply returned fixes directly instead of staging a review diff.
    #[serde(default)]
    pub auto_fix: bool,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            privacy_first_mode: true,
            enable: true,
            auto_fix: false,
        }
    }
}

impl Settings {
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("vigil"))
    }

    /// Where settings are persisted for this user, when a config dir exists.
    pub fn default_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("config.json"))
    }

    /// Load settings from the default location, or return defaults.
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load settings from `path`, falling back to defaults on a missing or
    /// corrupt file. A corrupt file is preserved next to the original before
    /// defaults are used.
    pub fn load_from(path: &Path) -> Self {
        if let Ok(content) = fs::read_to_string(path) {
            match serde_json::from_str(&content) {
                Ok(settings) => return settings,
                Err(err) => {
                    preserve_corrupt_settings(path, &content);
                    tracing::warn!(
                        "settings file was corrupted ({err}); a backup was saved and defaults were loaded"
                    );
                }
            }
        }
        Self::default()
    }

    /// Save settings to the default location.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path().context("could not determine config directory")?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create config directory {}", dir.display()))?;
        }
        let content =
            serde_json::to_string_pretty(self).context("failed to serialize settings")?;
        write_atomic(path, &content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    /// Flip privacy-first mode and return the resulting mode name.
    pub fn toggle_privacy(&mut self) -> &'static str {
        self.privacy_first_mode = !self.privacy_first_mode;
        self.mode_name()
    }

    pub fn mode_name(&self) -> &'static str {
        if self.privacy_first_mode {
            "Privacy-First"
        } else {
            "Efficiency"
        }
    }
}

fn preserve_corrupt_settings(path: &Path, content: &str) {
    let corrupt_path = path.with_extension("json.corrupt");
    if fs::rename(path, &corrupt_path).is_err() {
        let _ = fs::write(&corrupt_path, content);
    }
}

fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, content)?;
    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.api_url, "http://localhost:8501/api");
        assert!(settings.privacy_first_mode);
        assert!(settings.enable);
        assert!(!settings.auto_fix);
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, Settings::default());

        let settings: Settings =
            serde_json::from_str(r#"{"auto_fix": true, "enable": false}"#).unwrap();
        assert!(settings.auto_fix);
        assert!(!settings.enable);
        assert!(settings.privacy_first_mode);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut settings = Settings::default();
        settings.api_url = "http://analysis.internal:9000/api".to_string();
        settings.auto_fix = true;
        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path), settings);
    }

    #[test]
    fn test_corrupt_file_loads_defaults_and_keeps_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
        assert!(path.with_extension("json.corrupt").exists());
    }

    #[test]
    fn test_toggle_privacy_reports_resulting_mode() {
        let mut settings = Settings::default();
        assert_eq!(settings.toggle_privacy(), "Efficiency");
        assert!(!settings.privacy_first_mode);
        assert_eq!(settings.toggle_privacy(), "Privacy-First");
        assert!(settings.privacy_first_mode);
    }
}
