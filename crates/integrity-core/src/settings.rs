use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{IntegrityError, Result};

/// Lists missing from a settings file keep their built-in values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExclusionSettings {
    /// File or directory names skipped anywhere in the tree.
    pub excluded_names: Vec<String>,
    /// `*suffix` or `prefix*` patterns matched against each path component.
    pub excluded_patterns: Vec<String>,
    /// Top-level folders skipped when signing or verifying core.
    pub core_excluded_folders: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IntegritySettings {
    #[serde(default)]
    pub exclusions: ExclusionSettings,
}

impl Default for ExclusionSettings {
    fn default() -> Self {
        Self {
            excluded_names: [
                ".git",
                ".svn",
                ".hg",
                ".bzr",
                ".DS_Store",
                "Thumbs.db",
                ".directory",
                ".webapp",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            excluded_patterns: ["*~", "*.swp", "*.swo", ".#*"]
                .into_iter()
                .map(String::from)
                .collect(),
            core_excluded_folders: [
                "/apps",
                "/assets",
                "/config",
                "/data",
                "/themes",
                "/updater",
                "/lost+found",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl IntegritySettings {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read(path).map_err(|e| IntegrityError::io(path, e))?;
        let settings: Self = serde_json::from_slice(&data)
            .map_err(|e| IntegrityError::Settings(format!("{}: {e}", path.display())))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        let data = serde_json::to_vec_pretty(self)
            .map_err(|e| IntegrityError::Settings(e.to_string()))?;
        fs::write(path, data).map_err(|e| IntegrityError::io(path, e))
    }

    pub fn validate(&self) -> Result<()> {
        let ex = &self.exclusions;
        for name in &ex.excluded_names {
            if name.is_empty() || name.contains('/') || name == "." || name == ".." {
                return Err(IntegrityError::Settings(format!(
                    "excluded name must be a single path component: {name:?}"
                )));
            }
        }
        for pattern in &ex.excluded_patterns {
            let stars = pattern.matches('*').count();
            let anchored = pattern.starts_with('*') ^ pattern.ends_with('*');
            if stars != 1 || !anchored || pattern.len() < 2 || pattern.contains('/') {
                return Err(IntegrityError::Settings(format!(
                    "pattern must be `*suffix` or `prefix*`: {pattern:?}"
                )));
            }
        }
        for folder in &ex.core_excluded_folders {
            if !folder.starts_with('/') || folder.len() < 2 || folder.ends_with('/') {
                return Err(IntegrityError::Settings(format!(
                    "core excluded folder must look like `/name`: {folder:?}"
                )));
            }
        }
        Ok(())
    }
}
