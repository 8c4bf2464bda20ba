//! Directory walker feeding the hash set builder.
//!
//! Excluded names and patterns prune whole subtrees, so a match on any path
//! component keeps every file below it out of the walk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{IntegrityError, Result};
use crate::paths::relative_key;
use crate::settings::ExclusionSettings;

#[derive(Debug, Clone, Default)]
pub struct ExclusionRules {
    names: Vec<String>,
    suffixes: Vec<String>,
    prefixes: Vec<String>,
    folders: Vec<String>,
}

impl ExclusionRules {
    /// Name and pattern exclusions only.
    pub fn for_app(settings: &ExclusionSettings) -> Self {
        let mut suffixes = Vec::new();
        let mut prefixes = Vec::new();
        for pattern in &settings.excluded_patterns {
            if let Some(suffix) = pattern.strip_prefix('*') {
                suffixes.push(suffix.to_string());
            } else if let Some(prefix) = pattern.strip_suffix('*') {
                prefixes.push(prefix.to_string());
            }
        }
        Self {
            names: settings.excluded_names.clone(),
            suffixes,
            prefixes,
            folders: Vec::new(),
        }
    }

    /// App rules plus the top-level folders core never covers.
    pub fn for_core(settings: &ExclusionSettings) -> Self {
        Self {
            folders: settings.core_excluded_folders.clone(),
            ..Self::for_app(settings)
        }
    }

    pub fn excludes_name(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
            || self.suffixes.iter().any(|s| name.ends_with(s.as_str()))
            || self.prefixes.iter().any(|p| name.starts_with(p.as_str()))
    }

    pub fn excludes_folder(&self, relative: &str) -> bool {
        self.folders.iter().any(|folder| {
            relative
                .strip_prefix(folder.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }

    fn excludes(&self, root: &Path, path: &Path) -> bool {
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if self.excludes_name(name) {
                return true;
            }
        }
        if self.folders.is_empty() {
            return false;
        }
        relative_key(root, path).is_ok_and(|key| self.excludes_folder(&key))
    }
}

pub struct FileEnumerator {
    rules: ExclusionRules,
}

impl FileEnumerator {
    pub fn new(rules: ExclusionRules) -> Self {
        Self { rules }
    }

    /// Lazily walks `root`, yielding absolute paths of regular files and
    /// symlinks that survive the exclusion rules. Symlinked directories are
    /// not descended into. Each call starts a fresh walk.
    pub fn enumerate<'a>(
        &'a self,
        root: &Path,
    ) -> Result<impl Iterator<Item = Result<PathBuf>> + 'a> {
        let metadata = fs::metadata(root).map_err(|e| IntegrityError::io(root, e))?;
        if !metadata.is_dir() {
            return Err(IntegrityError::io(
                root,
                io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
            ));
        }
        debug!("Enumerating files below {}", root.display());

        let walk_root = root.to_path_buf();
        let files = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| {
                entry.depth() == 0 || !self.rules.excludes(&walk_root, entry.path())
            })
            .filter_map(|entry| match entry {
                Ok(entry) if entry.file_type().is_file() || entry.file_type().is_symlink() => {
                    Some(Ok(entry.into_path()))
                }
                Ok(_) => None,
                Err(err) => Some(Err(walk_error(err))),
            });
        Ok(files)
    }
}

fn walk_error(err: walkdir::Error) -> IntegrityError {
    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
    let source = err
        .into_io_error()
        .unwrap_or_else(|| io::Error::other("filesystem loop detected"));
    IntegrityError::io(path, source)
}
