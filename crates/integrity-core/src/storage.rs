use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{IntegrityError, Result};

/// Raw byte access to signature documents and the root certificate. No
/// caching: every call hits the backing store.
pub trait FileAccess: Send + Sync {
    fn read(&self, path: &Path) -> Result<Vec<u8>>;
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileAccess;

impl FileAccess for LocalFileAccess {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).map_err(|e| IntegrityError::io(path, e))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.is_dir() {
                return Err(IntegrityError::io(
                    path,
                    std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        format!("{} does not exist", parent.display()),
                    ),
                ));
            }
        }
        fs::write(path, contents).map_err(|e| IntegrityError::io(path, e))
    }
}

/// Resolves an application id to the directory holding its code.
pub trait AppPathResolver: Send + Sync {
    fn app_path(&self, app_id: &str) -> Result<PathBuf>;
}

/// Apps installed as `<apps_root>/<app_id>`.
#[derive(Debug, Clone)]
pub struct AppsDirectory {
    apps_root: PathBuf,
}

impl AppsDirectory {
    pub fn new(apps_root: impl Into<PathBuf>) -> Self {
        Self {
            apps_root: apps_root.into(),
        }
    }
}

impl AppPathResolver for AppsDirectory {
    fn app_path(&self, app_id: &str) -> Result<PathBuf> {
        let mut components = Path::new(app_id).components();
        let single_name = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if app_id.is_empty() || !single_name {
            return Err(IntegrityError::UnknownApp(app_id.to_string()));
        }
        let path = self.apps_root.join(app_id);
        if !path.is_dir() {
            return Err(IntegrityError::UnknownApp(app_id.to_string()));
        }
        Ok(path)
    }
}
