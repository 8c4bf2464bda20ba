use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::{IntegrityError, Result};

pub const APP_SIGNATURE_FILE: &str = "/appinfo/signature.json";
pub const CORE_SIGNATURE_FILE: &str = "/core/signature.json";
pub const ROOT_CERTIFICATE_FILE: &str = "resources/codesigning/root.crt";

/// Relative paths that never take part in a hash set.
pub const SIGNATURE_FILES: [&str; 2] = [APP_SIGNATURE_FILE, CORE_SIGNATURE_FILE];

pub const CORE_SCOPE: &str = "core";

/// Installation layout the checker operates on.
#[derive(Debug, Clone)]
pub struct Environment {
    server_root: PathBuf,
}

impl Environment {
    pub fn new(server_root: impl Into<PathBuf>) -> Self {
        Self {
            server_root: server_root.into(),
        }
    }

    pub fn server_root(&self) -> &Path {
        &self.server_root
    }

    pub fn root_certificate_path(&self) -> PathBuf {
        self.server_root.join(ROOT_CERTIFICATE_FILE)
    }

    pub fn core_signature_path(&self) -> PathBuf {
        join_relative(&self.server_root, CORE_SIGNATURE_FILE)
    }
}

/// Joins a `/`-rooted relative path onto `base`.
pub fn join_relative(base: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .filter(|part| !part.is_empty())
        .fold(base.to_path_buf(), |acc, part| acc.join(part))
}

/// Key of `path` inside a hash set rooted at `root`: `/`-separated with a
/// leading `/`.
pub fn relative_key(root: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(root).map_err(|_| {
        IntegrityError::io(
            path,
            io::Error::other(format!("not below {}", root.display())),
        )
    })?;
    let mut key = String::new();
    for component in relative.components() {
        if let Component::Normal(part) = component {
            let part = part
                .to_str()
                .ok_or_else(|| IntegrityError::NonUtf8Path(path.to_path_buf()))?;
            key.push('/');
            key.push_str(part);
        }
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_known_paths() {
        let env = Environment::new("/srv/www");
        assert_eq!(
            env.root_certificate_path(),
            PathBuf::from("/srv/www/resources/codesigning/root.crt")
        );
        assert_eq!(
            env.core_signature_path(),
            PathBuf::from("/srv/www/core/signature.json")
        );
        assert_eq!(
            join_relative(Path::new("/apps/calendar"), APP_SIGNATURE_FILE),
            PathBuf::from("/apps/calendar/appinfo/signature.json")
        );
    }

    #[test]
    fn relative_keys_are_slash_rooted() {
        let root = Path::new("/srv/app");
        assert_eq!(
            relative_key(root, &root.join("sub").join("file.txt")).unwrap(),
            "/sub/file.txt"
        );
        assert!(relative_key(root, Path::new("/elsewhere/file.txt")).is_err());
    }
}
