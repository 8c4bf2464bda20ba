use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha512};
use tracing::{debug, info};

use crate::enumerator::FileEnumerator;
use crate::error::{IntegrityError, Result};
use crate::paths::{relative_key, SIGNATURE_FILES};

/// Relative path (`/dir/file`) to lowercase hex SHA-512 digest.
pub type FileHashes = BTreeMap<String, String>;

/// SHA-512 of a file's content as 128 lowercase hex chars.
pub fn hash_file(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| IntegrityError::io(path, e))?;
    let mut hasher = Sha512::new();
    let mut buffer = vec![0u8; 64 * 1024];
    loop {
        let n = file
            .read(&mut buffer)
            .map_err(|e| IntegrityError::io(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Digest recorded for an enumerated path. A symlink to a file hashes the
/// target's content; any other symlink hashes the link target path itself.
pub fn hash_entry(path: &Path) -> Result<String> {
    let link = fs::symlink_metadata(path).map_err(|e| IntegrityError::io(path, e))?;
    if !link.file_type().is_symlink() {
        return hash_file(path);
    }
    match fs::metadata(path) {
        Ok(target) if target.is_file() => hash_file(path),
        _ => {
            let target = fs::read_link(path).map_err(|e| IntegrityError::io(path, e))?;
            debug!("Hashing link target of {}", path.display());
            Ok(hex::encode(Sha512::digest(
                target.as_os_str().as_encoded_bytes(),
            )))
        }
    }
}

/// Hashes every enumerated file keyed by its path relative to `root`. The
/// signature documents themselves are never part of the result.
pub fn build_hashes<I>(files: I, root: &Path) -> Result<FileHashes>
where
    I: IntoIterator<Item = Result<PathBuf>>,
{
    let mut hashes = FileHashes::new();
    for file in files {
        let file = file?;
        let key = relative_key(root, &file)?;
        if SIGNATURE_FILES.contains(&key.as_str()) {
            debug!("Skipping signature document {}", key);
            continue;
        }
        let digest = hash_entry(&file)?;
        hashes.insert(key, digest);
    }
    Ok(hashes)
}

/// Enumerates and hashes `root` in one pass.
pub fn hash_tree(enumerator: &FileEnumerator, root: &Path) -> Result<FileHashes> {
    let hashes = build_hashes(enumerator.enumerate(root)?, root)?;
    info!("Hashed {} files below {}", hashes.len(), root.display());
    Ok(hashes)
}
