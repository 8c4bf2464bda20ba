use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{IntegrityError, Result};
use crate::hashes::FileHashes;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DifferenceKind {
    /// Signed file no longer present.
    FileMissing,
    /// File present that the signature does not cover.
    FileTooMuch,
    /// File content differs from the signed digest.
    InvalidHash,
}

/// Digests for one path. An absent side is the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDifference {
    pub expected: String,
    pub current: String,
}

/// Classified discrepancies between a signed and a freshly computed hash
/// set. Serializes as `{"INVALID_HASH": {"/path": {"expected": …, "current": …}}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DifferenceReport {
    differences: BTreeMap<DifferenceKind, BTreeMap<String, FileDifference>>,
}

impl DifferenceReport {
    pub fn is_empty(&self) -> bool {
        self.differences.is_empty()
    }

    /// Total number of reported paths.
    pub fn len(&self) -> usize {
        self.differences.values().map(BTreeMap::len).sum()
    }

    pub fn entries(&self, kind: DifferenceKind) -> Option<&BTreeMap<String, FileDifference>> {
        self.differences.get(&kind)
    }

    pub fn get(&self, kind: DifferenceKind, path: &str) -> Option<&FileDifference> {
        self.differences.get(&kind).and_then(|m| m.get(path))
    }

    pub fn iter(&self) -> impl Iterator<Item = (DifferenceKind, &str, &FileDifference)> {
        self.differences.iter().flat_map(|(kind, files)| {
            files
                .iter()
                .map(move |(path, diff)| (*kind, path.as_str(), diff))
        })
    }

    fn insert(&mut self, kind: DifferenceKind, path: &str, expected: &str, current: &str) {
        self.differences.entry(kind).or_default().insert(
            path.to_string(),
            FileDifference {
                expected: expected.to_string(),
                current: current.to_string(),
            },
        );
    }
}

/// Three-way classification of every path present in either map. Paths with
/// equal digests never show up in the report.
pub fn diff(expected: &FileHashes, current: &FileHashes) -> Result<DifferenceReport> {
    let mut report = DifferenceReport::default();
    let paths: BTreeSet<&String> = expected.keys().chain(current.keys()).collect();
    for path in paths {
        match (expected.get(path), current.get(path)) {
            (None, Some(current)) => report.insert(DifferenceKind::FileTooMuch, path, "", current),
            (Some(expected), None) => {
                report.insert(DifferenceKind::FileMissing, path, expected, "")
            }
            (Some(expected), Some(current)) if expected != current => {
                report.insert(DifferenceKind::InvalidHash, path, expected, current)
            }
            (Some(_), Some(_)) => {}
            (None, None) => return Err(IntegrityError::InternalConsistency(path.clone())),
        }
    }
    Ok(report)
}
