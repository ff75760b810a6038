//! Package identity and reference structures

use super::{FileCategory, SemanticVersion};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

/// A package id paired with a concrete version
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageIdentity {
    pub id: String,
    pub version: SemanticVersion,
}

impl PackageIdentity {
    pub fn new(id: impl Into<String>, version: SemanticVersion) -> Self {
        Self {
            id: id.into(),
            version,
        }
    }

    /// Case-insensitive id comparison
    pub fn has_id(&self, id: &str) -> bool {
        self.id.eq_ignore_ascii_case(id)
    }
}

impl Ord for PackageIdentity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id
            .to_ascii_lowercase()
            .cmp(&other.id.to_ascii_lowercase())
            .then_with(|| self.version.cmp(&other.version))
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for PackageIdentity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PackageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.version)
    }
}

/// The currently referenced version of a package and every file that references it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageReference {
    pub identity: PackageIdentity,
    files: BTreeMap<FileCategory, BTreeSet<PathBuf>>,
}

impl PackageReference {
    pub fn new(identity: PackageIdentity) -> Self {
        Self {
            identity,
            files: BTreeMap::new(),
        }
    }

    /// Record a file where this identity occurs
    pub fn add_file(&mut self, category: FileCategory, path: impl Into<PathBuf>) {
        self.files.entry(category).or_default().insert(path.into());
    }

    /// Builder form of [`add_file`](Self::add_file)
    pub fn with_file(mut self, category: FileCategory, path: impl Into<PathBuf>) -> Self {
        self.add_file(category, path);
        self
    }

    pub fn id(&self) -> &str {
        &self.identity.id
    }

    pub fn version(&self) -> &SemanticVersion {
        &self.identity.version
    }

    /// Files grouped by category
    pub fn files_by_category(&self) -> &BTreeMap<FileCategory, BTreeSet<PathBuf>> {
        &self.files
    }

    /// All files, in category then path order
    pub fn files(&self) -> impl Iterator<Item = (FileCategory, &Path)> {
        self.files
            .iter()
            .flat_map(|(category, paths)| paths.iter().map(move |p| (*category, p.as_path())))
    }

    pub fn file_count(&self) -> usize {
        self.files.values().map(|paths| paths.len()).sum()
    }
}
