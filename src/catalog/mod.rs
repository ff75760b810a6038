//! Reference catalog
//!
//! This module provides:
//! - Discovery of referencing files under a solution root
//! - `Document`, the in-memory form of one referencing file
//! - Per-category reference extraction and format-preserving update
//! - `scan_catalog`, which loads every document once and merges the
//!   references into the de-duplicated catalog

mod discover;
mod grammar;

pub use discover::{discover_files, parse_solution, DiscoveredFile};
pub use grammar::{extract_references, update_reference, RawReference};

use crate::domain::{FileCategory, PackageIdentity, PackageReference, SemanticVersion};
use crate::error::CatalogError;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A referencing file held in memory for the whole run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    path: PathBuf,
    category: FileCategory,
    content: String,
    dirty: bool,
}

impl Document {
    pub fn new(path: impl Into<PathBuf>, category: FileCategory, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            category,
            content: content.into(),
            dirty: false,
        }
    }

    /// Read a document from disk
    pub async fn load(path: impl Into<PathBuf>, category: FileCategory) -> Result<Self, CatalogError> {
        let path = path.into();
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| CatalogError::read(&path, e))?;
        Ok(Self::new(path, category, content))
    }

    /// Read a document, taking the category from the file name
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, CatalogError> {
        let path = path.into();
        let category = FileCategory::from_path(&path)
            .ok_or_else(|| CatalogError::UnsupportedFile { path: path.clone() })?;
        Self::load(path, category).await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn category(&self) -> FileCategory {
        self.category
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns true once an update changed the content
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn references(&self) -> Vec<RawReference> {
        extract_references(self.category, &self.content)
    }

    /// Move every reference to `id` at `from` to `to`; returns true when changed
    pub fn update_reference(&mut self, id: &str, from: &SemanticVersion, to: &SemanticVersion) -> bool {
        match update_reference(self.category, &self.content, id, from, to) {
            Some(updated) => {
                self.content = updated;
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    /// Write the content back to the document's path
    pub async fn save(&self) -> Result<(), CatalogError> {
        tokio::fs::write(&self.path, &self.content)
            .await
            .map_err(|e| CatalogError::write(&self.path, e))
    }
}

/// Every loaded document and the references found in them
#[derive(Debug, Default)]
pub struct Catalog {
    /// Sorted by identity
    pub references: Vec<PackageReference>,
    /// Keyed by path
    pub documents: BTreeMap<PathBuf, Document>,
    /// Files that could not be read
    pub errors: Vec<CatalogError>,
}

impl Catalog {
    pub fn document_mut(&mut self, path: &Path) -> Option<&mut Document> {
        self.documents.get_mut(path)
    }
}

/// Discover, load, and index every referencing file under `root`
pub async fn scan_catalog(root: &Path) -> Catalog {
    let files = discover_files(root);
    debug!("found {} referencing files under {}", files.len(), root.display());
    load_catalog(files).await
}

/// Load the given files concurrently and build the catalog
pub async fn load_catalog(files: Vec<DiscoveredFile>) -> Catalog {
    let loads = files
        .into_iter()
        .map(|file| Document::load(file.path, file.category));
    let results = join_all(loads).await;

    let mut catalog = Catalog::default();
    for result in results {
        match result {
            Ok(document) => {
                catalog.documents.insert(document.path.clone(), document);
            }
            Err(e) => {
                warn!("{}", e);
                catalog.errors.push(e);
            }
        }
    }

    catalog.references = build_references(catalog.documents.values());
    catalog
}

/// Merge the references of all documents by (id, version)
///
/// Ids compare case-insensitively; the spelling of the first occurrence wins.
pub fn build_references<'a>(documents: impl IntoIterator<Item = &'a Document>) -> Vec<PackageReference> {
    let mut merged: BTreeMap<(String, SemanticVersion), PackageReference> = BTreeMap::new();

    for document in documents {
        for raw in document.references() {
            let Some(version) = raw.parsed_version() else {
                let err = CatalogError::InvalidVersion {
                    path: document.path.clone(),
                    package: raw.id.clone(),
                    version: raw.version.clone(),
                };
                debug!("excluded: {}", err);
                continue;
            };

            merged
                .entry((raw.id.to_ascii_lowercase(), version.clone()))
                .or_insert_with(|| PackageReference::new(PackageIdentity::new(raw.id, version)))
                .add_file(document.category, &document.path);
        }
    }

    let mut references: Vec<PackageReference> = merged.into_values().collect();
    references.sort_by(|a, b| a.identity.cmp(&b.identity));
    references
}
