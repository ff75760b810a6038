//! Applying resolved versions to referencing files
//!
//! This module provides:
//! - `UpdateApplier`, which evaluates each file occurrence of a resolved
//!   reference, decides its disposition, and mutates the in-memory document
//! - Dry-run support (documents are marked dirty but never written)
//! - Persisting dirty documents once every mutation is done

use crate::catalog::Document;
use crate::domain::{Disposition, FeedVersion, PackageReference, RunLog, UpdateOperation};
use futures::future::join_all;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Result of persisting documents
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// Files written (or that would be written in a dry run)
    pub written: Vec<PathBuf>,
    /// Files whose write failed
    pub failed: Vec<PathBuf>,
}

impl ApplyOutcome {
    pub fn files_modified(&self) -> usize {
        self.written.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Applies resolved versions to documents
pub struct UpdateApplier {
    allow_downgrade: bool,
    dry_run: bool,
}

impl UpdateApplier {
    pub fn new(allow_downgrade: bool, dry_run: bool) -> Self {
        Self {
            allow_downgrade,
            dry_run,
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Evaluate every file occurrence of `reference` against `target`
    ///
    /// Logs at most one operation per (package id, file); a repeated id in the
    /// same file is still updated. Returns the number of documents changed.
    pub fn apply(
        &self,
        reference: &PackageReference,
        target: &FeedVersion,
        documents: &mut BTreeMap<PathBuf, Document>,
        log: &mut RunLog,
    ) -> usize {
        let base = UpdateOperation::new(
            reference.id(),
            reference.version().clone(),
            target,
            self.allow_downgrade,
        );
        let mut changed = 0;

        for (category, path) in reference.files() {
            let operation = base.with_file_path(path);
            let disposition = operation.disposition();

            match disposition {
                Disposition::AlreadyAtVersion => {
                    info!("{} {}: already at version", reference.id(), path.display());
                }
                Disposition::HigherVersionFound => {
                    info!(
                        "{} {}: higher version found, skipping ({} > {})",
                        reference.id(),
                        path.display(),
                        reference.version(),
                        target.version
                    );
                }
                Disposition::Updated | Disposition::Downgraded => {
                    let Some(document) = documents.get_mut(path) else {
                        warn!("{} ({}) is not loaded, skipping", path.display(), category);
                        continue;
                    };
                    if document.update_reference(reference.id(), reference.version(), &target.version) {
                        changed += 1;
                    }
                    info!(
                        "{} {}: {} {} → {}",
                        reference.id(),
                        path.display(),
                        disposition,
                        reference.version(),
                        target.version
                    );
                }
                Disposition::Ignored => {}
            }

            if !log.record(operation) {
                debug!("{} {}: already recorded", reference.id(), path.display());
            }
        }

        changed
    }

    /// Write every dirty document; nothing is written in a dry run
    ///
    /// A failed write is logged and recorded; the other documents are still
    /// written.
    pub async fn persist(
        &self,
        documents: &BTreeMap<PathBuf, Document>,
        log: &mut RunLog,
    ) -> ApplyOutcome {
        let dirty: Vec<&Document> = documents.values().filter(|d| d.is_dirty()).collect();
        let mut outcome = ApplyOutcome::default();

        if self.dry_run {
            for document in dirty {
                info!("dry run: would write {}", document.path().display());
                outcome.written.push(document.path().to_path_buf());
            }
            return outcome;
        }

        let results = join_all(dirty.iter().map(|document| document.save())).await;
        for (document, result) in dirty.into_iter().zip(results) {
            let path = document.path().to_path_buf();
            match result {
                Ok(()) => {
                    debug!("wrote {}", path.display());
                    outcome.written.push(path);
                }
                Err(e) => {
                    warn!("{}", e);
                    log.record_error(e.to_string());
                    outcome.failed.push(path);
                }
            }
        }
        outcome
    }
}
