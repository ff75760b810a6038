//! Run-scoped operation log
//!
//! Constructed at the start of a run, threaded through the pipeline, and
//! handed to the reporters at the end. Append-only.

use super::{Disposition, SemanticVersion, UpdateOperation};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a package could not be resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedReason {
    /// No candidate satisfied any configured tag
    NoMatchingVersion,
    /// No configured feed knows the package
    NotFound,
    /// Every feed failed for this package
    FeedFailed(String),
    /// The run was cancelled before the package was resolved
    Cancelled,
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnresolvedReason::NoMatchingVersion => write!(f, "no matching version"),
            UnresolvedReason::NotFound => write!(f, "not found on any feed"),
            UnresolvedReason::FeedFailed(msg) => write!(f, "feed failed: {}", msg),
            UnresolvedReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A package left untouched because no target version was found
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedPackage {
    pub package_id: String,
    pub version: SemanticVersion,
    pub reason: UnresolvedReason,
}

/// Every decision made during one run
#[derive(Debug, Clone, Default)]
pub struct RunLog {
    operations: Vec<UpdateOperation>,
    unresolved: Vec<UnresolvedPackage>,
    errors: Vec<String>,
    dry_run: bool,
}

impl RunLog {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Self::default()
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Append an operation
    ///
    /// Returns false, leaving the log unchanged, when an operation for the
    /// same (package id, file path) pair is already present.
    pub fn record(&mut self, operation: UpdateOperation) -> bool {
        let duplicate = self.operations.iter().any(|existing| {
            existing.package_id.eq_ignore_ascii_case(&operation.package_id)
                && existing.file_path == operation.file_path
        });
        if duplicate {
            return false;
        }
        self.operations.push(operation);
        true
    }

    /// Append a package that could not be resolved
    pub fn record_unresolved(
        &mut self,
        package_id: impl Into<String>,
        version: SemanticVersion,
        reason: UnresolvedReason,
    ) {
        self.unresolved.push(UnresolvedPackage {
            package_id: package_id.into(),
            version,
            reason,
        });
    }

    /// Append a non-fatal error (I/O, feed failure)
    pub fn record_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn operations(&self) -> &[UpdateOperation] {
        &self.operations
    }

    pub fn unresolved(&self) -> &[UnresolvedPackage] {
        &self.unresolved
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Operations for ignored packages
    pub fn ignored(&self) -> impl Iterator<Item = &UpdateOperation> {
        self.operations.iter().filter(|op| op.is_ignored)
    }

    /// Operations that rewrote (or would rewrite) a file
    pub fn proceeded(&self) -> impl Iterator<Item = &UpdateOperation> {
        self.operations.iter().filter(|op| op.proceeds())
    }

    /// Evaluated operations that left their file unchanged
    pub fn skipped(&self) -> impl Iterator<Item = &UpdateOperation> {
        self.operations
            .iter()
            .filter(|op| !op.is_ignored && !op.proceeds())
    }

    /// Number of operations with the given disposition
    pub fn count(&self, disposition: Disposition) -> usize {
        self.operations
            .iter()
            .filter(|op| op.disposition() == disposition)
            .count()
    }

    pub fn has_changes(&self) -> bool {
        self.proceeded().next().is_some()
    }
}
