//! Core domain models for feedup
//!
//! This module contains the fundamental types used throughout the application:
//! - Semantic versions and version ranges
//! - File categories that carry package references
//! - Package identities and references
//! - Feed versions and manual overrides
//! - Update operations and the run-scoped log

mod category;
mod feed_version;
mod operation;
mod range;
mod reference;
mod run_log;
mod version;
mod version_override;

pub use category::FileCategory;
pub use feed_version::FeedVersion;
pub use operation::{Disposition, UpdateOperation};
pub use range::{RangeBound, RangeParseError, VersionRange};
pub use reference::{PackageIdentity, PackageReference};
pub use run_log::{RunLog, UnresolvedPackage, UnresolvedReason};
pub use version::{SemanticVersion, VersionParseError};
pub use version_override::{VersionConstraint, VersionOverride};
