//! Manual per-package version overrides

use super::{SemanticVersion, VersionRange};
use std::fmt;

/// The value an override pins or constrains to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionConstraint {
    /// A single version
    Exact(SemanticVersion),
    /// A range filtering feed-returned versions
    Range(VersionRange),
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionConstraint::Exact(v) => write!(f, "{}", v),
            VersionConstraint::Range(r) => write!(f, "{}", r),
        }
    }
}

/// Manual instruction for one package
///
/// A forced override always carries a version, used verbatim with no feed
/// queried. Otherwise the constraint filters feed candidates before tag
/// matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionOverride {
    package_id: String,
    force_version: bool,
    constraint: VersionConstraint,
}

impl VersionOverride {
    /// An override that fixes the resolved version outright
    pub fn force(package_id: impl Into<String>, version: SemanticVersion) -> Self {
        Self {
            package_id: package_id.into(),
            force_version: true,
            constraint: VersionConstraint::Exact(version),
        }
    }

    /// An override that restricts candidates to a range
    pub fn range(package_id: impl Into<String>, range: VersionRange) -> Self {
        Self {
            package_id: package_id.into(),
            force_version: false,
            constraint: VersionConstraint::Range(range),
        }
    }

    /// A forced override taking the inclusive lower bound of `range`
    ///
    /// Returns `None` when the range has no inclusive lower bound.
    pub fn forced_range(package_id: impl Into<String>, range: VersionRange) -> Option<Self> {
        let entry = Self {
            package_id: package_id.into(),
            force_version: true,
            constraint: VersionConstraint::Range(range),
        };
        entry.forced_version().is_some().then_some(entry)
    }

    pub fn package_id(&self) -> &str {
        &self.package_id
    }

    pub fn is_forced(&self) -> bool {
        self.force_version
    }

    pub fn constraint(&self) -> &VersionConstraint {
        &self.constraint
    }

    /// The version to use verbatim, when forced
    pub fn forced_version(&self) -> Option<&SemanticVersion> {
        match (&self.constraint, self.force_version) {
            (VersionConstraint::Exact(v), true) => Some(v),
            (VersionConstraint::Range(r), true) => r
                .min()
                .filter(|b| b.inclusive)
                .map(|b| &b.version),
            _ => None,
        }
    }

    /// Returns true when a feed candidate passes this override's filter
    pub fn allows(&self, version: &SemanticVersion) -> bool {
        match &self.constraint {
            VersionConstraint::Exact(v) => v == version,
            VersionConstraint::Range(r) => r.satisfies(version),
        }
    }
}
