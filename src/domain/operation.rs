//! Update operation records

use super::{FeedVersion, SemanticVersion};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};

/// What happened to one evaluated (package, file) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// Package is on the ignore list or missing from the update-only list
    Ignored,
    /// Reference already points at the resolved version
    AlreadyAtVersion,
    /// Reference moved to a higher version
    Updated,
    /// Reference moved to a lower version (downgrades allowed)
    Downgraded,
    /// Resolved version is lower and downgrades are not allowed
    HigherVersionFound,
}

impl Disposition {
    /// Returns true when the referencing file gets rewritten
    pub fn proceeds(&self) -> bool {
        matches!(self, Disposition::Updated | Disposition::Downgraded)
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Disposition::Ignored => write!(f, "ignored"),
            Disposition::AlreadyAtVersion => write!(f, "already at version"),
            Disposition::Updated => write!(f, "updated"),
            Disposition::Downgraded => write!(f, "downgraded"),
            Disposition::HigherVersionFound => write!(f, "higher version found, skipping"),
        }
    }
}

/// One resolution decision for a package in a file
///
/// Never mutated after creation; the `with_*` methods return derived copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOperation {
    pub package_id: String,
    pub previous_version: SemanticVersion,
    /// `None` only for ignored operations
    pub updated_version: Option<SemanticVersion>,
    pub origin_uri: Option<String>,
    /// `None` only for ignored operations, which cover the whole package
    pub file_path: Option<PathBuf>,
    pub is_ignored: bool,
    pub can_downgrade: bool,
}

impl UpdateOperation {
    /// An operation moving `previous_version` to the resolved version
    pub fn new(
        package_id: impl Into<String>,
        previous_version: SemanticVersion,
        target: &FeedVersion,
        can_downgrade: bool,
    ) -> Self {
        Self {
            package_id: package_id.into(),
            previous_version,
            updated_version: Some(target.version.clone()),
            origin_uri: target.origin.clone(),
            file_path: None,
            is_ignored: false,
            can_downgrade,
        }
    }

    /// A single operation marking a package as excluded from resolution
    pub fn ignored(package_id: impl Into<String>, previous_version: SemanticVersion) -> Self {
        Self {
            package_id: package_id.into(),
            previous_version,
            updated_version: None,
            origin_uri: None,
            file_path: None,
            is_ignored: true,
            can_downgrade: false,
        }
    }

    /// Copy of this operation bound to a file
    pub fn with_file_path(&self, path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: Some(path.into()),
            ..self.clone()
        }
    }

    /// Copy of this operation with a different starting version
    pub fn with_previous_version(&self, version: SemanticVersion) -> Self {
        Self {
            previous_version: version,
            ..self.clone()
        }
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    /// The decision implied by the versions and downgrade policy
    pub fn disposition(&self) -> Disposition {
        if self.is_ignored {
            return Disposition::Ignored;
        }
        let Some(updated) = &self.updated_version else {
            return Disposition::Ignored;
        };
        match updated.cmp(&self.previous_version) {
            Ordering::Equal => Disposition::AlreadyAtVersion,
            Ordering::Greater => Disposition::Updated,
            Ordering::Less if self.can_downgrade => Disposition::Downgraded,
            Ordering::Less => Disposition::HigherVersionFound,
        }
    }

    /// Returns true when this operation rewrites its file
    pub fn proceeds(&self) -> bool {
        self.disposition().proceeds()
    }

    /// The version the reference ends up at after this operation
    pub fn resulting_version(&self) -> &SemanticVersion {
        match &self.updated_version {
            Some(updated) if self.proceeds() => updated,
            _ => &self.previous_version,
        }
    }
}

impl fmt::Display for UpdateOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.updated_version, self.disposition()) {
            (_, Disposition::Ignored) | (None, _) => {
                write!(f, "{}: {} (ignored)", self.package_id, self.previous_version)
            }
            (Some(updated), disposition) if disposition.proceeds() => write!(
                f,
                "{}: {} → {}",
                self.package_id, self.previous_version, updated
            ),
            (Some(updated), disposition) => write!(
                f,
                "{}: {} (resolved {}, {})",
                self.package_id, self.previous_version, updated, disposition
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> SemanticVersion {
        SemanticVersion::parse(s).unwrap()
    }

    fn op(previous: &str, target: &str, can_downgrade: bool) -> UpdateOperation {
        UpdateOperation::new(
            "Contoso.Core",
            v(previous),
            &FeedVersion::from_feed(v(target), "https://feed"),
            can_downgrade,
        )
    }

    #[test]
    fn test_disposition_already_at_version() {
        assert_eq!(op("1.0.0", "1.0", false).disposition(), Disposition::AlreadyAtVersion);
    }

    #[test]
    fn test_disposition_update() {
        let operation = op("1.0.0", "1.1.0", false);
        assert_eq!(operation.disposition(), Disposition::Updated);
        assert!(operation.proceeds());
        assert_eq!(operation.resulting_version(), &v("1.1.0"));
    }

    #[test]
    fn test_disposition_downgrade_gated() {
        let operation = op("2.0.0", "1.0.0", false);
        assert_eq!(operation.disposition(), Disposition::HigherVersionFound);
        assert!(!operation.proceeds());
        assert_eq!(operation.resulting_version(), &v("2.0.0"));

        assert_eq!(op("2.0.0", "1.0.0", true).disposition(), Disposition::Downgraded);
    }

    #[test]
    fn test_ignored_operation() {
        let operation = UpdateOperation::ignored("Legacy", v("1.0.0"));
        assert!(operation.is_ignored);
        assert_eq!(operation.disposition(), Disposition::Ignored);
        assert!(!operation.proceeds());
        assert_eq!(operation.to_string(), "Legacy: 1.0.0 (ignored)");
    }

    #[test]
    fn test_with_transforms_produce_copies() {
        let original = op("1.0.0", "1.1.0", false);
        let bound = original.with_file_path("src/App.csproj");
        let rebased = bound.with_previous_version(v("1.1.0"));

        assert_eq!(original.file_path(), None);
        assert_eq!(bound.file_path(), Some(Path::new("src/App.csproj")));
        assert_eq!(rebased.disposition(), Disposition::AlreadyAtVersion);
        assert_eq!(bound.disposition(), Disposition::Updated);
    }

    #[test]
    fn test_forced_target_has_no_origin() {
        let operation = UpdateOperation::new(
            "Contoso.Core",
            v("1.0.0"),
            &FeedVersion::forced(v("0.9.0")),
            true,
        );
        assert_eq!(operation.origin_uri, None);
        assert_eq!(operation.disposition(), Disposition::Downgraded);
    }

    #[test]
    fn test_display() {
        assert_eq!(op("1.0.0", "1.1.0", false).to_string(), "Contoso.Core: 1.0.0 → 1.1.0");
        assert_eq!(
            op("2.0.0", "1.0.0", false).to_string(),
            "Contoso.Core: 2.0.0 (resolved 1.0.0, higher version found, skipping)"
        );
    }

    #[test]
    fn test_disposition_display() {
        assert_eq!(Disposition::AlreadyAtVersion.to_string(), "already at version");
        assert_eq!(
            Disposition::HigherVersionFound.to_string(),
            "higher version found, skipping"
        );
    }
}
