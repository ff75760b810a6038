//! Semantic version type used for references and feed results
//!
//! Wraps `semver::Version` with the lenient parsing feeds need
//! (`v` prefix, one- or two-component cores) and precedence that ignores
//! build metadata.

use semver::Version;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a version string is not a semantic version
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid version '{value}': {message}")]
pub struct VersionParseError {
    pub value: String,
    pub message: String,
}

impl VersionParseError {
    fn new(value: &str, message: impl Into<String>) -> Self {
        Self {
            value: value.to_string(),
            message: message.into(),
        }
    }
}

/// A dotted numeric triple with optional pre-release labels and build metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SemanticVersion(Version);

impl SemanticVersion {
    /// Create a release version from its numeric parts
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self(Version::new(major, minor, patch))
    }

    /// Parse a version string, padding partial cores with zeros
    ///
    /// - "1" -> 1.0.0
    /// - "1.1-dev.1" -> 1.1.0-dev.1
    /// - "v2.0.0" -> 2.0.0
    pub fn parse(value: &str) -> Result<Self, VersionParseError> {
        let trimmed = value.trim();
        let unprefixed = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);

        if unprefixed.is_empty() {
            return Err(VersionParseError::new(value, "empty version"));
        }

        let (rest, build) = match unprefixed.split_once('+') {
            Some((rest, build)) => (rest, Some(build)),
            None => (unprefixed, None),
        };
        let (core, pre) = match rest.split_once('-') {
            Some((core, pre)) => (core, Some(pre)),
            None => (rest, None),
        };

        let parts: Vec<&str> = core.split('.').collect();
        if parts.len() > 3 {
            return Err(VersionParseError::new(
                value,
                "more than three numeric components",
            ));
        }
        if parts
            .iter()
            .any(|p| p.is_empty() || !p.chars().all(|c| c.is_ascii_digit()))
        {
            return Err(VersionParseError::new(value, "non-numeric version core"));
        }

        let mut normalized = match parts.len() {
            1 => format!("{}.0.0", parts[0]),
            2 => format!("{}.{}.0", parts[0], parts[1]),
            _ => core.to_string(),
        };
        if let Some(pre) = pre {
            normalized.push('-');
            normalized.push_str(pre);
        }
        if let Some(build) = build {
            normalized.push('+');
            normalized.push_str(build);
        }

        Version::parse(&normalized)
            .map(Self)
            .map_err(|e| VersionParseError::new(value, e.to_string()))
    }

    pub fn major(&self) -> u64 {
        self.0.major
    }

    pub fn minor(&self) -> u64 {
        self.0.minor
    }

    pub fn patch(&self) -> u64 {
        self.0.patch
    }

    /// Returns true when the version carries pre-release labels
    pub fn is_prerelease(&self) -> bool {
        !self.0.pre.is_empty()
    }

    /// The full pre-release identifier, e.g. "dev.44"
    pub fn prerelease(&self) -> &str {
        self.0.pre.as_str()
    }

    /// The dot-delimited pre-release labels, empty for releases
    pub fn labels(&self) -> Vec<&str> {
        if self.0.pre.is_empty() {
            Vec::new()
        } else {
            self.0.pre.as_str().split('.').collect()
        }
    }

    /// Build metadata, if any
    pub fn build(&self) -> Option<&str> {
        if self.0.build.is_empty() {
            None
        } else {
            Some(self.0.build.as_str())
        }
    }

    /// Access the underlying semver value
    pub fn as_semver(&self) -> &Version {
        &self.0
    }
}

impl PartialEq for SemanticVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SemanticVersion {}

impl Hash for SemanticVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.major.hash(state);
        self.0.minor.hash(state);
        self.0.patch.hash(state);
        self.0.pre.hash(state);
    }
}

impl Ord for SemanticVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.0.major, self.0.minor, self.0.patch)
            .cmp(&(other.0.major, other.0.minor, other.0.patch))
            // semver precedence: absent pre-release sorts above present,
            // numeric labels below alphanumeric, shorter prefix lists lower
            .then_with(|| self.0.pre.cmp(&other.0.pre))
    }
}

impl PartialOrd for SemanticVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SemanticVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SemanticVersion {
    type Error = VersionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SemanticVersion> for String {
    fn from(value: SemanticVersion) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> SemanticVersion {
        SemanticVersion::parse(s).unwrap()
    }

    #[test]
    fn test_parse_full_version() {
        let version = v("2.3.0-dev.48");
        assert_eq!(version.major(), 2);
        assert_eq!(version.minor(), 3);
        assert_eq!(version.patch(), 0);
        assert_eq!(version.labels(), vec!["dev", "48"]);
        assert!(version.is_prerelease());
    }

    #[test]
    fn test_parse_pads_partial_core() {
        assert_eq!(v("1").to_string(), "1.0.0");
        assert_eq!(v("1.1").to_string(), "1.1.0");
        assert_eq!(v("1.1-dev.1").to_string(), "1.1.0-dev.1");
    }

    #[test]
    fn test_parse_strips_v_prefix() {
        assert_eq!(v("v2.0.0"), v("2.0.0"));
    }

    #[test]
    fn test_parse_keeps_build_metadata() {
        let version = v("1.0.0+sha.abc");
        assert_eq!(version.build(), Some("sha.abc"));
        assert!(!version.is_prerelease());
    }

    #[test]
    fn test_parse_rejects_invalid() {
        assert!(SemanticVersion::parse("").is_err());
        assert!(SemanticVersion::parse("1.*").is_err());
        assert!(SemanticVersion::parse("1.2.3.4").is_err());
        assert!(SemanticVersion::parse("abc").is_err());
        assert!(SemanticVersion::parse("[1.0,2.0)").is_err());
    }

    #[test]
    fn test_release_sorts_above_prerelease() {
        assert!(v("1.0.0") > v("1.0.0-beta.1"));
        assert!(v("1.1.0-dev.1") > v("1.0.0"));
    }

    #[test]
    fn test_numeric_labels_compare_numerically() {
        assert!(v("2.3.0-dev.48") > v("2.3.0-dev.44"));
        assert!(v("2.3.0-dev.10") > v("2.3.0-dev.9"));
    }

    #[test]
    fn test_numeric_labels_sort_before_alphabetic() {
        assert!(v("1.0.0-1") < v("1.0.0-alpha"));
    }

    #[test]
    fn test_shorter_label_list_is_lower() {
        assert!(v("1.0.0-dev") < v("1.0.0-dev.1"));
    }

    #[test]
    fn test_build_metadata_ignored_for_equality() {
        assert_eq!(v("1.0.0+a"), v("1.0.0+b"));
        assert_eq!(v("1.0.0+a").cmp(&v("1.0.0")), Ordering::Equal);
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&v("1.2.3-rc.1")).unwrap();
        assert_eq!(json, "\"1.2.3-rc.1\"");
        let parsed: SemanticVersion = serde_json::from_str("\"1.2\"").unwrap();
        assert_eq!(parsed, v("1.2.0"));
        assert!(serde_json::from_str::<SemanticVersion>("\"nope\"").is_err());
    }
}
