//! Versions as returned by a feed, or forced by an override

use super::SemanticVersion;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A candidate version and the feed it came from
///
/// `origin` is `None` when the value was forced by an override and never
/// looked up from a feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedVersion {
    pub version: SemanticVersion,
    pub origin: Option<String>,
}

impl FeedVersion {
    /// A version found on the feed at `origin`
    pub fn from_feed(version: SemanticVersion, origin: impl Into<String>) -> Self {
        Self {
            version,
            origin: Some(origin.into()),
        }
    }

    /// A manually forced version
    pub fn forced(version: SemanticVersion) -> Self {
        Self {
            version,
            origin: None,
        }
    }

    pub fn is_forced(&self) -> bool {
        self.origin.is_none()
    }
}

impl fmt::Display for FeedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.origin {
            Some(origin) => write!(f, "{} ({})", self.version, origin),
            None => write!(f, "{} (override)", self.version),
        }
    }
}
