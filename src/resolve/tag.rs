//! Release channel (tag) matching against pre-release labels

use crate::domain::SemanticVersion;
use regex::{Regex, RegexBuilder};

/// Tag that selects versions without pre-release labels
pub const STABLE_TAG: &str = "stable";

/// Number of labels a strict match requires ("tag.N")
const STRICT_LABEL_COUNT: usize = 2;

/// A compiled target tag
#[derive(Debug, Clone)]
pub enum TagMatcher {
    /// Empty tag or `stable`
    Stable,
    /// Case-insensitive pattern tested against each label
    Pattern(Regex),
}

impl TagMatcher {
    /// Compile a tag; an invalid pattern is matched as literal text
    pub fn new(tag: &str) -> Self {
        let tag = tag.trim();
        if tag.is_empty() || tag.eq_ignore_ascii_case(STABLE_TAG) {
            return TagMatcher::Stable;
        }

        let regex = RegexBuilder::new(tag)
            .case_insensitive(true)
            .build()
            .or_else(|_| {
                RegexBuilder::new(&regex::escape(tag))
                    .case_insensitive(true)
                    .build()
            });
        match regex {
            Ok(regex) => TagMatcher::Pattern(regex),
            // unreachable: an escaped literal always compiles
            Err(_) => TagMatcher::Stable,
        }
    }

    /// Returns true when `version` belongs to this tag's channel
    pub fn matches(&self, version: &SemanticVersion, strict: bool) -> bool {
        let labels = version.labels();
        match self {
            TagMatcher::Stable => labels.is_empty(),
            TagMatcher::Pattern(regex) => {
                if labels.is_empty() || (strict && labels.len() != STRICT_LABEL_COUNT) {
                    return false;
                }
                labels.iter().any(|label| regex.is_match(label))
            }
        }
    }
}

/// Test one version against one tag
pub fn matches_tag(version: &SemanticVersion, tag: &str, strict: bool) -> bool {
    TagMatcher::new(tag).matches(version, strict)
}
