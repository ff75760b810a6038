//! Version range in interval notation
//!
//! Supported forms:
//! - `1.0` - at least 1.0 (inclusive)
//! - `[1.0]` - exactly 1.0
//! - `[1.0, 2.0)` - 1.0 inclusive up to 2.0 exclusive
//! - `(, 2.3.0-dev.48]` - anything up to and including 2.3.0-dev.48
//! - `(1.0,)` - anything above 1.0

use super::SemanticVersion;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned for malformed range strings
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid version range '{value}': {message}")]
pub struct RangeParseError {
    pub value: String,
    pub message: String,
}

/// One side of a range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeBound {
    pub version: SemanticVersion,
    pub inclusive: bool,
}

/// A version range with optional lower and upper bounds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    min: Option<RangeBound>,
    max: Option<RangeBound>,
}

impl VersionRange {
    /// A range matching exactly one version
    pub fn exact(version: SemanticVersion) -> Self {
        Self {
            min: Some(RangeBound {
                version: version.clone(),
                inclusive: true,
            }),
            max: Some(RangeBound {
                version,
                inclusive: true,
            }),
        }
    }

    /// A range with the given bounds
    pub fn new(min: Option<RangeBound>, max: Option<RangeBound>) -> Self {
        Self { min, max }
    }

    pub fn min(&self) -> Option<&RangeBound> {
        self.min.as_ref()
    }

    pub fn max(&self) -> Option<&RangeBound> {
        self.max.as_ref()
    }

    /// Parse a range string
    pub fn parse(value: &str) -> Result<Self, RangeParseError> {
        let err = |message: &str| RangeParseError {
            value: value.to_string(),
            message: message.to_string(),
        };
        let parse_version = |s: &str| {
            SemanticVersion::parse(s).map_err(|e| RangeParseError {
                value: value.to_string(),
                message: e.message,
            })
        };

        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(err("empty range"));
        }

        let open = trimmed.chars().next().unwrap_or_default();
        if open != '[' && open != '(' {
            // Plain version means "at least"
            return Ok(Self {
                min: Some(RangeBound {
                    version: parse_version(trimmed)?,
                    inclusive: true,
                }),
                max: None,
            });
        }

        let close = trimmed.chars().last().unwrap_or_default();
        if close != ']' && close != ')' {
            return Err(err("missing closing bracket"));
        }
        if trimmed.len() < 2 {
            return Err(err("missing closing bracket"));
        }
        let inner = &trimmed[1..trimmed.len() - 1];

        let Some((low, high)) = inner.split_once(',') else {
            if open == '[' && close == ']' && !inner.trim().is_empty() {
                return Ok(Self::exact(parse_version(inner.trim())?));
            }
            return Err(err("single-version range must use [version]"));
        };
        if high.contains(',') {
            return Err(err("too many commas"));
        }

        let low = low.trim();
        let high = high.trim();
        if low.is_empty() && high.is_empty() {
            return Err(err("range has no bounds"));
        }

        let min = if low.is_empty() {
            None
        } else {
            Some(RangeBound {
                version: parse_version(low)?,
                inclusive: open == '[',
            })
        };
        let max = if high.is_empty() {
            None
        } else {
            Some(RangeBound {
                version: parse_version(high)?,
                inclusive: close == ']',
            })
        };

        if let (Some(min), Some(max)) = (&min, &max) {
            if min.version > max.version {
                return Err(err("lower bound is above upper bound"));
            }
        }

        Ok(Self { min, max })
    }

    /// Returns true when the version lies within the range
    pub fn satisfies(&self, version: &SemanticVersion) -> bool {
        let above_min = match &self.min {
            Some(b) if b.inclusive => version >= &b.version,
            Some(b) => version > &b.version,
            None => true,
        };
        let below_max = match &self.max {
            Some(b) if b.inclusive => version <= &b.version,
            Some(b) => version < &b.version,
            None => true,
        };
        above_min && below_max
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.min, &self.max) {
            (Some(min), None) if min.inclusive => write!(f, "{}", min.version),
            (Some(min), Some(max)) if min.version == max.version && min.inclusive && max.inclusive => {
                write!(f, "[{}]", min.version)
            }
            (min, max) => {
                let open = match min {
                    Some(b) if b.inclusive => '[',
                    _ => '(',
                };
                let close = match max {
                    Some(b) if b.inclusive => ']',
                    _ => ')',
                };
                let low = min.as_ref().map(|b| b.version.to_string()).unwrap_or_default();
                let high = max.as_ref().map(|b| b.version.to_string()).unwrap_or_default();
                write!(f, "{}{}, {}{}", open, low, high, close)
            }
        }
    }
}

impl FromStr for VersionRange {
    type Err = RangeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
