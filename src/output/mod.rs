//! Reporting of run results
//!
//! This module provides:
//! - Console and markdown summaries of the run log
//! - The JSON result list of changed packages
//! - Feed gallery links for package versions

mod json;
mod links;
mod text;

pub use json::{ResultEntry, ResultList};
pub use links::package_url;
pub use text::{TextReporter, VersionChangeType};

use crate::domain::{Disposition, RunLog, SemanticVersion, UpdateOperation};
use crate::resolve::STABLE_TAG;
use std::collections::HashSet;

/// Output verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Totals only
    Quiet,
    /// Changes, unresolved packages, and errors
    #[default]
    Normal,
    /// Everything, including skipped and ignored packages
    Verbose,
}

/// Configuration for report rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    pub verbosity: Verbosity,
    /// Whether to use colors on the console
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::default(),
            color: true,
        }
    }
}

impl OutputConfig {
    /// Create configuration from CLI flags
    pub fn from_cli(verbose: bool, quiet: bool, no_color: bool) -> Self {
        let verbosity = if quiet {
            Verbosity::Quiet
        } else if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        };
        Self {
            verbosity,
            color: !no_color,
        }
    }
}

/// The run log partitioned for display
///
/// Each section is de-duplicated by (package id, resulting version), keeping
/// the first operation in log order.
#[derive(Debug, Default)]
pub struct Sections<'a> {
    pub updated: Vec<&'a UpdateOperation>,
    pub downgraded: Vec<&'a UpdateOperation>,
    pub skipped: Vec<&'a UpdateOperation>,
    pub ignored: Vec<&'a UpdateOperation>,
}

impl<'a> Sections<'a> {
    pub fn from_log(log: &'a RunLog) -> Self {
        let of = |disposition: Disposition| {
            unique(
                log.operations()
                    .iter()
                    .filter(move |op| op.disposition() == disposition),
            )
        };
        Self {
            updated: of(Disposition::Updated),
            downgraded: of(Disposition::Downgraded),
            skipped: unique(log.skipped()),
            ignored: unique(log.ignored()),
        }
    }
}

fn unique<'a>(ops: impl Iterator<Item = &'a UpdateOperation>) -> Vec<&'a UpdateOperation> {
    let mut seen = HashSet::new();
    ops.filter(|op| {
        seen.insert((
            op.package_id.to_ascii_lowercase(),
            op.resulting_version().clone(),
        ))
    })
    .collect()
}

/// Channel name shown next to a version: its first pre-release label
pub fn tag_label(version: &SemanticVersion) -> &str {
    version.labels().first().copied().unwrap_or(STABLE_TAG)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FeedVersion;

    fn v(s: &str) -> SemanticVersion {
        SemanticVersion::parse(s).unwrap()
    }

    fn op(id: &str, from: &str, to: &str, downgrade: bool, file: &str) -> UpdateOperation {
        UpdateOperation::new(id, v(from), &FeedVersion::forced(v(to)), downgrade)
            .with_file_path(file)
    }

    #[test]
    fn test_output_config_from_cli() {
        assert_eq!(
            OutputConfig::from_cli(false, false, false),
            OutputConfig::default()
        );
        let quiet = OutputConfig::from_cli(true, true, true);
        assert_eq!(quiet.verbosity, Verbosity::Quiet);
        assert!(!quiet.color);
        assert_eq!(
            OutputConfig::from_cli(true, false, false).verbosity,
            Verbosity::Verbose
        );
    }

    #[test]
    fn test_sections_partition_and_dedup() {
        let mut log = RunLog::new(false);
        log.record(op("Contoso.Core", "1.0.0", "1.1.0", false, "A.csproj"));
        log.record(op("CONTOSO.CORE", "1.0.5", "1.1.0", false, "B.csproj"));
        log.record(op("Zeta", "3.0.0", "2.0.0", true, "A.csproj"));
        log.record(op("Alpha", "2.0.0", "2.0.0", false, "A.csproj"));
        log.record(op("Alpha", "2.0.0", "2.0.0", false, "B.csproj"));
        log.record(op("Beta", "3.0.0", "2.0.0", false, "A.csproj"));
        log.record(UpdateOperation::ignored("Legacy", v("1.0.0")));

        let sections = Sections::from_log(&log);
        assert_eq!(sections.updated.len(), 1);
        assert_eq!(sections.updated[0].package_id, "Contoso.Core");
        assert_eq!(sections.downgraded.len(), 1);
        let skipped: Vec<&str> = sections
            .skipped
            .iter()
            .map(|op| op.package_id.as_str())
            .collect();
        assert_eq!(skipped, vec!["Alpha", "Beta"]);
        assert_eq!(sections.ignored.len(), 1);
    }

    #[test]
    fn test_tag_label() {
        assert_eq!(tag_label(&v("1.0.0")), "stable");
        assert_eq!(tag_label(&v("1.0.0-dev.4")), "dev");
        assert_eq!(tag_label(&v("1.0.0-beta")), "beta");
    }
}
