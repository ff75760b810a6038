//! Human-readable summaries
//!
//! Two renderings of the same run log:
//! - `write_summary`: the console form, colored, tags only
//! - `write_extended`: a markdown document with a timestamp and a gallery
//!   link per package version where the feed's URI shape allows one

use super::{package_url, tag_label, OutputConfig, Sections, Verbosity};
use crate::domain::{RunLog, SemanticVersion, UpdateOperation};
use chrono::{DateTime, Utc};
use colored::Colorize;
use std::io::Write;
use std::path::Path;

/// Kind of version movement between two versions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionChangeType {
    Major,
    Minor,
    Patch,
    /// Same numeric core, different pre-release labels
    Prerelease,
}

impl VersionChangeType {
    pub fn from_versions(old: &SemanticVersion, new: &SemanticVersion) -> Self {
        if old.major() != new.major() {
            VersionChangeType::Major
        } else if old.minor() != new.minor() {
            VersionChangeType::Minor
        } else if old.patch() != new.patch() {
            VersionChangeType::Patch
        } else {
            VersionChangeType::Prerelease
        }
    }

    pub fn colored_label(&self) -> String {
        match self {
            VersionChangeType::Major => "major".red().bold().to_string(),
            VersionChangeType::Minor => "minor".yellow().to_string(),
            VersionChangeType::Patch => "patch".green().to_string(),
            VersionChangeType::Prerelease => "pre".cyan().to_string(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            VersionChangeType::Major => "major",
            VersionChangeType::Minor => "minor",
            VersionChangeType::Patch => "patch",
            VersionChangeType::Prerelease => "pre",
        }
    }
}

/// Text reporter for the console and the summary file
pub struct TextReporter {
    verbosity: Verbosity,
    color: bool,
}

impl TextReporter {
    pub fn new(config: OutputConfig) -> Self {
        Self {
            verbosity: config.verbosity,
            color: config.color,
        }
    }

    fn dry_run_prefix(&self, log: &RunLog) -> String {
        if !log.is_dry_run() {
            String::new()
        } else if self.color {
            format!("{} ", "(dry-run)".cyan())
        } else {
            "(dry-run) ".to_string()
        }
    }

    fn heading(&self, title: &str, count: usize, writer: &mut dyn Write) -> std::io::Result<()> {
        if self.color {
            writeln!(writer, "{} ({})", title.bold(), count)
        } else {
            writeln!(writer, "{} ({})", title, count)
        }
    }

    /// `id previous → updated [tag] (change)`
    fn format_change_line(
        &self,
        op: &UpdateOperation,
        width: usize,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let Some(updated) = &op.updated_version else {
            return Ok(());
        };
        let change = VersionChangeType::from_versions(&op.previous_version, updated);
        let tag = tag_label(updated);

        if self.color {
            let name = format!("{:width$}", op.package_id, width = width);
            let new_version = if op.previous_version > *updated {
                updated.to_string().yellow().bold()
            } else {
                updated.to_string().bright_white().bold()
            };
            writeln!(
                writer,
                "  {} {} {} {} [{}] ({})",
                name,
                op.previous_version.to_string().dimmed(),
                "→".dimmed(),
                new_version,
                tag.cyan(),
                change.colored_label()
            )
        } else {
            writeln!(
                writer,
                "  {:width$} {} → {} [{}] ({})",
                op.package_id,
                op.previous_version,
                updated,
                tag,
                change.label(),
                width = width
            )
        }
    }

    fn format_skip_line(
        &self,
        op: &UpdateOperation,
        width: usize,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let found = op
            .updated_version
            .as_ref()
            .map(|v| format!(" → {} [{}]", v, tag_label(v)))
            .unwrap_or_default();
        let line = format!(
            "  {:width$} {}{} ({})",
            op.package_id,
            op.previous_version,
            found,
            op.disposition(),
            width = width
        );
        if self.color {
            writeln!(writer, "{}", line.dimmed())
        } else {
            writeln!(writer, "{}", line)
        }
    }

    /// Write the console summary
    pub fn write_summary(&self, log: &RunLog, writer: &mut dyn Write) -> std::io::Result<()> {
        let sections = Sections::from_log(log);
        let unresolved = log.unresolved();
        let width = name_width(&sections, log);

        writeln!(
            writer,
            "{}{} updated, {} downgraded, {} skipped, {} ignored, {} unresolved",
            self.dry_run_prefix(log),
            sections.updated.len(),
            sections.downgraded.len(),
            sections.skipped.len(),
            sections.ignored.len(),
            unresolved.len()
        )?;
        if self.verbosity == Verbosity::Quiet {
            return Ok(());
        }

        for (title, ops) in [("Updated", &sections.updated), ("Downgraded", &sections.downgraded)] {
            if ops.is_empty() {
                continue;
            }
            writeln!(writer)?;
            self.heading(title, ops.len(), writer)?;
            for op in ops {
                self.format_change_line(op, width, writer)?;
            }
        }

        if self.verbosity == Verbosity::Verbose {
            for (title, ops) in [("Skipped", &sections.skipped), ("Ignored", &sections.ignored)] {
                if ops.is_empty() {
                    continue;
                }
                writeln!(writer)?;
                self.heading(title, ops.len(), writer)?;
                for op in ops {
                    self.format_skip_line(op, width, writer)?;
                }
            }
        }

        if !unresolved.is_empty() {
            writeln!(writer)?;
            self.heading("Unresolved", unresolved.len(), writer)?;
            for package in unresolved {
                let line = format!(
                    "  {:width$} {} ({})",
                    package.package_id,
                    package.version,
                    package.reason,
                    width = width
                );
                if self.color {
                    writeln!(writer, "{}", line.red())?;
                } else {
                    writeln!(writer, "{}", line)?;
                }
            }
        }

        if !log.errors().is_empty() {
            writeln!(writer)?;
            self.heading("Errors", log.errors().len(), writer)?;
            for error in log.errors() {
                writeln!(writer, "  {}", error)?;
            }
        }

        Ok(())
    }

    /// Write the markdown summary with gallery links
    ///
    /// Always plain text and always complete, regardless of verbosity.
    pub fn write_extended(
        &self,
        log: &RunLog,
        generated_at: DateTime<Utc>,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let sections = Sections::from_log(log);

        writeln!(writer, "# Package update summary")?;
        writeln!(writer)?;
        write!(
            writer,
            "Generated {}",
            generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        if log.is_dry_run() {
            write!(writer, " (dry run, no files written)")?;
        }
        writeln!(writer)?;

        for (title, ops) in [("Updated", &sections.updated), ("Downgraded", &sections.downgraded)] {
            if ops.is_empty() {
                continue;
            }
            writeln!(writer)?;
            writeln!(writer, "## {}", title)?;
            writeln!(writer)?;
            for op in ops {
                let Some(updated) = &op.updated_version else {
                    continue;
                };
                writeln!(
                    writer,
                    "- {} (from {}) [{}]",
                    linked(op, updated),
                    op.previous_version,
                    tag_label(updated)
                )?;
            }
        }

        for (title, ops) in [("Skipped", &sections.skipped), ("Ignored", &sections.ignored)] {
            if ops.is_empty() {
                continue;
            }
            writeln!(writer)?;
            writeln!(writer, "## {}", title)?;
            writeln!(writer)?;
            for op in ops {
                writeln!(
                    writer,
                    "- {} {} ({})",
                    op.package_id,
                    op.previous_version,
                    op.disposition()
                )?;
            }
        }

        if !log.unresolved().is_empty() {
            writeln!(writer)?;
            writeln!(writer, "## Unresolved")?;
            writeln!(writer)?;
            for package in log.unresolved() {
                writeln!(
                    writer,
                    "- {} {} ({})",
                    package.package_id, package.version, package.reason
                )?;
            }
        }

        if !log.errors().is_empty() {
            writeln!(writer)?;
            writeln!(writer, "## Errors")?;
            writeln!(writer)?;
            for error in log.errors() {
                writeln!(writer, "- {}", error)?;
            }
        }

        Ok(())
    }

    /// Write the markdown summary to a file
    pub fn save_extended(
        &self,
        log: &RunLog,
        generated_at: DateTime<Utc>,
        path: &Path,
    ) -> std::io::Result<()> {
        let mut buffer = Vec::new();
        self.write_extended(log, generated_at, &mut buffer)?;
        std::fs::write(path, buffer)
    }
}

fn linked(op: &UpdateOperation, version: &SemanticVersion) -> String {
    let text = format!("{} {}", op.package_id, version);
    match op
        .origin_uri
        .as_deref()
        .and_then(|origin| package_url(origin, &op.package_id, version))
    {
        Some(url) => format!("[{}]({})", text, url),
        None => text,
    }
}

fn name_width(sections: &Sections<'_>, log: &RunLog) -> usize {
    sections
        .updated
        .iter()
        .chain(&sections.downgraded)
        .chain(&sections.skipped)
        .chain(&sections.ignored)
        .map(|op| op.package_id.len())
        .chain(log.unresolved().iter().map(|p| p.package_id.len()))
        .max()
        .unwrap_or(0)
        .max(20)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FeedVersion, UnresolvedReason};
    use chrono::TimeZone;

    const NUGET: &str = "https://api.nuget.org/v3/index.json";
    const PRIVATE: &str = "https://feeds.example.com/v3/index.json";

    fn v(s: &str) -> SemanticVersion {
        SemanticVersion::parse(s).unwrap()
    }

    fn op(id: &str, from: &str, to: &str, origin: &str, file: &str) -> UpdateOperation {
        UpdateOperation::new(id, v(from), &FeedVersion::from_feed(v(to), origin), false)
            .with_file_path(file)
    }

    fn sample_log(dry_run: bool) -> RunLog {
        let mut log = RunLog::new(dry_run);
        log.record(op("Contoso.Core", "1.0.0", "1.1.0-dev.3", NUGET, "A.csproj"));
        log.record(op("Contoso.Core", "1.0.0", "1.1.0-dev.3", NUGET, "B.csproj"));
        log.record(op("Internal.Lib", "2.0.0", "2.1.0", PRIVATE, "A.csproj"));
        log.record(op("Zeta", "3.0.0", "3.0.0", NUGET, "A.csproj"));
        log.record(UpdateOperation::ignored("Legacy", v("1.0.0")));
        log.record_unresolved("Missing", v("0.1.0"), UnresolvedReason::NotFound);
        log.record_error("failed to write B.csproj");
        log
    }

    fn render(reporter: &TextReporter, log: &RunLog) -> String {
        let mut out = Vec::new();
        reporter.write_summary(log, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn plain(verbosity: Verbosity) -> TextReporter {
        TextReporter::new(OutputConfig {
            verbosity,
            color: false,
        })
    }

    #[test]
    fn test_version_change_type() {
        let cases = [
            ("1.0.0", "2.0.0", VersionChangeType::Major),
            ("1.0.0", "1.1.0", VersionChangeType::Minor),
            ("1.0.0", "1.0.1", VersionChangeType::Patch),
            ("1.0.0-dev.1", "1.0.0-dev.2", VersionChangeType::Prerelease),
        ];
        for (old, new, expected) in cases {
            assert_eq!(VersionChangeType::from_versions(&v(old), &v(new)), expected);
        }
    }

    #[test]
    fn test_summary_normal() {
        let output = render(&plain(Verbosity::Normal), &sample_log(false));
        assert!(output.starts_with("2 updated, 0 downgraded, 1 skipped, 1 ignored, 1 unresolved"));
        assert!(output.contains("Updated (2)"));
        assert!(output.contains("1.0.0 → 1.1.0-dev.3 [dev] (minor)"));
        assert!(output.contains("2.0.0 → 2.1.0 [stable] (minor)"));
        assert_eq!(output.matches("Contoso.Core").count(), 1);
        assert!(output.contains("Unresolved (1)"));
        assert!(output.contains("not found on any feed"));
        assert!(output.contains("failed to write B.csproj"));
        assert!(!output.contains("Skipped"));
        assert!(!output.contains("https://"));
    }

    #[test]
    fn test_summary_verbose_lists_skips() {
        let output = render(&plain(Verbosity::Verbose), &sample_log(false));
        assert!(output.contains("Skipped (1)"));
        assert!(output.contains("(already at version)"));
        assert!(output.contains("Ignored (1)"));
    }

    #[test]
    fn test_summary_quiet_and_dry_run() {
        let output = render(&plain(Verbosity::Quiet), &sample_log(true));
        assert_eq!(
            output,
            "(dry-run) 2 updated, 0 downgraded, 1 skipped, 1 ignored, 1 unresolved\n"
        );
    }

    #[test]
    fn test_extended_summary_links() {
        let reporter = plain(Verbosity::Quiet);
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap();
        let mut out = Vec::new();
        reporter
            .write_extended(&sample_log(false), at, &mut out)
            .unwrap();
        let output = String::from_utf8(out).unwrap();

        assert!(output.contains("Generated 2026-03-01 09:30:00 UTC"));
        assert!(output.contains(
            "- [Contoso.Core 1.1.0-dev.3](https://www.nuget.org/packages/Contoso.Core/1.1.0-dev.3) (from 1.0.0) [dev]"
        ));
        assert!(output.contains("- Internal.Lib 2.1.0 (from 2.0.0) [stable]"));
        assert!(output.contains("## Skipped"));
        assert!(output.contains("- Zeta 3.0.0 (already at version)"));
        assert!(output.contains("## Ignored"));
        assert!(output.contains("## Unresolved"));
    }

    #[test]
    fn test_save_extended() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("summary.md");
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap();
        plain(Verbosity::Normal)
            .save_extended(&sample_log(true), at, &path)
            .unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# Package update summary"));
        assert!(content.contains("(dry run, no files written)"));
    }
}
