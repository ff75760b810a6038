//! CLI argument parsing module for feedup

use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Reject blank package ids and ids containing whitespace
fn parse_package_id(s: &str) -> Result<String, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty package id".to_string());
    }
    if s.chars().any(char::is_whitespace) {
        return Err(format!("invalid package id: {}", s));
    }
    Ok(s.to_string())
}

/// Tag-aware package reference updater
#[derive(Parser, Debug, Clone)]
#[command(
    name = "feedup",
    version,
    about = "Update package references to the best version available on your feeds"
)]
pub struct CliArgs {
    /// Solution root directory (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    // Feeds and selection policy
    /// Package feed service index URL (can be specified multiple times)
    #[arg(long = "feed", value_name = "URL", action = ArgAction::Append)]
    pub feeds: Vec<String>,

    /// Target tag in order of preference, e.g. `dev` or `stable` (can be specified multiple times)
    #[arg(long = "tag", value_name = "TAG", action = ArgAction::Append)]
    pub tags: Vec<String>,

    /// Only match versions with exactly `tag.N` pre-release labels
    #[arg(long)]
    pub strict: bool,

    /// Allow moving a reference to a lower version
    #[arg(long)]
    pub allow_downgrade: bool,

    /// Only consider versions published by this author on public feeds
    #[arg(long)]
    pub author: Option<String>,

    // Package filters
    /// Leave a package untouched (can be specified multiple times)
    #[arg(long, value_parser = parse_package_id, action = ArgAction::Append)]
    pub ignore: Vec<String>,

    /// Update only specific packages (can be specified multiple times)
    #[arg(long, value_parser = parse_package_id, action = ArgAction::Append)]
    pub only: Vec<String>,

    // Configuration files
    /// Config file (default: feedup.toml in the solution root, if present)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// JSON result list from an earlier run; pins those versions
    #[arg(long, value_name = "FILE")]
    pub overrides: Option<PathBuf>,

    // General options
    /// Dry run mode - show what would be updated without making changes
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable quiet mode - minimal output
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    // Report files
    /// Write a markdown summary with package links to this file
    #[arg(long, value_name = "FILE")]
    pub summary_file: Option<PathBuf>,

    /// Write the JSON list of changed packages to this file
    #[arg(long, value_name = "FILE")]
    pub results_file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_default_args() {
        let args = CliArgs::parse_from(["feedup"]);
        assert_eq!(args.path, PathBuf::from("."));
        assert!(args.feeds.is_empty());
        assert!(args.tags.is_empty());
        assert!(!args.strict);
        assert!(!args.allow_downgrade);
        assert!(args.author.is_none());
        assert!(args.ignore.is_empty());
        assert!(args.only.is_empty());
        assert!(args.config.is_none());
        assert!(args.overrides.is_none());
        assert!(!args.dry_run);
        assert!(!args.verbose);
        assert!(!args.quiet);
        assert!(!args.no_color);
        assert!(args.summary_file.is_none());
        assert!(args.results_file.is_none());
    }

    #[test]
    fn test_path_argument() {
        let args = CliArgs::parse_from(["feedup", "/some/solution"]);
        assert_eq!(args.path, PathBuf::from("/some/solution"));
    }

    #[test]
    fn test_dry_run_flags() {
        assert!(CliArgs::parse_from(["feedup", "-n"]).dry_run);
        assert!(CliArgs::parse_from(["feedup", "--dry-run"]).dry_run);
    }

    #[test]
    fn test_quiet_flags() {
        assert!(CliArgs::parse_from(["feedup", "-q"]).quiet);
        assert!(CliArgs::parse_from(["feedup", "--quiet"]).quiet);
    }

    #[test]
    fn test_feeds_and_tags_keep_order() {
        let args = CliArgs::parse_from([
            "feedup",
            "--feed",
            "https://a.example/v3/index.json",
            "--tag",
            "dev",
            "--feed",
            "https://b.example/v3/index.json",
            "--tag",
            "stable",
        ]);
        assert_eq!(
            args.feeds,
            vec![
                "https://a.example/v3/index.json",
                "https://b.example/v3/index.json"
            ]
        );
        assert_eq!(args.tags, vec!["dev", "stable"]);
    }

    #[test]
    fn test_policy_flags() {
        let args = CliArgs::parse_from([
            "feedup",
            "--strict",
            "--allow-downgrade",
            "--author",
            "contoso",
        ]);
        assert!(args.strict);
        assert!(args.allow_downgrade);
        assert_eq!(args.author.as_deref(), Some("contoso"));
    }

    #[test]
    fn test_report_files() {
        let args = CliArgs::parse_from([
            "feedup",
            "--summary-file",
            "summary.md",
            "--results-file",
            "results.json",
            "--overrides",
            "pinned.json",
        ]);
        assert_eq!(args.summary_file, Some(PathBuf::from("summary.md")));
        assert_eq!(args.results_file, Some(PathBuf::from("results.json")));
        assert_eq!(args.overrides, Some(PathBuf::from("pinned.json")));
    }

    #[test]
    fn test_package_id_parser() {
        assert_eq!(parse_package_id(" Contoso.Core "), Ok("Contoso.Core".to_string()));
        assert!(parse_package_id("").is_err());
        assert!(parse_package_id("two words").is_err());
        assert!(CliArgs::try_parse_from(["feedup", "--ignore", ""]).is_err());
    }

    #[test]
    fn test_unknown_flag_is_rejected() {
        assert!(CliArgs::try_parse_from(["feedup", "--bogus"]).is_err());
    }
}
