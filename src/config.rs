//! Run configuration
//!
//! `UpdaterParameters` is built once per run from the command line merged with
//! an optional TOML file, then validated. Values given on the command line win;
//! list values given on the command line replace the file's lists.

use crate::cli::CliArgs;
use crate::domain::{SemanticVersion, VersionOverride, VersionRange};
use crate::error::ConfigError;
use crate::output::ResultEntry;
use reqwest::Url;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Config file looked up in the solution root when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "feedup.toml";

/// Tag used when none is configured
pub const DEFAULT_TAG: &str = "stable";

/// One package feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    pub url: String,
    /// API key or access token; feeds with a credential are private
    pub credential: Option<String>,
}

impl FeedConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            credential: None,
        }
    }

    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    pub fn is_private(&self) -> bool {
        self.credential.is_some()
    }

    /// Host name of the feed, or the raw URL when it has none
    pub fn display_name(&self) -> String {
        Url::parse(&self.url)
            .ok()
            .and_then(|url| url.host_str().map(String::from))
            .unwrap_or_else(|| self.url.clone())
    }
}

/// Parameters of one run, immutable once built
#[derive(Debug, Clone)]
pub struct UpdaterParameters {
    pub root: PathBuf,
    /// Target tags in priority order
    pub tags: Vec<String>,
    pub strict: bool,
    pub allow_downgrade: bool,
    pub feeds: Vec<FeedConfig>,
    /// Applied to public feeds only
    pub author: Option<String>,
    pub ignore: Vec<String>,
    /// When non-empty, every other package is ignored
    pub only: Vec<String>,
    pub dry_run: bool,
    /// Keyed by lowercase package id
    overrides: BTreeMap<String, VersionOverride>,
}

impl UpdaterParameters {
    /// Parameters with defaults: tag `stable`, no feeds, no filters
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            tags: vec![DEFAULT_TAG.to_string()],
            strict: false,
            allow_downgrade: false,
            feeds: Vec::new(),
            author: None,
            ignore: Vec::new(),
            only: Vec::new(),
            dry_run: false,
            overrides: BTreeMap::new(),
        }
    }

    pub fn with_feed(mut self, feed: FeedConfig) -> Self {
        self.feeds.push(feed);
        self
    }

    pub fn with_tags<S: AsRef<str>>(mut self, tags: &[S]) -> Self {
        self.tags = tags.iter().map(|t| t.as_ref().to_string()).collect();
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_allow_downgrade(mut self, allow: bool) -> Self {
        self.allow_downgrade = allow;
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_ignored(mut self, package_id: impl Into<String>) -> Self {
        self.ignore.push(package_id.into());
        self
    }

    pub fn with_only(mut self, package_id: impl Into<String>) -> Self {
        self.only.push(package_id.into());
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Add an override, replacing any earlier one for the same id
    pub fn with_override(mut self, entry: VersionOverride) -> Self {
        self.overrides
            .insert(entry.package_id().to_ascii_lowercase(), entry);
        self
    }

    pub fn override_for(&self, package_id: &str) -> Option<&VersionOverride> {
        self.overrides.get(&package_id.to_ascii_lowercase())
    }

    pub fn overrides(&self) -> impl Iterator<Item = &VersionOverride> {
        self.overrides.values()
    }

    /// Returns true when the package is excluded from resolution
    pub fn is_excluded(&self, package_id: &str) -> bool {
        let listed = |list: &[String]| list.iter().any(|p| p.eq_ignore_ascii_case(package_id));
        listed(&self.ignore) || (!self.only.is_empty() && !listed(&self.only))
    }

    /// Check the parameters before any file or feed work starts
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.root.is_dir() {
            return Err(ConfigError::MissingRoot {
                path: self.root.clone(),
            });
        }
        if self.feeds.is_empty() {
            return Err(ConfigError::NoFeeds);
        }
        for feed in &self.feeds {
            Url::parse(&feed.url).map_err(|e| ConfigError::InvalidFeedUrl {
                url: feed.url.clone(),
                message: e.to_string(),
            })?;
        }
        Ok(())
    }

    /// Build and validate parameters from the command line
    pub fn from_args(args: &CliArgs) -> Result<Self, ConfigError> {
        let root = args.path.clone();
        if !root.is_dir() {
            return Err(ConfigError::MissingRoot { path: root });
        }

        let file = match &args.config {
            Some(path) => load_config_file(path)?,
            None => {
                let default = root.join(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    load_config_file(&default)?
                } else {
                    ConfigFile::default()
                }
            }
        };

        let mut params = Self::new(root);
        params.strict = args.strict || file.strict.unwrap_or(false);
        params.allow_downgrade = args.allow_downgrade || file.allow_downgrade.unwrap_or(false);
        params.author = args.author.clone().or(file.author);
        params.dry_run = args.dry_run;
        params.ignore = prefer(&args.ignore, file.ignore);
        params.only = prefer(&args.only, file.only);

        let tags = prefer(&args.tags, file.tags);
        if !tags.is_empty() {
            params.tags = tags;
        }

        if args.feeds.is_empty() {
            for feed in file.feeds {
                params.feeds.push(feed.resolve()?);
            }
        } else {
            params.feeds = args.feeds.iter().map(FeedConfig::new).collect();
        }

        for (package_id, entry) in file.overrides {
            let parsed = parse_override(&package_id, &entry.version, entry.force)?;
            params = params.with_override(parsed);
        }
        if let Some(path) = &args.overrides {
            for parsed in load_overrides_file(path)? {
                params = params.with_override(parsed);
            }
        }

        params.validate()?;
        Ok(params)
    }
}

fn prefer(cli: &[String], file: Vec<String>) -> Vec<String> {
    if cli.is_empty() {
        file
    } else {
        cli.to_vec()
    }
}

/// TOML config file
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub tags: Vec<String>,
    pub strict: Option<bool>,
    pub allow_downgrade: Option<bool>,
    pub author: Option<String>,
    pub ignore: Vec<String>,
    pub only: Vec<String>,
    pub feeds: Vec<FeedEntry>,
    pub overrides: BTreeMap<String, OverrideEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeedEntry {
    pub url: String,
    #[serde(default)]
    pub credential: Option<String>,
    /// Environment variable holding the credential
    #[serde(default)]
    pub credential_env: Option<String>,
}

impl FeedEntry {
    fn resolve(self) -> Result<FeedConfig, ConfigError> {
        let mut feed = FeedConfig::new(self.url);
        if let Some(credential) = self.credential {
            feed = feed.with_credential(credential);
        } else if let Some(variable) = self.credential_env {
            let credential =
                std::env::var(&variable).map_err(|_| ConfigError::MissingCredential {
                    feed: feed.display_name(),
                    variable,
                })?;
            feed = feed.with_credential(credential);
        }
        Ok(feed)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OverrideEntry {
    /// Exact version or interval range
    pub version: String,
    #[serde(default)]
    pub force: bool,
}

/// Read a TOML config file
pub fn load_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::InvalidConfigFile {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    toml::from_str(&content).map_err(|e| ConfigError::InvalidConfigFile {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Read a result list written by an earlier run as forced overrides
pub fn load_overrides_file(path: &Path) -> Result<Vec<VersionOverride>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::InvalidConfigFile {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let entries: Vec<ResultEntry> =
        serde_json::from_str(&content).map_err(|e| ConfigError::InvalidConfigFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    Ok(entries
        .into_iter()
        .map(|entry| VersionOverride::force(entry.package_id, entry.updated_version))
        .collect())
}

/// Parse one override value
///
/// A forced override takes an exact version (or a range whose inclusive lower
/// bound is used verbatim); otherwise the value is a range filter.
pub fn parse_override(
    package_id: &str,
    value: &str,
    force: bool,
) -> Result<VersionOverride, ConfigError> {
    let range_error = |message: String| ConfigError::InvalidRange {
        package: package_id.to_string(),
        value: value.to_string(),
        message,
    };

    if !force {
        let range = VersionRange::parse(value).map_err(|e| range_error(e.message))?;
        return Ok(VersionOverride::range(package_id, range));
    }

    if let Ok(version) = SemanticVersion::parse(value) {
        return Ok(VersionOverride::force(package_id, version));
    }

    let range = VersionRange::parse(value).map_err(|e| range_error(e.message))?;
    VersionOverride::forced_range(package_id, range).ok_or_else(|| ConfigError::InvalidVersion {
        value: value.to_string(),
        message: "a forced range needs an inclusive lower bound".to_string(),
    })
}
