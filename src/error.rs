//! Application error types using thiserror
//!
//! Error hierarchy:
//! - FeedError: Issues with package feed communication
//! - CatalogError: Issues reading, parsing, or writing referencing files
//! - ConfigError: Invalid or incomplete run configuration (fatal)

use std::path::PathBuf;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Package feed related errors
    #[error(transparent)]
    Feed(#[from] FeedError),

    /// Configuration related errors
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors related to package feed communication
#[derive(Error, Debug)]
pub enum FeedError {
    /// Package (or the exact version) is absent from the feed
    #[error("package '{package}' not found in feed {feed}")]
    PackageNotFound { package: String, feed: String },

    /// Network request failed
    #[error("failed to fetch '{package}' from {feed}: {message}")]
    Network {
        package: String,
        feed: String,
        message: String,
    },

    /// Rate limit exceeded
    #[error("rate limit exceeded for feed {feed}")]
    RateLimitExceeded { feed: String },

    /// Invalid response from feed
    #[error("invalid response from {feed} for '{package}': {message}")]
    InvalidResponse {
        package: String,
        feed: String,
        message: String,
    },

    /// Timeout
    #[error("timeout while fetching '{package}' from {feed}")]
    Timeout { package: String, feed: String },

    /// Authentication error
    #[error("authentication failed for {feed}: {message}")]
    Authentication { feed: String, message: String },

    /// Service index could not be loaded; the feed itself is unusable
    #[error("service index unavailable for {feed}: {message}")]
    ServiceIndex { feed: String, message: String },

    /// The run was cancelled while the request was pending
    #[error("request to {feed} cancelled")]
    Cancelled { feed: String },

    /// Local file handling for a download or push failed
    #[error("package file error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors related to referencing files
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Failed to read a referencing file
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a referencing file
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A version string could not be parsed as a semantic version
    #[error("invalid version '{version}' for '{package}' in {path}")]
    InvalidVersion {
        path: PathBuf,
        package: String,
        version: String,
    },

    /// File does not belong to any supported category
    #[error("unsupported file: {path}")]
    UnsupportedFile { path: PathBuf },
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Solution root is missing or not a directory
    #[error("solution root not found: {path}")]
    MissingRoot { path: PathBuf },

    /// No feed was configured
    #[error("no package feed configured: pass --feed or add [[feeds]] to the config file")]
    NoFeeds,

    /// Override range could not be parsed
    #[error("invalid version range '{value}' for '{package}': {message}")]
    InvalidRange {
        package: String,
        value: String,
        message: String,
    },

    /// Version value could not be parsed
    #[error("invalid version '{value}': {message}")]
    InvalidVersion { value: String, message: String },

    /// Config or override file could not be read or parsed
    #[error("invalid config file {path}: {message}")]
    InvalidConfigFile { path: PathBuf, message: String },

    /// Credential environment variable is not set
    #[error("credential variable '{variable}' for feed {feed} is not set")]
    MissingCredential { feed: String, variable: String },

    /// Feed URL could not be parsed
    #[error("invalid feed url '{url}': {message}")]
    InvalidFeedUrl { url: String, message: String },
}

impl FeedError {
    /// Creates a new PackageNotFound error
    pub fn package_not_found(package: impl Into<String>, feed: impl Into<String>) -> Self {
        FeedError::PackageNotFound {
            package: package.into(),
            feed: feed.into(),
        }
    }

    /// Creates a new Network error
    pub fn network(
        package: impl Into<String>,
        feed: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        FeedError::Network {
            package: package.into(),
            feed: feed.into(),
            message: message.into(),
        }
    }

    /// Creates a new InvalidResponse error
    pub fn invalid_response(
        package: impl Into<String>,
        feed: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        FeedError::InvalidResponse {
            package: package.into(),
            feed: feed.into(),
            message: message.into(),
        }
    }

    /// Creates a new Cancelled error
    pub fn cancelled(feed: impl Into<String>) -> Self {
        FeedError::Cancelled { feed: feed.into() }
    }

    /// Wraps a failure to load the service index, keeping cancellations as they are
    pub fn service_index(feed: impl Into<String>, source: FeedError) -> Self {
        match source {
            FeedError::Cancelled { .. } => source,
            other => FeedError::ServiceIndex {
                feed: feed.into(),
                message: other.to_string(),
            },
        }
    }

    /// Returns true when the error only means "this feed has nothing for the lookup"
    pub fn is_not_found(&self) -> bool {
        matches!(self, FeedError::PackageNotFound { .. })
    }
}

impl CatalogError {
    /// Creates a new Read error
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CatalogError::Read {
            path: path.into(),
            source,
        }
    }

    /// Creates a new Write error
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CatalogError::Write {
            path: path.into(),
            source,
        }
    }
}
