//! Package feed gateways
//!
//! This module provides:
//! - The `FeedGateway` capability consumed by the resolver
//! - HTTP client shared foundation with retry logic
//! - NuGet v3 protocol gateway
//! - In-memory gateway for tests and offline runs

mod client;
mod memory;
mod nuget;

pub use client::HttpClient;
pub use memory::InMemoryFeed;
pub use nuget::NuGetFeed;

use crate::config::FeedConfig;
use crate::domain::{FeedVersion, PackageIdentity};
use crate::error::FeedError;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Dependencies of one package version, keyed by target framework
pub type DependencyGroups = BTreeMap<String, BTreeSet<PackageIdentity>>;

/// A package file on local disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalPackage {
    pub identity: PackageIdentity,
    pub path: PathBuf,
}

/// A remote source of package versions
///
/// Every call is cancellable through the run's token. A lookup for a package
/// the feed does not know fails with `FeedError::PackageNotFound`, which
/// callers treat as "nothing from this feed".
#[async_trait]
pub trait FeedGateway: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// The feed URI, recorded as the origin of every version it returns
    fn uri(&self) -> &str;

    /// Private (trusted) feeds ignore the author filter
    fn is_private(&self) -> bool;

    /// Every known version of a package
    async fn get_versions(
        &self,
        package_id: &str,
        author: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Vec<FeedVersion>, FeedError>;

    /// Direct dependencies of one package version
    async fn get_dependencies(
        &self,
        identity: &PackageIdentity,
        cancel: &CancellationToken,
    ) -> Result<DependencyGroups, FeedError>;

    /// Download one exact version into `destination`; `None` when absent
    async fn download_package(
        &self,
        identity: &PackageIdentity,
        destination: &Path,
        cancel: &CancellationToken,
    ) -> Result<Option<LocalPackage>, FeedError>;

    /// Publish a package; `false` when that version is already present
    async fn push_package(
        &self,
        package: &LocalPackage,
        cancel: &CancellationToken,
    ) -> Result<bool, FeedError>;
}

/// Create the gateway for a configured feed
pub fn create_gateway(feed: &FeedConfig, client: &HttpClient) -> Arc<dyn FeedGateway> {
    let client = client.clone().with_credential(feed.credential.clone());
    Arc::new(NuGetFeed::new(feed.display_name(), &feed.url, client))
}

/// Race a feed request against cancellation
pub(crate) async fn cancellable<T, F>(
    cancel: &CancellationToken,
    feed: &str,
    request: F,
) -> Result<T, FeedError>
where
    F: Future<Output = Result<T, FeedError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(FeedError::cancelled(feed)),
        result = request => result,
    }
}

/// File name used for a downloaded package
pub(crate) fn package_file_name(identity: &PackageIdentity) -> String {
    format!(
        "{}.{}.nupkg",
        identity.id.to_ascii_lowercase(),
        normalized_version(identity)
    )
}

/// Lowercase version without build metadata, as feeds address it
pub(crate) fn normalized_version(identity: &PackageIdentity) -> String {
    let v = &identity.version;
    let mut s = format!("{}.{}.{}", v.major(), v.minor(), v.patch());
    if v.is_prerelease() {
        s.push('-');
        s.push_str(v.prerelease());
    }
    s.to_ascii_lowercase()
}
