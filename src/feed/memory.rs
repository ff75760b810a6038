//! In-memory feed gateway
//!
//! Holds packages in maps keyed by lowercase id. Used by tests and by
//! dry experiments against a fixed version set.

use crate::domain::{FeedVersion, PackageIdentity, SemanticVersion};
use crate::error::FeedError;
use crate::feed::{cancellable, package_file_name, DependencyGroups, FeedGateway, LocalPackage};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::warn;

#[derive(Debug, Clone)]
struct StoredPackage {
    identity: PackageIdentity,
    author: Option<String>,
    dependencies: DependencyGroups,
    content: Vec<u8>,
}

/// Feed gateway backed by memory
pub struct InMemoryFeed {
    name: String,
    uri: String,
    private: bool,
    failure: Option<String>,
    packages: Mutex<BTreeMap<String, Vec<StoredPackage>>>,
    version_queries: AtomicUsize,
}

impl InMemoryFeed {
    /// Create an empty public feed
    pub fn new(name: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uri: uri.into(),
            private: false,
            failure: None,
            packages: Mutex::new(BTreeMap::new()),
            version_queries: AtomicUsize::new(0),
        }
    }

    /// Mark the feed as private (author filter ignored)
    pub fn private(mut self) -> Self {
        self.private = true;
        self
    }

    /// Make every call fail with a network error
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Add a version without author information
    pub fn with_version(self, id: &str, version: &str) -> Self {
        self.insert(id, version, None);
        self
    }

    /// Add several versions of one package
    pub fn with_versions(self, id: &str, versions: &[&str]) -> Self {
        for version in versions {
            self.insert(id, version, None);
        }
        self
    }

    /// Add a version published by `author`
    pub fn with_authored_version(self, id: &str, version: &str, author: &str) -> Self {
        self.insert(id, version, Some(author));
        self
    }

    /// Add a dependency of `id@version` for `framework`
    pub fn with_dependency(
        self,
        id: &str,
        version: &str,
        framework: &str,
        dependency: PackageIdentity,
    ) -> Self {
        let Some(parsed) = parse(version) else {
            return self;
        };
        if let Ok(mut packages) = self.packages.lock() {
            if let Some(stored) = packages
                .get_mut(&id.to_ascii_lowercase())
                .and_then(|list| list.iter_mut().find(|p| p.identity.version == parsed))
            {
                stored
                    .dependencies
                    .entry(framework.to_string())
                    .or_default()
                    .insert(dependency);
            }
        }
        self
    }

    /// Number of `get_versions` calls served so far
    pub fn version_queries(&self) -> usize {
        self.version_queries.load(Ordering::SeqCst)
    }

    fn insert(&self, id: &str, version: &str, author: Option<&str>) {
        let Some(version) = parse(version) else {
            return;
        };
        let stored = StoredPackage {
            content: format!("{} {}", id, version).into_bytes(),
            identity: PackageIdentity::new(id, version),
            author: author.map(String::from),
            dependencies: DependencyGroups::new(),
        };
        if let Ok(mut packages) = self.packages.lock() {
            packages
                .entry(id.to_ascii_lowercase())
                .or_default()
                .push(stored);
        }
    }

    fn find(&self, identity: &PackageIdentity) -> Option<StoredPackage> {
        let packages = self.packages.lock().ok()?;
        packages
            .get(&identity.id.to_ascii_lowercase())?
            .iter()
            .find(|p| p.identity.version == identity.version)
            .cloned()
    }

    fn check_failure(&self, package: &str) -> Result<(), FeedError> {
        match &self.failure {
            Some(message) => Err(FeedError::network(package, &self.name, message.clone())),
            None => Ok(()),
        }
    }
}

fn parse(version: &str) -> Option<SemanticVersion> {
    match SemanticVersion::parse(version) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("in-memory feed ignores invalid version: {}", e);
            None
        }
    }
}

#[async_trait]
impl FeedGateway for InMemoryFeed {
    fn name(&self) -> &str {
        &self.name
    }

    fn uri(&self) -> &str {
        &self.uri
    }

    fn is_private(&self) -> bool {
        self.private
    }

    async fn get_versions(
        &self,
        package_id: &str,
        author: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Vec<FeedVersion>, FeedError> {
        self.version_queries.fetch_add(1, Ordering::SeqCst);
        cancellable(cancel, &self.name, async {
            self.check_failure(package_id)?;

            let author = author.filter(|_| !self.private);
            let packages = self
                .packages
                .lock()
                .map_err(|e| FeedError::network(package_id, &self.name, e.to_string()))?;

            let versions: Vec<FeedVersion> = packages
                .get(&package_id.to_ascii_lowercase())
                .map(|list| {
                    list.iter()
                        .filter(|p| match author {
                            Some(author) => p
                                .author
                                .as_deref()
                                .is_some_and(|a| a.eq_ignore_ascii_case(author)),
                            None => true,
                        })
                        .map(|p| FeedVersion::from_feed(p.identity.version.clone(), &self.uri))
                        .collect()
                })
                .unwrap_or_default();

            if versions.is_empty() {
                return Err(FeedError::package_not_found(package_id, &self.name));
            }
            Ok(versions)
        })
        .await
    }

    async fn get_dependencies(
        &self,
        identity: &PackageIdentity,
        cancel: &CancellationToken,
    ) -> Result<DependencyGroups, FeedError> {
        cancellable(cancel, &self.name, async {
            self.check_failure(&identity.id)?;
            self.find(identity)
                .map(|p| p.dependencies)
                .ok_or_else(|| FeedError::package_not_found(identity.to_string(), &self.name))
        })
        .await
    }

    async fn download_package(
        &self,
        identity: &PackageIdentity,
        destination: &Path,
        cancel: &CancellationToken,
    ) -> Result<Option<LocalPackage>, FeedError> {
        cancellable(cancel, &self.name, async {
            self.check_failure(&identity.id)?;
            let Some(stored) = self.find(identity) else {
                return Ok(None);
            };

            let path = destination.join(package_file_name(identity));
            tokio::fs::create_dir_all(destination)
                .await
                .map_err(|source| FeedError::Io {
                    path: destination.to_path_buf(),
                    source,
                })?;
            tokio::fs::write(&path, &stored.content)
                .await
                .map_err(|source| FeedError::Io {
                    path: path.clone(),
                    source,
                })?;

            Ok(Some(LocalPackage {
                identity: stored.identity,
                path,
            }))
        })
        .await
    }

    async fn push_package(
        &self,
        package: &LocalPackage,
        cancel: &CancellationToken,
    ) -> Result<bool, FeedError> {
        cancellable(cancel, &self.name, async {
            self.check_failure(&package.identity.id)?;
            if self.find(&package.identity).is_some() {
                return Ok(false);
            }

            let content = tokio::fs::read(&package.path)
                .await
                .map_err(|source| FeedError::Io {
                    path: package.path.clone(),
                    source,
                })?;
            let mut packages = self
                .packages
                .lock()
                .map_err(|e| FeedError::network(&package.identity.id, &self.name, e.to_string()))?;
            packages
                .entry(package.identity.id.to_ascii_lowercase())
                .or_default()
                .push(StoredPackage {
                    identity: package.identity.clone(),
                    author: None,
                    dependencies: DependencyGroups::new(),
                    content,
                });
            Ok(true)
        })
        .await
    }
}
