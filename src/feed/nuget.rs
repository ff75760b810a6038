//! NuGet v3 feed gateway
//!
//! Resources are discovered from the service index (`.../v3/index.json`):
//! - `PackageBaseAddress/3.0.0`: version listing and `.nupkg` download
//! - `SearchQueryService`: author-filtered listing on public feeds
//! - `RegistrationsBaseUrl`: dependency groups
//! - `PackagePublish/2.0.0`: push

use crate::domain::{FeedVersion, PackageIdentity, SemanticVersion, VersionRange};
use crate::error::FeedError;
use crate::feed::client::check_status;
use crate::feed::{
    cancellable, normalized_version, package_file_name, DependencyGroups, FeedGateway, HttpClient,
    LocalPackage,
};
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Target framework key used when a dependency group names none
const ANY_FRAMEWORK: &str = "any";

/// NuGet v3 gateway
pub struct NuGetFeed {
    name: String,
    uri: String,
    client: HttpClient,
    index: OnceCell<ServiceIndex>,
}

/// Service index response
#[derive(Debug, Deserialize)]
struct ServiceIndexResponse {
    resources: Vec<ServiceResource>,
}

#[derive(Debug, Deserialize)]
struct ServiceResource {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@type")]
    kind: String,
}

/// Resource URLs used by this gateway
#[derive(Debug, Default, Clone)]
struct ServiceIndex {
    package_base: Option<String>,
    search: Option<String>,
    registrations: Option<String>,
    publish: Option<String>,
}

impl ServiceIndex {
    fn from_resources(resources: &[ServiceResource]) -> Self {
        let find = |prefix: &str| {
            resources
                .iter()
                .find(|r| r.kind.starts_with(prefix))
                .map(|r| r.id.trim_end_matches('/').to_string())
        };

        let registrations = resources
            .iter()
            .find(|r| r.kind == "RegistrationsBaseUrl/3.6.0")
            .map(|r| r.id.trim_end_matches('/').to_string())
            .or_else(|| find("RegistrationsBaseUrl"));

        Self {
            package_base: find("PackageBaseAddress"),
            search: find("SearchQueryService"),
            registrations,
            publish: find("PackagePublish"),
        }
    }
}

/// Flat container version list
#[derive(Debug, Deserialize)]
struct VersionListResponse {
    versions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    data: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    id: String,
    #[serde(default)]
    authors: Option<Authors>,
    #[serde(default)]
    versions: Vec<SearchVersion>,
}

/// Feeds return authors either as one string or as a list
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Authors {
    One(String),
    Many(Vec<String>),
}

impl Authors {
    fn contains(&self, author: &str) -> bool {
        let matches = |candidate: &str| {
            candidate
                .split(',')
                .any(|a| a.trim().eq_ignore_ascii_case(author))
        };
        match self {
            Authors::One(a) => matches(a),
            Authors::Many(list) => list.iter().any(|a| matches(a)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchVersion {
    version: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegistrationLeaf {
    catalog_entry: CatalogEntryRef,
}

/// Registration leaves either inline the catalog entry or link to it
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogEntryRef {
    Url(String),
    Inline(CatalogEntry),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogEntry {
    #[serde(default)]
    dependency_groups: Vec<DependencyGroup>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DependencyGroup {
    #[serde(default)]
    target_framework: Option<String>,
    #[serde(default)]
    dependencies: Vec<DependencyEntry>,
}

#[derive(Debug, Deserialize)]
struct DependencyEntry {
    id: String,
    #[serde(default)]
    range: Option<String>,
}

impl NuGetFeed {
    /// Create a gateway for the service index at `uri`
    pub fn new(name: impl Into<String>, uri: impl Into<String>, client: HttpClient) -> Self {
        Self {
            name: name.into(),
            uri: uri.into(),
            client,
            index: OnceCell::new(),
        }
    }

    async fn service_index(&self) -> Result<&ServiceIndex, FeedError> {
        self.index
            .get_or_try_init(|| async {
                let response: ServiceIndexResponse = self
                    .client
                    .get_json(&self.uri, "", &self.name)
                    .await
                    .map_err(|e| FeedError::service_index(&self.name, e))?;
                let index = ServiceIndex::from_resources(&response.resources);
                debug!("{}: service index loaded ({:?})", self.name, index);
                Ok::<_, FeedError>(index)
            })
            .await
    }

    fn require<'a>(
        &self,
        resource: &'a Option<String>,
        kind: &str,
        package: &str,
    ) -> Result<&'a str, FeedError> {
        resource.as_deref().ok_or_else(|| {
            FeedError::invalid_response(
                package,
                &self.name,
                format!("service index has no {} resource", kind),
            )
        })
    }

    async fn list_versions(&self, package_id: &str) -> Result<Vec<String>, FeedError> {
        let index = self.service_index().await?;
        let base = self.require(&index.package_base, "PackageBaseAddress", package_id)?;
        let url = format!("{}/{}/index.json", base, package_id.to_ascii_lowercase());
        let response: VersionListResponse =
            self.client.get_json(&url, package_id, &self.name).await?;
        Ok(response.versions)
    }

    async fn search_versions(
        &self,
        package_id: &str,
        author: &str,
    ) -> Result<Vec<String>, FeedError> {
        let index = self.service_index().await?;
        let search = self.require(&index.search, "SearchQueryService", package_id)?;
        let query = format!("packageid:{}", package_id);
        let url = Url::parse_with_params(
            search,
            &[
                ("q", query.as_str()),
                ("prerelease", "true"),
                ("semVerLevel", "2.0.0"),
            ],
        )
        .map_err(|e| FeedError::invalid_response(package_id, &self.name, e.to_string()))?;

        let response: SearchResponse = self
            .client
            .get_json(url.as_str(), package_id, &self.name)
            .await?;

        Ok(response
            .data
            .into_iter()
            .filter(|r| r.id.eq_ignore_ascii_case(package_id))
            .filter(|r| r.authors.as_ref().is_some_and(|a| a.contains(author)))
            .flat_map(|r| r.versions.into_iter().map(|v| v.version))
            .collect())
    }

    async fn catalog_entry(&self, identity: &PackageIdentity) -> Result<CatalogEntry, FeedError> {
        let index = self.service_index().await?;
        let registrations = self.require(&index.registrations, "RegistrationsBaseUrl", &identity.id)?;
        let url = format!(
            "{}/{}/{}.json",
            registrations,
            identity.id.to_ascii_lowercase(),
            normalized_version(identity)
        );
        let package = identity.to_string();
        let leaf: RegistrationLeaf = self.client.get_json(&url, &package, &self.name).await?;

        match leaf.catalog_entry {
            CatalogEntryRef::Inline(entry) => Ok(entry),
            CatalogEntryRef::Url(url) => self.client.get_json(&url, &package, &self.name).await,
        }
    }

    fn parse_versions(&self, package_id: &str, raw: Vec<String>) -> Vec<FeedVersion> {
        let mut seen = HashSet::with_capacity(raw.len());
        let mut versions: Vec<FeedVersion> = Vec::with_capacity(raw.len());
        for value in raw {
            match SemanticVersion::parse(&value) {
                Ok(version) if seen.insert(version.clone()) => {
                    versions.push(FeedVersion::from_feed(version, &self.uri));
                }
                Ok(_) => {}
                Err(e) => debug!("{}: skipping {} version: {}", self.name, package_id, e),
            }
        }
        versions
    }
}

/// Lowest version a dependency range admits
fn dependency_version(range: Option<&str>) -> Option<SemanticVersion> {
    let range = VersionRange::parse(range?).ok()?;
    range.min().map(|bound| bound.version.clone())
}

#[async_trait]
impl FeedGateway for NuGetFeed {
    fn name(&self) -> &str {
        &self.name
    }

    fn uri(&self) -> &str {
        &self.uri
    }

    fn is_private(&self) -> bool {
        self.client.has_credential()
    }

    async fn get_versions(
        &self,
        package_id: &str,
        author: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Vec<FeedVersion>, FeedError> {
        cancellable(cancel, &self.name, async {
            let raw = match author.filter(|_| !self.is_private()) {
                Some(author) => self.search_versions(package_id, author).await?,
                None => self.list_versions(package_id).await?,
            };

            let versions = self.parse_versions(package_id, raw);
            if versions.is_empty() {
                return Err(FeedError::package_not_found(package_id, &self.name));
            }
            debug!("{}: {} versions of {}", self.name, versions.len(), package_id);
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
            let entry = self.catalog_entry(identity).await?;
            let mut groups = DependencyGroups::new();

            for group in entry.dependency_groups {
                let framework = group
                    .target_framework
                    .filter(|f| !f.is_empty())
                    .unwrap_or_else(|| ANY_FRAMEWORK.to_string());
                let dependencies = groups.entry(framework).or_default();
                for dependency in group.dependencies {
                    match dependency_version(dependency.range.as_deref()) {
                        Some(version) => {
                            dependencies.insert(PackageIdentity::new(dependency.id, version));
                        }
                        None => debug!(
                            "{}: dependency {} of {} has no lower bound",
                            self.name, dependency.id, identity
                        ),
                    }
                }
            }
            Ok(groups)
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
            let index = self.service_index().await?;
            let base = self.require(&index.package_base, "PackageBaseAddress", &identity.id)?;
            let id = identity.id.to_ascii_lowercase();
            let version = normalized_version(identity);
            let url = format!("{}/{}/{}/{}.{}.nupkg", base, id, version, id, version);

            let content = match self
                .client
                .get_bytes(&url, &identity.to_string(), &self.name)
                .await
            {
                Ok(content) => content,
                Err(e) if e.is_not_found() => return Ok(None),
                Err(e) => return Err(e),
            };

            tokio::fs::create_dir_all(destination)
                .await
                .map_err(|source| FeedError::Io {
                    path: destination.to_path_buf(),
                    source,
                })?;
            let path = destination.join(package_file_name(identity));
            tokio::fs::write(&path, content)
                .await
                .map_err(|source| FeedError::Io {
                    path: path.clone(),
                    source,
                })?;

            Ok(Some(LocalPackage {
                identity: identity.clone(),
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
            let index = self.service_index().await?;
            let name = package.identity.to_string();
            let publish = self.require(&index.publish, "PackagePublish", &name)?;

            let content = tokio::fs::read(&package.path)
                .await
                .map_err(|source| FeedError::Io {
                    path: package.path.clone(),
                    source,
                })?;
            let response = self
                .client
                .put_package(
                    publish,
                    package_file_name(&package.identity),
                    content,
                    &name,
                    &self.name,
                )
                .await?;

            if response.status() == StatusCode::CONFLICT {
                debug!("{}: {} already present", self.name, name);
                return Ok(false);
            }
            check_status(response, &name, &self.name)?;
            Ok(true)
        })
        .await
    }
}
