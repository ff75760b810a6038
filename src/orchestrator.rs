//! Update orchestrator for coordinating one run
//!
//! This module provides:
//! - Workflow coordination: scan → resolve → apply → persist
//! - Ignore and update-only filtering
//! - Dry-run mode support
//! - Cooperative cancellation; nothing is written once cancelled
//! - Error handling with partial continuation

use crate::apply::{ApplyOutcome, UpdateApplier};
use crate::catalog::scan_catalog;
use crate::config::UpdaterParameters;
use crate::domain::{RunLog, UnresolvedReason, UpdateOperation};
use crate::error::AppError;
use crate::feed::{create_gateway, FeedGateway, HttpClient};
use crate::progress::Progress;
use crate::resolve::{Resolution, VersionResolver};
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Orchestrator for coordinating the update workflow
pub struct Orchestrator {
    params: UpdaterParameters,
    /// In configuration order
    feeds: Vec<Arc<dyn FeedGateway>>,
    show_progress: bool,
}

/// Result of running the orchestrator
#[derive(Debug)]
pub struct OrchestratorResult {
    /// Every decision made during the run
    pub log: RunLog,
    /// Files written (or that would be written)
    pub outcome: ApplyOutcome,
    /// Number of distinct (id, version) references found
    pub references: usize,
    /// Whether the run stopped early
    pub cancelled: bool,
}

impl Orchestrator {
    /// Create an orchestrator talking to the configured feeds over HTTP
    pub fn new(params: UpdaterParameters) -> Result<Self, AppError> {
        params.validate()?;
        let client = HttpClient::new()?;
        let feeds = params
            .feeds
            .iter()
            .map(|feed| create_gateway(feed, &client))
            .collect();
        Ok(Self::with_feeds(params, feeds))
    }

    /// Create an orchestrator with custom gateways (for testing)
    pub fn with_feeds(params: UpdaterParameters, feeds: Vec<Arc<dyn FeedGateway>>) -> Self {
        Self {
            params,
            feeds,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn params(&self) -> &UpdaterParameters {
        &self.params
    }

    /// Run the update workflow
    pub async fn run(&self, cancel: &CancellationToken) -> OrchestratorResult {
        let mut progress = Progress::new(self.show_progress);
        self.run_with_progress(cancel, &mut progress).await
    }

    /// Run the update workflow, reporting through the given progress display
    pub async fn run_with_progress(
        &self,
        cancel: &CancellationToken,
        progress: &mut Progress,
    ) -> OrchestratorResult {
        let params = &self.params;
        let mut log = RunLog::new(params.dry_run);

        progress.spinner("Scanning referencing files...");
        let mut catalog = scan_catalog(&params.root).await;
        progress.finish_and_clear();

        for error in &catalog.errors {
            log.record_error(error.to_string());
        }
        info!(
            "{} references in {} files",
            catalog.references.len(),
            catalog.documents.len()
        );

        let mut resolver = VersionResolver::new(params, &self.feeds);
        let applier = UpdateApplier::new(params.allow_downgrade, params.dry_run);

        // Lowercase ids already logged as ignored
        let mut ignored = HashSet::new();
        progress.start(catalog.references.len() as u64, "Resolving");
        for reference in &catalog.references {
            let id = reference.id();
            progress.set_message(id);

            if params.is_excluded(id) {
                if ignored.insert(id.to_ascii_lowercase()) {
                    info!("{}: ignored", id);
                    log.record(UpdateOperation::ignored(id, reference.version().clone()));
                }
                progress.inc();
                continue;
            }

            if cancel.is_cancelled() {
                log.record_unresolved(id, reference.version().clone(), UnresolvedReason::Cancelled);
                progress.inc();
                continue;
            }

            match resolver.resolve(id, cancel, &mut log).await {
                Resolution::Resolved(target) => {
                    applier.apply(reference, &target, &mut catalog.documents, &mut log);
                }
                Resolution::Unresolved(reason) => {
                    debug!("{} {}: {}", id, reference.version(), reason);
                    log.record_unresolved(id, reference.version().clone(), reason);
                }
            }
            progress.inc();
        }
        progress.finish_and_clear();

        let cancelled = cancel.is_cancelled();
        let outcome = if cancelled {
            warn!("run cancelled, no files written");
            ApplyOutcome::default()
        } else {
            applier.persist(&catalog.documents, &mut log).await
        };

        OrchestratorResult {
            log,
            outcome,
            references: catalog.references.len(),
            cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeedConfig;
    use crate::domain::Disposition;
    use crate::feed::InMemoryFeed;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn project(references: &[(&str, &str)]) -> String {
        let items: String = references
            .iter()
            .map(|(id, version)| {
                format!(
                    "    <PackageReference Include=\"{}\" Version=\"{}\" />\n",
                    id, version
                )
            })
            .collect();
        format!("<Project>\n  <ItemGroup>\n{}  </ItemGroup>\n</Project>\n", items)
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn params(root: &Path) -> UpdaterParameters {
        UpdaterParameters::new(root).with_feed(FeedConfig::new("memory://feed"))
    }

    fn orchestrator(params: UpdaterParameters, feed: InMemoryFeed) -> Orchestrator {
        Orchestrator::with_feeds(params, vec![Arc::new(feed) as Arc<dyn FeedGateway>])
    }

    #[tokio::test]
    async fn test_run_updates_every_file() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/A/A.csproj", &project(&[("Contoso.Core", "1.0.0")]));
        write(dir.path(), "src/B/B.csproj", &project(&[("contoso.core", "1.0.0")]));
        let feed = InMemoryFeed::new("mem", "memory://feed")
            .with_versions("Contoso.Core", &["1.0.0", "1.2.0", "1.3.0-dev.1"]);

        let result = orchestrator(params(dir.path()), feed)
            .run(&CancellationToken::new())
            .await;

        assert_eq!(result.references, 1);
        assert_eq!(result.outcome.files_modified(), 2);
        assert_eq!(result.log.count(Disposition::Updated), 2);
        for rel in ["src/A/A.csproj", "src/B/B.csproj"] {
            let content = fs::read_to_string(dir.path().join(rel)).unwrap();
            assert!(content.contains("Version=\"1.2.0\""), "{}", rel);
        }
    }

    #[tokio::test]
    async fn test_ignored_package_is_logged_once() {
        let dir = TempDir::new().unwrap();
        let original = project(&[("Legacy", "1.0.0")]);
        write(dir.path(), "a/A.csproj", &original);
        write(dir.path(), "b/B.csproj", &original);
        write(dir.path(), "c/C.csproj", &project(&[("legacy", "1.1.0")]));
        let feed = InMemoryFeed::new("mem", "memory://feed").with_version("Legacy", "2.0.0");

        let result = orchestrator(params(dir.path()).with_ignored("legacy"), feed)
            .run(&CancellationToken::new())
            .await;

        let ignored: Vec<_> = result.log.ignored().collect();
        assert_eq!(ignored.len(), 1);
        assert!(ignored[0].file_path.is_none());
        assert!(!result.log.has_changes());
        for rel in ["a/A.csproj", "b/B.csproj"] {
            assert_eq!(fs::read_to_string(dir.path().join(rel)).unwrap(), original);
        }
    }

    #[tokio::test]
    async fn test_unresolved_package_is_reported() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "A.csproj", &project(&[("Missing", "1.0.0")]));
        let feed = InMemoryFeed::new("mem", "memory://feed");

        let result = orchestrator(params(dir.path()), feed)
            .run(&CancellationToken::new())
            .await;

        assert_eq!(result.log.unresolved().len(), 1);
        assert_eq!(result.log.unresolved()[0].reason, UnresolvedReason::NotFound);
        assert!(result.log.operations().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let original = project(&[("Contoso.Core", "1.0.0")]);
        write(dir.path(), "A.csproj", &original);
        let feed = InMemoryFeed::new("mem", "memory://feed").with_version("Contoso.Core", "2.0.0");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut progress = Progress::disabled();
        let result = orchestrator(params(dir.path()), feed)
            .run_with_progress(&cancel, &mut progress)
            .await;

        assert!(result.cancelled);
        assert_eq!(progress.completed(), 1);
        assert_eq!(
            result.log.unresolved()[0].reason,
            UnresolvedReason::Cancelled
        );
        assert!(result.outcome.written.is_empty());
        assert_eq!(fs::read_to_string(dir.path().join("A.csproj")).unwrap(), original);
    }

    #[tokio::test]
    async fn test_empty_root() {
        let dir = TempDir::new().unwrap();
        let feed = InMemoryFeed::new("mem", "memory://feed");
        let result = orchestrator(params(dir.path()), feed)
            .run(&CancellationToken::new())
            .await;
        assert_eq!(result.references, 0);
        assert!(result.log.operations().is_empty());
        assert!(!result.cancelled);
    }

    #[test]
    fn test_new_rejects_invalid_parameters() {
        let dir = TempDir::new().unwrap();
        let result = Orchestrator::new(UpdaterParameters::new(dir.path()));
        assert!(matches!(
            result,
            Err(AppError::Config(crate::error::ConfigError::NoFeeds))
        ));
    }

    #[test]
    fn test_new_builds_gateways() {
        let dir = TempDir::new().unwrap();
        let orchestrator = Orchestrator::new(
            UpdaterParameters::new(dir.path())
                .with_feed(FeedConfig::new("https://api.nuget.org/v3/index.json"))
                .with_feed(FeedConfig::new("https://feeds.example.com/v3/index.json")),
        )
        .unwrap();
        assert_eq!(orchestrator.feeds.len(), 2);
        assert_eq!(orchestrator.feeds[0].name(), "api.nuget.org");
    }
}
