//! Pipeline tests against in-memory feeds
//!
//! These tests verify:
//! - Updates across every file category
//! - Idempotence of a second run
//! - Downgrade gating leaves files byte-for-byte unchanged
//! - Dry run, ignore and update-only filters
//! - Range and forced overrides, including a result list fed back in

use feedup::config::{load_overrides_file, parse_override, FeedConfig, UpdaterParameters};
use feedup::domain::{Disposition, UnresolvedReason};
use feedup::feed::{FeedGateway, InMemoryFeed};
use feedup::orchestrator::{Orchestrator, OrchestratorResult};
use feedup::output::ResultList;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const CONTOSO_VERSIONS: &[&str] = &["2.1.39", "2.2.0", "2.3.0-dev.44", "2.3.0-dev.48"];

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
    format!(
        "<Project Sdk=\"Microsoft.NET.Sdk\">\n  <ItemGroup>\n{}  </ItemGroup>\n</Project>\n",
        items
    )
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn read(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).unwrap()
}

/// A small solution: one project, one packages.config, central props
fn solution() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(
        root,
        "src/App/App.csproj",
        &project(&[("Contoso.Core", "2.1.39"), ("Contoso.Logging", "1.0.0")]),
    );
    write(
        root,
        "src/Legacy/packages.config",
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<packages>\n  <package id=\"Contoso.Core\" version=\"2.1.39\" targetFramework=\"net48\" />\n</packages>\n",
    );
    write(
        root,
        "Directory.Packages.props",
        "<Project>\n  <ItemGroup>\n    <PackageVersion Include=\"Contoso.Logging\" Version=\"1.0.0\" />\n  </ItemGroup>\n</Project>\n",
    );
    dir
}

fn feed() -> InMemoryFeed {
    InMemoryFeed::new("mem", "memory://feed")
        .with_versions("Contoso.Core", CONTOSO_VERSIONS)
        .with_versions("Contoso.Logging", &["1.0.0", "1.1.0", "1.2.0-dev.3"])
}

fn params(root: &Path) -> UpdaterParameters {
    UpdaterParameters::new(root).with_feed(FeedConfig::new("memory://feed"))
}

async fn run_with(params: UpdaterParameters, feed: InMemoryFeed) -> OrchestratorResult {
    let feeds: Vec<Arc<dyn FeedGateway>> = vec![Arc::new(feed)];
    Orchestrator::with_feeds(params, feeds)
        .run(&CancellationToken::new())
        .await
}

#[tokio::test]
async fn test_updates_every_category() {
    let dir = solution();
    let root = dir.path();

    let result = run_with(params(root), feed()).await;

    assert_eq!(result.references, 2);
    assert_eq!(result.outcome.files_modified(), 3);
    assert!(read(root, "src/App/App.csproj").contains("Include=\"Contoso.Core\" Version=\"2.2.0\""));
    assert!(read(root, "src/App/App.csproj").contains("Include=\"Contoso.Logging\" Version=\"1.1.0\""));
    let config = read(root, "src/Legacy/packages.config");
    assert!(config.contains("<package id=\"Contoso.Core\" version=\"2.2.0\" targetFramework=\"net48\" />"));
    assert!(config.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
    assert!(read(root, "Directory.Packages.props").contains("Version=\"1.1.0\""));
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let dir = solution();
    let root = dir.path();
    let params = params(root).with_tags(&["dev", "stable"]).with_strict(true);

    let first = run_with(params.clone(), feed()).await;
    assert!(first.log.has_changes());
    let after_first = read(root, "src/App/App.csproj");

    let second = run_with(params, feed()).await;
    assert_eq!(second.log.proceeded().count(), 0);
    assert_eq!(
        second.log.count(Disposition::AlreadyAtVersion),
        second.log.operations().len()
    );
    assert!(second.outcome.written.is_empty());
    assert_eq!(read(root, "src/App/App.csproj"), after_first);
}

#[tokio::test]
async fn test_downgrade_gating() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let original = project(&[("Contoso.Core", "3.0.0")]);
    write(root, "App.csproj", &original);

    let result = run_with(params(root), feed()).await;
    assert_eq!(result.log.count(Disposition::HigherVersionFound), 1);
    assert!(result.outcome.written.is_empty());
    assert_eq!(read(root, "App.csproj"), original);

    let result = run_with(params(root).with_allow_downgrade(true), feed()).await;
    assert_eq!(result.log.count(Disposition::Downgraded), 1);
    assert!(read(root, "App.csproj").contains("Version=\"2.2.0\""));
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let dir = solution();
    let root = dir.path();
    let before = read(root, "src/App/App.csproj");

    let result = run_with(params(root).with_dry_run(true), feed()).await;

    assert!(result.log.is_dry_run());
    assert_eq!(result.log.count(Disposition::Updated), 4);
    assert_eq!(result.outcome.files_modified(), 3);
    assert_eq!(read(root, "src/App/App.csproj"), before);
}

#[tokio::test]
async fn test_ignore_and_only_filters() {
    let dir = solution();
    let root = dir.path();

    let result = run_with(params(root).with_ignored("contoso.core"), feed()).await;
    let ignored: Vec<_> = result.log.ignored().collect();
    assert_eq!(ignored.len(), 1);
    assert_eq!(ignored[0].package_id, "Contoso.Core");
    assert!(ignored[0].file_path.is_none());
    assert!(read(root, "src/Legacy/packages.config").contains("version=\"2.1.39\""));
    assert!(read(root, "Directory.Packages.props").contains("Version=\"1.1.0\""));

    let dir = solution();
    let root = dir.path();
    let result = run_with(params(root).with_only("Contoso.Core"), feed()).await;
    let ignored: Vec<_> = result.log.ignored().collect();
    assert_eq!(ignored.len(), 1);
    assert_eq!(ignored[0].package_id, "Contoso.Logging");
    assert!(read(root, "Directory.Packages.props").contains("Version=\"1.0.0\""));
    assert!(read(root, "src/Legacy/packages.config").contains("version=\"2.2.0\""));
}

#[tokio::test]
async fn test_range_override_scenarios() {
    let cases = [
        (&["dev", "stable"][..], "(, 2.3.0-dev.48]", "2.3.0-dev.48"),
        (&["dev", "stable"][..], "(, 2.3.0-dev.48)", "2.3.0-dev.44"),
        (&["stable"][..], "(, 2.3.0-dev.48]", "2.2.0"),
    ];

    for (tags, range, expected) in cases {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "App.csproj", &project(&[("Contoso.Core", "2.1.39")]));

        let params = params(root)
            .with_tags(tags)
            .with_override(parse_override("Contoso.Core", range, false).unwrap());
        run_with(params, feed()).await;

        assert!(
            read(root, "App.csproj").contains(&format!("Version=\"{}\"", expected)),
            "{:?} {}",
            tags,
            range
        );
    }
}

#[tokio::test]
async fn test_forced_override_skips_feeds() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "App.csproj", &project(&[("Contoso.Core", "2.1.39")]));
    let feed = Arc::new(feed());
    let feeds: Vec<Arc<dyn FeedGateway>> = vec![feed.clone() as Arc<dyn FeedGateway>];

    let params = params(root).with_override(parse_override("Contoso.Core", "2.0.0", true).unwrap());
    let result = Orchestrator::with_feeds(params.with_allow_downgrade(true), feeds)
        .run(&CancellationToken::new())
        .await;

    assert_eq!(feed.version_queries(), 0);
    assert_eq!(result.log.count(Disposition::Downgraded), 1);
    assert!(read(root, "App.csproj").contains("Version=\"2.0.0\""));
}

#[tokio::test]
async fn test_result_list_pins_next_run() {
    let dir = solution();
    let root = dir.path();
    let tags = ["dev", "stable"];

    let first = run_with(params(root).with_tags(&tags), feed()).await;
    let results = ResultList::from_log(&first.log);
    assert_eq!(results.entries().len(), 2);
    let pinned = root.join("results.json");
    results.save(&pinned).unwrap();

    // a newer version appears, but the pinned run keeps the earlier result
    let newer = feed().with_version("Contoso.Core", "2.3.0-dev.50");
    let mut params = params(root).with_tags(&tags);
    for entry in load_overrides_file(&pinned).unwrap() {
        params = params.with_override(entry);
    }
    let second = run_with(params, newer).await;

    assert_eq!(second.log.proceeded().count(), 0);
    assert!(read(root, "src/App/App.csproj").contains("Version=\"2.3.0-dev.48\""));
}

#[tokio::test]
async fn test_tracked_id_scenarios() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(
        root,
        "App.csproj",
        &project(&[("Stable.Only", "1.0"), ("Tracked", "0.9.0")]),
    );
    let feed = InMemoryFeed::new("mem", "memory://feed")
        .with_versions("Stable.Only", &["1.0", "1.1-dev.1"])
        .with_version("Tracked", "1.0-beta.1");

    let result = run_with(params(root).with_tags(&["beta", "stable"]), feed).await;

    let ops = result.log.operations();
    let stable = ops.iter().find(|op| op.package_id == "Stable.Only").unwrap();
    assert_eq!(stable.disposition(), Disposition::AlreadyAtVersion);
    let tracked = ops.iter().find(|op| op.package_id == "Tracked").unwrap();
    assert_eq!(tracked.updated_version.as_ref().unwrap().to_string(), "1.0.0-beta.1");
    let content = read(root, "App.csproj");
    assert!(content.contains("Include=\"Stable.Only\" Version=\"1.0\""));
    assert!(content.contains("Include=\"Tracked\" Version=\"1.0.0-beta.1\""));
}

#[tokio::test]
async fn test_failing_feed_is_isolated() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "App.csproj", &project(&[("Contoso.Core", "2.1.39")]));
    let feeds: Vec<Arc<dyn FeedGateway>> = vec![
        Arc::new(InMemoryFeed::new("broken", "memory://broken").failing("connection reset")),
        Arc::new(feed()),
    ];

    let result = Orchestrator::with_feeds(params(root), feeds)
        .run(&CancellationToken::new())
        .await;

    assert_eq!(result.log.count(Disposition::Updated), 1);
    assert_eq!(result.log.errors().len(), 1);
    assert!(read(root, "App.csproj").contains("Version=\"2.2.0\""));
}

#[tokio::test]
async fn test_no_matching_version_leaves_file() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let original = project(&[("Contoso.Core", "2.1.39")]);
    write(root, "App.csproj", &original);

    let result = run_with(params(root).with_tags(&["nightly"]), feed()).await;

    assert_eq!(
        result.log.unresolved()[0].reason,
        UnresolvedReason::NoMatchingVersion
    );
    assert_eq!(read(root, "App.csproj"), original);
}
