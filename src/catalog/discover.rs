//! Referencing file discovery
//!
//! Project files come from the solution file at the root when there is one,
//! otherwise from a directory walk. The other categories are always walked.

use crate::domain::FileCategory;
use regex::Regex;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Directories never descended into
const SKIP_DIRS: &[&str] = &["bin", "obj", ".git", ".vs", "node_modules", "packages"];

// Project("{TYPE-GUID}") = "Name", "relative\path.csproj", "{PROJECT-GUID}"
static SOLUTION_PROJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s*Project\("\{[^}]*\}"\)\s*=\s*"[^"]*"\s*,\s*"([^"]+)""#).unwrap()
});

/// A file to load, with its category
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DiscoveredFile {
    pub category: FileCategory,
    pub path: PathBuf,
}

/// Find every referencing file under `root`, sorted and de-duplicated
pub fn discover_files(root: &Path) -> Vec<DiscoveredFile> {
    let walked = walk(root);
    let mut files: BTreeSet<DiscoveredFile> = walked
        .iter()
        .filter(|f| f.category != FileCategory::Project)
        .cloned()
        .collect();

    match find_solution(root) {
        Some(solution) => {
            debug!("using project list from {}", solution.display());
            files.extend(solution_projects(&solution).into_iter().map(|path| {
                DiscoveredFile {
                    category: FileCategory::Project,
                    path,
                }
            }));
        }
        None => {
            files.extend(
                walked
                    .into_iter()
                    .filter(|f| f.category == FileCategory::Project),
            );
        }
    }

    files.into_iter().collect()
}

/// First `.sln` file directly under `root`, by name
fn find_solution(root: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(root).ok()?;
    entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("sln"))
        })
        .min()
}

/// Project files listed in a solution file
fn solution_projects(solution: &Path) -> Vec<PathBuf> {
    let content = match std::fs::read_to_string(solution) {
        Ok(content) => content,
        Err(e) => {
            warn!("failed to read {}: {}", solution.display(), e);
            return Vec::new();
        }
    };
    let dir = solution.parent().unwrap_or_else(|| Path::new("."));
    parse_solution(&content, dir)
}

/// Extract project paths from solution file content, relative to `dir`
///
/// Solution folders are listed as projects too; entries that are not
/// project files are dropped.
pub fn parse_solution(content: &str, dir: &Path) -> Vec<PathBuf> {
    SOLUTION_PROJECT
        .captures_iter(content)
        .filter_map(|caps| caps.get(1))
        .map(|m| dir.join(m.as_str().replace('\\', "/")))
        .filter(|path| FileCategory::from_path(path) == Some(FileCategory::Project))
        .collect()
}

fn walk(root: &Path) -> Vec<DiscoveredFile> {
    WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| SKIP_DIRS.iter().any(|s| name.eq_ignore_ascii_case(s)))
        })
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let category = FileCategory::from_path(entry.path())?;
            Some(DiscoveredFile {
                category,
                path: entry.into_path(),
            })
        })
        .collect()
}
