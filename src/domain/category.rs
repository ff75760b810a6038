//! File categories that may carry package references

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Supported referencing-file categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileCategory {
    /// Build project files (*.csproj, *.fsproj, *.vbproj)
    Project,
    /// Dependency manifest files (packages.config)
    PackagesConfig,
    /// Directory-scoped property files (Directory.Packages.props, Directory.Build.props)
    DirectoryProps,
}

/// Project file extensions, lowercase
const PROJECT_EXTENSIONS: &[&str] = &["csproj", "fsproj", "vbproj"];

/// Directory-scoped property file names, lowercase
const DIRECTORY_PROPS_NAMES: &[&str] = &["directory.packages.props", "directory.build.props"];

impl FileCategory {
    /// Returns the display name for this category
    pub fn display_name(&self) -> &'static str {
        match self {
            FileCategory::Project => "project",
            FileCategory::PackagesConfig => "packages.config",
            FileCategory::DirectoryProps => "directory props",
        }
    }

    /// Classify a path by its file name or extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_ascii_lowercase();

        if name == "packages.config" {
            return Some(FileCategory::PackagesConfig);
        }
        if DIRECTORY_PROPS_NAMES.contains(&name.as_str()) {
            return Some(FileCategory::DirectoryProps);
        }

        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        if PROJECT_EXTENSIONS.contains(&extension.as_str()) {
            return Some(FileCategory::Project);
        }

        None
    }

    /// Returns all supported categories
    pub fn all() -> &'static [FileCategory] {
        &[
            FileCategory::Project,
            FileCategory::PackagesConfig,
            FileCategory::DirectoryProps,
        ]
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
