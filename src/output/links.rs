//! Web links for package versions, derived from the feed URI

use crate::domain::SemanticVersion;
use reqwest::Url;

const NUGET_API_HOST: &str = "api.nuget.org";
const AZURE_PACKAGES_HOST: &str = "pkgs.dev.azure.com";
const LEGACY_AZURE_SUFFIX: &str = ".pkgs.visualstudio.com";
const PACKAGING_SEGMENT: &str = "_packaging";

/// Browser URL of `id` at `version` on the feed behind `origin`
///
/// Returns `None` for feeds whose URI shape has no known gallery.
pub fn package_url(origin: &str, id: &str, version: &SemanticVersion) -> Option<String> {
    let url = Url::parse(origin).ok()?;
    let host = url.host_str()?.to_ascii_lowercase();

    if host == NUGET_API_HOST {
        return Some(format!("https://www.nuget.org/packages/{}/{}", id, version));
    }

    let segments: Vec<&str> = url
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .collect();
    let packaging = segments
        .iter()
        .position(|segment| segment.eq_ignore_ascii_case(PACKAGING_SEGMENT))?;
    let feed = segments.get(packaging + 1)?;

    // {org}/{project?} in front of _packaging
    let scope = if host == AZURE_PACKAGES_HOST {
        let prefix = &segments[..packaging];
        if prefix.is_empty() || prefix.len() > 2 {
            return None;
        }
        prefix.join("/")
    } else if let Some(org) = host.strip_suffix(LEGACY_AZURE_SUFFIX) {
        let mut scope = vec![org];
        scope.extend_from_slice(&segments[..packaging]);
        scope.join("/")
    } else {
        return None;
    };

    Some(format!(
        "https://dev.azure.com/{}/_artifacts/feed/{}/NuGet/{}/overview/{}",
        scope, feed, id, version
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(
        "https://api.nuget.org/v3/index.json",
        Some("https://www.nuget.org/packages/Contoso.Core/1.2.0-dev.3")
    )]
    #[case(
        "https://pkgs.dev.azure.com/contoso/_packaging/main/nuget/v3/index.json",
        Some("https://dev.azure.com/contoso/_artifacts/feed/main/NuGet/Contoso.Core/overview/1.2.0-dev.3")
    )]
    #[case(
        "https://pkgs.dev.azure.com/contoso/tools/_packaging/main/nuget/v3/index.json",
        Some("https://dev.azure.com/contoso/tools/_artifacts/feed/main/NuGet/Contoso.Core/overview/1.2.0-dev.3")
    )]
    #[case(
        "https://contoso.pkgs.visualstudio.com/_packaging/main/nuget/v3/index.json",
        Some("https://dev.azure.com/contoso/_artifacts/feed/main/NuGet/Contoso.Core/overview/1.2.0-dev.3")
    )]
    #[case("https://pkgs.dev.azure.com/contoso/nuget/v3/index.json", None)]
    #[case("https://feeds.example.com/v3/index.json", None)]
    #[case("not a url", None)]
    fn test_package_url(#[case] origin: &str, #[case] expected: Option<&str>) {
        let version = SemanticVersion::parse("1.2.0-dev.3").unwrap();
        assert_eq!(
            package_url(origin, "Contoso.Core", &version).as_deref(),
            expected
        );
    }
}
