//! Reference extraction and in-place update per file category
//!
//! Each category is an XML dialect. Extraction works on the raw text with
//! regexes so that an update replaces only the version value and leaves
//! attribute order, quoting, whitespace, and comments untouched.

use crate::domain::{FileCategory, SemanticVersion};
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

// Start tag of any element that can carry a package reference
static START_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(PackageReference|PackageVersion|package)\b([^>]*?)(/?)>").unwrap()
});

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_][\w.:-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

static VERSION_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(Version|VersionOverride)\s*>([^<]*)</(?:Version|VersionOverride)\s*>").unwrap()
});

static COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

/// How one element kind names its package and version
struct ElementRule {
    tag: &'static str,
    id_attribute: &'static str,
    version_attributes: &'static [&'static str],
    /// Child elements holding the version when no attribute does
    version_elements: bool,
}

const PACKAGE_REFERENCE: ElementRule = ElementRule {
    tag: "PackageReference",
    id_attribute: "Include",
    version_attributes: &["Version", "VersionOverride"],
    version_elements: true,
};

const PACKAGE_VERSION: ElementRule = ElementRule {
    tag: "PackageVersion",
    id_attribute: "Include",
    version_attributes: &["Version"],
    version_elements: true,
};

const PACKAGES_CONFIG_ENTRY: ElementRule = ElementRule {
    tag: "package",
    id_attribute: "id",
    version_attributes: &["version"],
    version_elements: false,
};

fn rules(category: FileCategory) -> &'static [ElementRule] {
    match category {
        FileCategory::Project => &[PACKAGE_REFERENCE],
        FileCategory::PackagesConfig => &[PACKAGES_CONFIG_ENTRY],
        FileCategory::DirectoryProps => &[PACKAGE_VERSION, PACKAGE_REFERENCE],
    }
}

/// A package id and the raw version text found for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReference {
    pub id: String,
    pub version: String,
    /// Byte range of the version text in the document
    pub span: Range<usize>,
}

impl RawReference {
    /// The parsed version, `None` for floating versions, ranges, or properties
    pub fn parsed_version(&self) -> Option<SemanticVersion> {
        SemanticVersion::parse(&self.version).ok()
    }
}

/// Extract every package reference from `content`, in document order
pub fn extract_references(category: FileCategory, content: &str) -> Vec<RawReference> {
    let comments: Vec<Range<usize>> = COMMENT.find_iter(content).map(|m| m.range()).collect();
    let in_comment = |pos: usize| comments.iter().any(|c| c.contains(&pos));
    let rules = rules(category);

    let mut references = Vec::new();
    for caps in START_TAG.captures_iter(content) {
        let (Some(whole), Some(tag), Some(attrs)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        if in_comment(whole.start()) {
            continue;
        }
        let Some(rule) = rules.iter().find(|r| r.tag == tag.as_str()) else {
            continue;
        };

        let mut id = None;
        let mut version = None;
        for attr in ATTRIBUTE.captures_iter(attrs.as_str()) {
            let (Some(name), Some(value)) = (attr.get(1), attr.get(2).or_else(|| attr.get(3)))
            else {
                continue;
            };
            let name = name.as_str();
            if name.eq_ignore_ascii_case(rule.id_attribute) {
                id = Some(value.as_str().trim().to_string());
            } else if version.is_none()
                && rule
                    .version_attributes
                    .iter()
                    .any(|v| name.eq_ignore_ascii_case(v))
            {
                let start = attrs.start() + value.start();
                version = Some(trimmed_span(content, start..start + value.len()));
            }
        }

        let self_closing = caps.get(3).is_some_and(|m| !m.as_str().is_empty());
        if version.is_none() && rule.version_elements && !self_closing {
            version = child_version(content, whole.end(), rule.tag);
        }

        if let (Some(id), Some(span)) = (id.filter(|i| !i.is_empty()), version) {
            references.push(RawReference {
                id,
                version: content[span.clone()].to_string(),
                span,
            });
        }
    }
    references
}

/// Version child element between `body_start` and the closing tag
fn child_version(content: &str, body_start: usize, tag: &str) -> Option<Range<usize>> {
    let closing = format!("</{}", tag);
    let body_end = body_start + content[body_start..].find(&closing)?;
    let body = &content[body_start..body_end];

    let caps = VERSION_ELEMENT.captures(body)?;
    let value = caps.get(2)?;
    let start = body_start + value.start();
    Some(trimmed_span(content, start..start + value.len()))
}

fn trimmed_span(content: &str, span: Range<usize>) -> Range<usize> {
    let text = &content[span.clone()];
    let leading = text.len() - text.trim_start().len();
    let trailing = text.len() - text.trim_end().len();
    span.start + leading..span.end - trailing
}

/// Rewrite every reference to `id` currently at `from` so it reads `to`
///
/// Returns the new content, or `None` when nothing changed.
pub fn update_reference(
    category: FileCategory,
    content: &str,
    id: &str,
    from: &SemanticVersion,
    to: &SemanticVersion,
) -> Option<String> {
    let replacement = to.to_string();
    let targets: Vec<Range<usize>> = extract_references(category, content)
        .into_iter()
        .filter(|r| r.id.eq_ignore_ascii_case(id))
        .filter(|r| r.parsed_version().as_ref() == Some(from))
        .filter(|r| r.version != replacement)
        .map(|r| r.span)
        .collect();

    if targets.is_empty() {
        return None;
    }

    let mut updated = content.to_string();
    for span in targets.into_iter().rev() {
        updated.replace_range(span, &replacement);
    }
    Some(updated)
}
