//! Version resolution
//!
//! This module provides:
//! - Tag matching of versions against release channels
//! - Priority-ordered selection among feed candidates
//! - `VersionResolver`, which queries every feed for a package, applies
//!   overrides, and memoizes the outcome per package id for the run

mod tag;

pub use tag::{matches_tag, TagMatcher, STABLE_TAG};

use crate::config::UpdaterParameters;
use crate::domain::{FeedVersion, RunLog, UnresolvedReason};
use crate::error::FeedError;
use crate::feed::FeedGateway;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Pick the target version from candidates sorted highest first
///
/// Each candidate joins the group of the first tag it matches; candidates
/// matching no tag are dropped. The first (highest) member of every group is
/// that group's winner, and the highest winner is returned.
pub fn select_version<'a>(
    candidates: &'a [FeedVersion],
    tags: &[TagMatcher],
    strict: bool,
) -> Option<&'a FeedVersion> {
    let mut winners: Vec<Option<&FeedVersion>> = vec![None; tags.len()];

    for candidate in candidates {
        let Some(group) = tags
            .iter()
            .position(|tag| tag.matches(&candidate.version, strict))
        else {
            continue;
        };
        if winners[group].is_none() {
            winners[group] = Some(candidate);
        }
    }

    winners
        .into_iter()
        .flatten()
        .reduce(|best, next| if next.version > best.version { next } else { best })
}

/// Outcome of resolving one package id
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(FeedVersion),
    Unresolved(UnresolvedReason),
}

/// Resolves package ids against the configured feeds
///
/// Outcomes are cached by lowercase id, so every occurrence of an id within
/// one run resolves to the same target and feeds are queried once per id.
pub struct VersionResolver<'a> {
    params: &'a UpdaterParameters,
    feeds: &'a [Arc<dyn FeedGateway>],
    tags: Vec<TagMatcher>,
    cache: HashMap<String, Resolution>,
}

impl<'a> VersionResolver<'a> {
    pub fn new(params: &'a UpdaterParameters, feeds: &'a [Arc<dyn FeedGateway>]) -> Self {
        Self {
            params,
            feeds,
            tags: params.tags.iter().map(|t| TagMatcher::new(t)).collect(),
            cache: HashMap::new(),
        }
    }

    /// Resolve one package id, reusing an earlier outcome from this run
    pub async fn resolve(
        &mut self,
        package_id: &str,
        cancel: &CancellationToken,
        log: &mut RunLog,
    ) -> Resolution {
        let key = package_id.to_ascii_lowercase();
        if let Some(cached) = self.cache.get(&key) {
            debug!("{}: reusing resolution from this run", package_id);
            return cached.clone();
        }

        let resolution = self.resolve_uncached(package_id, cancel, log).await;
        if resolution != Resolution::Unresolved(UnresolvedReason::Cancelled) {
            self.cache.insert(key, resolution.clone());
        }
        resolution
    }

    async fn resolve_uncached(
        &self,
        package_id: &str,
        cancel: &CancellationToken,
        log: &mut RunLog,
    ) -> Resolution {
        let overridden = self.params.override_for(package_id);

        if let Some(forced) = overridden.and_then(|o| o.forced_version()) {
            debug!("{}: forced to {} by override", package_id, forced);
            return Resolution::Resolved(FeedVersion::forced(forced.clone()));
        }

        let mut candidates = match self.gather(package_id, cancel, log).await {
            Ok(candidates) => candidates,
            Err(reason) => return Resolution::Unresolved(reason),
        };

        if let Some(filter) = overridden.filter(|o| !o.is_forced()) {
            candidates.retain(|c| filter.allows(&c.version));
            debug!(
                "{}: {} candidates within {}",
                package_id,
                candidates.len(),
                filter.constraint()
            );
        }

        match select_version(&candidates, &self.tags, self.params.strict) {
            Some(winner) => {
                debug!("{}: resolved {}", package_id, winner);
                Resolution::Resolved(winner.clone())
            }
            None => {
                info!("skipping {}, no matching version", package_id);
                Resolution::Unresolved(UnresolvedReason::NoMatchingVersion)
            }
        }
    }

    /// Query every feed concurrently and merge the answers, highest first
    ///
    /// A failing feed is logged and skipped; the package fails only when no
    /// feed produced any version.
    async fn gather(
        &self,
        package_id: &str,
        cancel: &CancellationToken,
        log: &mut RunLog,
    ) -> Result<Vec<FeedVersion>, UnresolvedReason> {
        let author = self.params.author.as_deref();
        let queries = self
            .feeds
            .iter()
            .map(|feed| feed.get_versions(package_id, author, cancel));
        let results = join_all(queries).await;

        let mut candidates = Vec::new();
        let mut last_error: Option<FeedError> = None;

        for (feed, result) in self.feeds.iter().zip(results) {
            match result {
                Ok(versions) => candidates.extend(versions),
                Err(FeedError::Cancelled { .. }) => return Err(UnresolvedReason::Cancelled),
                Err(e) if e.is_not_found() => {
                    debug!("{}: not on {}", package_id, feed.name());
                }
                Err(e) => {
                    warn!("{}", e);
                    log.record_error(e.to_string());
                    last_error = Some(e);
                }
            }
        }

        if candidates.is_empty() {
            return Err(match last_error {
                Some(e) => UnresolvedReason::FeedFailed(e.to_string()),
                None => UnresolvedReason::NotFound,
            });
        }

        // stable sort keeps configuration order among equal versions
        candidates.sort_by(|a, b| b.version.cmp(&a.version));
        candidates.dedup_by(|later, earlier| later.version == earlier.version);
        Ok(candidates)
    }
}
