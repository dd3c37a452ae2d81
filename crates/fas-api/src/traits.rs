//! Trait definitions for streaming site adapters.
//!
//! All adapters (AnimeUnity, AnimeWorld, AniPlay) implement [`SiteAdapter`],
//! allowing the facade to dispatch on [`Sites`] without caring which upstream
//! shape sits behind it.

use std::future::Future;
use std::ops::RangeInclusive;

use reqwest::Client;

use crate::error::SiteError;
use crate::models::{Anime, AnimeEpisodes, AnimeInfo, Sites, Video};

/// Default number of in-flight requests during range resolution.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Optional inputs for [`SiteAdapter::get_anime_episodes`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingHints {
    /// Only list episodes whose number falls in this range.
    pub range: Option<RangeInclusive<u32>>,
    /// Episode count already known to the caller (e.g. from `get_info`).
    ///
    /// AnimeUnity splits its listing into a count request and paged range
    /// requests; a supplied count skips the first one. Other adapters ignore it.
    pub episode_count: Option<u32>,
}

impl ListingHints {
    pub fn with_range(range: RangeInclusive<u32>) -> Self {
        Self {
            range: Some(range),
            ..Self::default()
        }
    }

    pub fn with_episode_count(mut self, count: u32) -> Self {
        self.episode_count = Some(count);
        self
    }

    /// True if `number` passes the range filter.
    pub fn accepts(&self, number: u32) -> bool {
        self.range.as_ref().map_or(true, |r| r.contains(&number))
    }
}

/// A unified streaming site interface.
///
/// The HTTP client is injected on every call; adapters never build or own one.
pub trait SiteAdapter: Send + Sync {
    /// The site this adapter talks to. Every entity it emits carries this tag.
    fn site(&self) -> Sites;

    /// Upstream root the adapter targets.
    fn base_url(&self) -> &str;

    /// Search the catalog by title. No matches is an empty vector, not an error.
    fn search(
        &self,
        client: &Client,
        query: &str,
    ) -> impl Future<Output = Result<Vec<Anime>, SiteError>> + Send;

    /// List the episodes of a catalog entry, ordered by number.
    fn get_anime_episodes(
        &self,
        client: &Client,
        anime: &Anime,
        hints: &ListingHints,
    ) -> impl Future<Output = Result<AnimeEpisodes, SiteError>> + Send;

    /// Resolve video links for the listed episodes inside `range`, concurrently.
    ///
    /// An episode whose link cannot be resolved is returned with `link: None`;
    /// episodes missing from the listing are omitted. The call fails only when
    /// every resolution in a non-empty batch fails. Output order is unspecified.
    fn get_episodes_link(
        &self,
        client: &Client,
        episodes: &AnimeEpisodes,
        range: RangeInclusive<u32>,
    ) -> impl Future<Output = Result<Vec<Video>, SiteError>> + Send;

    /// Fetch rich metadata for the catalog entry at `link`.
    fn get_info(
        &self,
        client: &Client,
        link: &str,
    ) -> impl Future<Output = Result<AnimeInfo, SiteError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_hints_accept_everything() {
        let hints = ListingHints::default();
        assert!(hints.accepts(1));
        assert!(hints.accepts(5000));
        assert_eq!(hints.episode_count, None);
    }

    #[test]
    fn test_range_hints() {
        let hints = ListingHints::with_range(10..=20).with_episode_count(24);
        assert!(!hints.accepts(9));
        assert!(hints.accepts(10));
        assert!(hints.accepts(20));
        assert!(!hints.accepts(21));
        assert_eq!(hints.episode_count, Some(24));
    }
}
