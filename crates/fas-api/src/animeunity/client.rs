use std::ops::RangeInclusive;

use futures::stream::{self, StreamExt, TryStreamExt};
use reqwest::Client;

use super::types::{self, EpisodesPage, InfoApiResponse};
use crate::episodes;
use crate::error::{ensure_site, SiteError};
use crate::http::{absolute_url, fetch_json, fetch_text};
use crate::models::{Anime, AnimeEpisodes, AnimeInfo, Episode, Sites, Video};
use crate::traits::{ListingHints, SiteAdapter, DEFAULT_CONCURRENCY};

/// The base URL for AnimeUnity.
pub const BASE_URL: &str = "https://www.animeunity.to";

/// AnimeUnity client.
///
/// Search results and catalog metadata are embedded as JSON in HTML
/// attributes; the episode listing comes from the paged `info_api`.
#[derive(Debug, Clone)]
pub struct AnimeUnityClient {
    base_url: String,
    concurrency: usize,
}

impl AnimeUnityClient {
    pub fn new() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Total episode count as declared by `info_api`.
    pub async fn episodes_count(&self, client: &Client, anime_id: u64) -> Result<u32, SiteError> {
        let url = absolute_url(&self.base_url, &format!("/info_api/{anime_id}/"))?;
        let info: InfoApiResponse = fetch_json(client.get(&url)).await?;
        Ok(info.episodes_count)
    }

    async fn fetch_page(
        &self,
        client: &Client,
        anime_id: u64,
        (start, end): (u32, u32),
    ) -> Result<Vec<(u32, String)>, SiteError> {
        let url = absolute_url(&self.base_url, &format!("/info_api/{anime_id}/1"))?;
        let page: EpisodesPage = fetch_json(client.get(&url).query(&[
            ("start_range", start.to_string()),
            ("end_range", end.to_string()),
        ]))
        .await?;
        Ok(types::parse_episodes_page(page))
    }

    /// Fetch the episode page and read the player's embed URL.
    async fn resolve_episode(
        &self,
        client: &Client,
        anime_link: &str,
        episode: &Episode,
    ) -> Result<Option<String>, SiteError> {
        let link = format!("{}/{}", anime_link.trim_end_matches('/'), episode.link());
        let url = absolute_url(&self.base_url, &link)?;
        let html = fetch_text(client.get(&url)).await?;
        Ok(types::parse_embed_url(&html))
    }
}

impl Default for AnimeUnityClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteAdapter for AnimeUnityClient {
    fn site(&self) -> Sites {
        Sites::AnimeUnity
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn search(&self, client: &Client, query: &str) -> Result<Vec<Anime>, SiteError> {
        let url = absolute_url(&self.base_url, "/archivio")?;
        let html = fetch_text(client.get(&url).query(&[("title", query)])).await?;
        let results = types::parse_search(&html)?;
        tracing::debug!(query, count = results.len(), "AnimeUnity search");
        Ok(results)
    }

    async fn get_anime_episodes(
        &self,
        client: &Client,
        anime: &Anime,
        hints: &ListingHints,
    ) -> Result<AnimeEpisodes, SiteError> {
        ensure_site(Sites::AnimeUnity, anime.site())?;
        let anime_id = types::anime_id(anime.link())?;

        let count = match hints.episode_count {
            Some(count) => count,
            None => self.episodes_count(client, anime_id).await?,
        };
        if count > types::MAX_EPISODE_COUNT {
            return Err(SiteError::Parse(format!(
                "implausible episode count {count} for anime {anime_id}"
            )));
        }

        let pages = types::page_ranges(count, hints.range.as_ref());
        tracing::debug!(anime_id, count, pages = pages.len(), "AnimeUnity listing");

        let raw: Vec<Vec<(u32, String)>> = stream::iter(pages)
            .map(|bounds| self.fetch_page(client, anime_id, bounds))
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        let raw = raw
            .into_iter()
            .flatten()
            .filter(|(number, _)| hints.accepts(*number));

        Ok(AnimeEpisodes::new(
            anime.clone(),
            episodes::normalize(Sites::AnimeUnity, raw),
        ))
    }

    async fn get_episodes_link(
        &self,
        client: &Client,
        anime_episodes: &AnimeEpisodes,
        range: RangeInclusive<u32>,
    ) -> Result<Vec<Video>, SiteError> {
        ensure_site(Sites::AnimeUnity, anime_episodes.site())?;
        let anime_link = anime_episodes.anime().link();

        episodes::resolve_range(
            Sites::AnimeUnity,
            anime_episodes,
            &range,
            self.concurrency,
            |episode| self.resolve_episode(client, anime_link, episode),
        )
        .await
    }

    async fn get_info(&self, client: &Client, link: &str) -> Result<AnimeInfo, SiteError> {
        let url = absolute_url(&self.base_url, link)?;
        let html = fetch_text(client.get(&url)).await?;
        types::parse_info(&html)
    }
}
