use std::ops::RangeInclusive;

use reqwest::Client;

use super::types::{self, EpisodeInfoResponse};
use crate::episodes;
use crate::error::{ensure_site, SiteError};
use crate::http::{absolute_url, fetch_json, fetch_text};
use crate::models::{Anime, AnimeEpisodes, AnimeInfo, Episode, Sites, Video};
use crate::traits::{ListingHints, SiteAdapter, DEFAULT_CONCURRENCY};

/// The base URL for AnimeWorld.
pub const BASE_URL: &str = "https://animeworld.so";

/// AnimeWorld HTML scraper.
#[derive(Debug, Clone)]
pub struct AnimeWorldClient {
    base_url: String,
    concurrency: usize,
}

impl AnimeWorldClient {
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

    /// Ask the episode info API for the direct link of one episode.
    async fn resolve_episode(
        &self,
        client: &Client,
        episode: &Episode,
    ) -> Result<Option<String>, SiteError> {
        let url = absolute_url(&self.base_url, "/api/episode/info")?;
        let info: EpisodeInfoResponse =
            fetch_json(client.get(&url).query(&[("id", episode.link())])).await?;
        Ok(info.into_link())
    }
}

impl Default for AnimeWorldClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteAdapter for AnimeWorldClient {
    fn site(&self) -> Sites {
        Sites::AnimeWorld
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn search(&self, client: &Client, query: &str) -> Result<Vec<Anime>, SiteError> {
        let url = absolute_url(&self.base_url, "/search")?;
        let html = fetch_text(client.get(&url).query(&[("keyword", query)])).await?;
        let results = types::parse_search(&html)?;
        tracing::debug!(query, count = results.len(), "AnimeWorld search");
        Ok(results)
    }

    async fn get_anime_episodes(
        &self,
        client: &Client,
        anime: &Anime,
        hints: &ListingHints,
    ) -> Result<AnimeEpisodes, SiteError> {
        ensure_site(Sites::AnimeWorld, anime.site())?;

        let url = absolute_url(&self.base_url, anime.link())?;
        let html = fetch_text(client.get(&url)).await?;
        let raw = types::parse_episodes(&html)?
            .into_iter()
            .filter(|(number, _)| hints.accepts(*number));

        let episodes = episodes::normalize(Sites::AnimeWorld, raw);
        tracing::debug!(link = anime.link(), count = episodes.len(), "AnimeWorld episodes");
        Ok(AnimeEpisodes::new(anime.clone(), episodes))
    }

    async fn get_episodes_link(
        &self,
        client: &Client,
        anime_episodes: &AnimeEpisodes,
        range: RangeInclusive<u32>,
    ) -> Result<Vec<Video>, SiteError> {
        ensure_site(Sites::AnimeWorld, anime_episodes.site())?;

        episodes::resolve_range(
            Sites::AnimeWorld,
            anime_episodes,
            &range,
            self.concurrency,
            |episode| self.resolve_episode(client, episode),
        )
        .await
    }

    async fn get_info(&self, client: &Client, link: &str) -> Result<AnimeInfo, SiteError> {
        let url = absolute_url(&self.base_url, link)?;
        let html = fetch_text(client.get(&url)).await?;
        types::parse_info(&html)
    }
}
