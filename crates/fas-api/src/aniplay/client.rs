use std::ops::RangeInclusive;

use reqwest::Client;

use super::types::{self, AniPlaySeries, SearchResponse};
use crate::episodes;
use crate::error::{ensure_site, SiteError};
use crate::http::{absolute_url, fetch_json, fetch_text};
use crate::models::{Anime, AnimeEpisodes, AnimeInfo, Episode, Sites, Video};
use crate::traits::{ListingHints, SiteAdapter, DEFAULT_CONCURRENCY};

/// The base URL for AniPlay.
pub const BASE_URL: &str = "https://aniplay.co";

/// AniPlay's JSON API, used for search and series metadata.
pub const API_URL: &str = "https://api.aniplay.co";

/// AniPlay client. Episode data lives in the pages' hydration scripts.
#[derive(Debug, Clone)]
pub struct AniPlayClient {
    base_url: String,
    api_url: String,
    concurrency: usize,
}

impl AniPlayClient {
    pub fn new() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            api_url: API_URL.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    async fn resolve_episode(
        &self,
        client: &Client,
        episode: &Episode,
    ) -> Result<Option<String>, SiteError> {
        let url = absolute_url(&self.base_url, &format!("/watch/{}", episode.link()))?;
        let html = fetch_text(client.get(&url)).await?;
        Ok(types::parse_streaming_link(
            &html,
            episode.link(),
            episode.number(),
        ))
    }
}

impl Default for AniPlayClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteAdapter for AniPlayClient {
    fn site(&self) -> Sites {
        Sites::AniPlay
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn search(&self, client: &Client, query: &str) -> Result<Vec<Anime>, SiteError> {
        let url = absolute_url(&self.api_url, "/api/series/advancedSearch")?;
        let resp: SearchResponse = fetch_json(client.get(&url).query(&[
            ("sort", "1"),
            ("page", "1"),
            ("_q", query),
        ]))
        .await?;

        tracing::debug!(query, count = resp.data.len(), "AniPlay search");
        Ok(resp.data.into_iter().map(|i| i.into_anime()).collect())
    }

    async fn get_anime_episodes(
        &self,
        client: &Client,
        anime: &Anime,
        hints: &ListingHints,
    ) -> Result<AnimeEpisodes, SiteError> {
        ensure_site(Sites::AniPlay, anime.site())?;

        let url = absolute_url(&self.base_url, anime.link())?;
        let html = fetch_text(client.get(&url)).await?;
        let raw = types::parse_episodes(&html)?
            .into_iter()
            .filter(|(number, _)| hints.accepts(*number));

        let episodes = episodes::normalize(Sites::AniPlay, raw);
        tracing::debug!(link = anime.link(), count = episodes.len(), "AniPlay episodes");
        Ok(AnimeEpisodes::new(anime.clone(), episodes))
    }

    async fn get_episodes_link(
        &self,
        client: &Client,
        anime_episodes: &AnimeEpisodes,
        range: RangeInclusive<u32>,
    ) -> Result<Vec<Video>, SiteError> {
        ensure_site(Sites::AniPlay, anime_episodes.site())?;

        episodes::resolve_range(
            Sites::AniPlay,
            anime_episodes,
            &range,
            self.concurrency,
            |episode| self.resolve_episode(client, episode),
        )
        .await
    }

    async fn get_info(&self, client: &Client, link: &str) -> Result<AnimeInfo, SiteError> {
        let id = types::series_id(link)?;
        let url = absolute_url(&self.api_url, &format!("/api/series/{id}"))?;
        let series: AniPlaySeries = fetch_json(client.get(&url)).await?;
        series.into_info()
    }
}
