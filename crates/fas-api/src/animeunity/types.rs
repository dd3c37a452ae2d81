use std::ops::RangeInclusive;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use serde::Deserialize;

use crate::error::SiteError;
use crate::models::{Anime, AnimeInfo, AnimeState, Sites};

/// Episodes returned per `info_api` range request.
pub const PAGE_SIZE: u32 = 120;

/// Largest `episodes_count` accepted before paging the listing.
pub const MAX_EPISODE_COUNT: u32 = 100_000;

static ARCHIVIO: LazyLock<Selector> = LazyLock::new(|| Selector::parse("archivio").unwrap());
static VIDEO_PLAYER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("video-player").unwrap());

static RE_ANIME_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/anime/(\d+)").unwrap());

// ── JSON payloads ───────────────────────────────────────────────

/// One entry of the `records` attribute of `<archivio>`.
#[derive(Debug, Deserialize)]
pub struct UnityRecord {
    pub id: u64,
    pub slug: String,
    pub title: Option<String>,
    pub title_eng: Option<String>,
}

impl UnityRecord {
    pub fn into_anime(self) -> Anime {
        let name = self
            .title_eng
            .filter(|t| !t.trim().is_empty())
            .or(self.title)
            .unwrap_or_else(|| self.slug.clone());
        Anime::new(
            name,
            format!("/anime/{}-{}", self.id, self.slug),
            Sites::AnimeUnity,
        )
    }
}

/// Response of `/info_api/{id}/`.
#[derive(Debug, Deserialize)]
pub struct InfoApiResponse {
    pub episodes_count: u32,
}

/// Response of `/info_api/{id}/1?start_range=..&end_range=..`.
#[derive(Debug, Deserialize)]
pub struct EpisodesPage {
    #[serde(default)]
    pub episodes: Vec<UnityEpisode>,
}

#[derive(Debug, Deserialize)]
pub struct UnityEpisode {
    pub id: u64,
    /// Upstream sends numbers as strings; specials look like "12.5".
    pub number: serde_json::Value,
}

impl UnityEpisode {
    pub fn number(&self) -> Option<u32> {
        match &self.number {
            serde_json::Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// The `anime` attribute of `<video-player>` on a catalog page.
#[derive(Debug, Deserialize)]
pub struct UnityAnime {
    pub title: Option<String>,
    pub title_eng: Option<String>,
    pub plot: Option<String>,
    pub imageurl: Option<String>,
    pub cover: Option<String>,
    pub imageurl_cover: Option<String>,
    #[serde(default)]
    pub genres: Vec<UnityGenre>,
    pub studio: Option<String>,
    pub score: Option<serde_json::Value>,
    pub date: Option<String>,
    pub status: Option<String>,
    pub episodes_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct UnityGenre {
    pub name: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl UnityAnime {
    pub fn into_info(self, episodes_count: Option<u32>) -> Result<AnimeInfo, SiteError> {
        let name = non_empty(self.title_eng)
            .or_else(|| non_empty(self.title))
            .ok_or_else(|| SiteError::Parse("anime without a title".into()))?;

        let stars = match self.score {
            Some(serde_json::Value::Number(n)) => n.as_f64().map(|f| f as f32),
            Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        };

        let year = self
            .date
            .as_deref()
            .and_then(|d| d.trim().get(..4))
            .and_then(|y| y.parse().ok());

        Ok(AnimeInfo::new(
            name,
            non_empty(self.plot),
            non_empty(self.imageurl),
            non_empty(self.cover),
            non_empty(self.imageurl_cover),
            self.genres.into_iter().map(|g| g.name).collect(),
            stars,
            year,
            non_empty(self.studio),
            self.status.as_deref().map(map_state).unwrap_or(AnimeState::NonValido),
            self.episodes_count.or(episodes_count),
            Sites::AnimeUnity,
        ))
    }
}

// ── Parsing ─────────────────────────────────────────────────────

/// Map AnimeUnity's status text to an [`AnimeState`].
pub fn map_state(text: &str) -> AnimeState {
    match text.trim().to_lowercase().as_str() {
        "in corso" => AnimeState::InCorso,
        "terminato" => AnimeState::Finito,
        _ => AnimeState::NonValido,
    }
}

/// Extract the numeric anime id from a `/anime/{id}-{slug}` link.
pub fn anime_id(link: &str) -> Result<u64, SiteError> {
    RE_ANIME_ID
        .captures(link)
        .and_then(|c| c[1].parse().ok())
        .ok_or_else(|| SiteError::InvalidLink(link.to_string()))
}

/// Parse the `/archivio` page.
pub fn parse_search(html: &str) -> Result<Vec<Anime>, SiteError> {
    let document = Html::parse_document(html);
    let records = document
        .select(&ARCHIVIO)
        .next()
        .and_then(|el| el.value().attr("records"))
        .ok_or_else(|| SiteError::Parse("archivio records not found".into()))?;

    let records: Vec<UnityRecord> = serde_json::from_str(records)?;
    Ok(records.into_iter().map(UnityRecord::into_anime).collect())
}

/// Page bounds `(start, end)` covering `count` episodes, restricted to those
/// overlapping `range` when one is given. `end` never passes `count`.
pub fn page_ranges(count: u32, range: Option<&RangeInclusive<u32>>) -> Vec<(u32, u32)> {
    let (first, last) = match range {
        Some(r) => ((*r.start()).max(1), (*r.end()).min(count)),
        None => (1, count),
    };
    if count == 0 || first > last {
        return Vec::new();
    }

    ((first - 1) / PAGE_SIZE..=(last - 1) / PAGE_SIZE)
        .map(|page| {
            let start = page * PAGE_SIZE + 1;
            (start, start.saturating_add(PAGE_SIZE - 1).min(count))
        })
        .collect()
}

/// Parse one `info_api` range page into raw `(number, episode id)` pairs.
pub fn parse_episodes_page(page: EpisodesPage) -> Vec<(u32, String)> {
    page.episodes
        .into_iter()
        .filter_map(|ep| match ep.number() {
            Some(number) => Some((number, ep.id.to_string())),
            None => {
                tracing::warn!(id = ep.id, number = %ep.number, "AnimeUnity episode with unusable number");
                None
            }
        })
        .collect()
}

/// Pull the `embed_url` attribute out of an episode page.
pub fn parse_embed_url(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    document
        .select(&VIDEO_PLAYER)
        .next()
        .and_then(|el| el.value().attr("embed_url"))
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
}

/// Parse the `<video-player>` element of a catalog page.
pub fn parse_info(html: &str) -> Result<AnimeInfo, SiteError> {
    let document = Html::parse_document(html);
    let player = document
        .select(&VIDEO_PLAYER)
        .next()
        .ok_or_else(|| SiteError::Parse("video-player element not found".into()))?;

    let anime_json = player
        .value()
        .attr("anime")
        .ok_or_else(|| SiteError::Parse("video-player has no anime attribute".into()))?;
    let anime: UnityAnime = serde_json::from_str(anime_json)?;

    let episodes_count = player
        .value()
        .attr("episodes_count")
        .and_then(|c| c.trim().parse().ok());

    anime.into_info(episodes_count)
}
