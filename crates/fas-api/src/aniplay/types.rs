use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use serde::Deserialize;

use crate::error::SiteError;
use crate::models::{Anime, AnimeInfo, AnimeState, Sites};

static SCRIPT: LazyLock<Selector> = LazyLock::new(|| Selector::parse("script").unwrap());

static RE_EPISODES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)episodes:\s*\[(.*?)\]").unwrap());
static RE_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bid:(\d+)").unwrap());
static RE_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"\bnumber:"(\d+)""#).unwrap());
static RE_STREAMING_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bstreaming_link:"([^"]+)""#).unwrap());
static RE_SERIES_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/series/(\d+)").unwrap());

// ── API responses ───────────────────────────────────────────────

/// Response of `/api/series/advancedSearch`.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub data: Vec<AniPlaySearchItem>,
}

#[derive(Debug, Deserialize)]
pub struct AniPlaySearchItem {
    pub id: u64,
    pub title: String,
}

impl AniPlaySearchItem {
    pub fn into_anime(self) -> Anime {
        Anime::new(self.title, format!("/series/{}", self.id), Sites::AniPlay)
    }
}

/// Response of `/api/series/{id}`.
#[derive(Debug, Deserialize)]
pub struct AniPlaySeries {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub genres: Vec<AniPlayNamed>,
    #[serde(default)]
    pub studios: Vec<AniPlayNamed>,
    pub score: Option<serde_json::Value>,
    pub release_date: Option<String>,
    pub episodes_count: Option<u32>,
    pub main_image: Option<AniPlayImage>,
    pub banner_image: Option<AniPlayImage>,
}

#[derive(Debug, Deserialize)]
pub struct AniPlayNamed {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct AniPlayImage {
    pub thumbnail_url: Option<String>,
    pub original_url: Option<String>,
}

impl AniPlaySeries {
    pub fn into_info(self) -> Result<AnimeInfo, SiteError> {
        let name = self
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| SiteError::Parse("series without a title".into()))?;

        let stars = match self.score {
            Some(serde_json::Value::Number(n)) => n.as_f64().map(|f| f as f32),
            Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        };

        let year = self
            .release_date
            .as_deref()
            .and_then(|d| d.get(..4))
            .and_then(|y| y.parse().ok());

        let (cover, cover_full) = match self.main_image {
            Some(img) => (img.thumbnail_url, img.original_url),
            None => (None, None),
        };

        let studio = (!self.studios.is_empty()).then(|| {
            self.studios
                .into_iter()
                .map(|s| s.name)
                .collect::<Vec<_>>()
                .join(", ")
        });

        Ok(AnimeInfo::new(
            name,
            self.description.filter(|d| !d.trim().is_empty()),
            cover,
            cover_full,
            self.banner_image.and_then(|b| b.original_url),
            self.genres.into_iter().map(|g| g.name).collect(),
            stars,
            year,
            studio,
            self.status.as_deref().map(map_state).unwrap_or(AnimeState::NonValido),
            self.episodes_count,
            Sites::AniPlay,
        ))
    }
}

// ── Page payload parsing ────────────────────────────────────────

/// Map AniPlay's status text to an [`AnimeState`].
pub fn map_state(text: &str) -> AnimeState {
    match text.trim().to_lowercase().as_str() {
        "in corso" => AnimeState::InCorso,
        "completato" | "terminato" | "finito" => AnimeState::Finito,
        _ => AnimeState::NonValido,
    }
}

/// Extract the numeric series id from a `/series/{id}` link.
pub fn series_id(link: &str) -> Result<u64, SiteError> {
    RE_SERIES_ID
        .captures(link)
        .and_then(|c| c[1].parse().ok())
        .ok_or_else(|| SiteError::InvalidLink(link.to_string()))
}

/// The `episodes:[…]` array of the page's hydration script, split per entry.
fn episode_entries(html: &str) -> Option<Vec<String>> {
    let document = Html::parse_document(html);
    let script = document
        .select(&SCRIPT)
        .map(|s| s.text().collect::<String>())
        .filter(|text| RE_EPISODES.is_match(text))
        .last()?;

    let data = RE_EPISODES.captures(&script)?.get(1)?.as_str().to_string();
    Some(
        data.split("},{")
            .map(|entry| entry.replace("\\u002F", "/"))
            .collect(),
    )
}

/// Parse a series page into raw `(number, episode id)` pairs.
pub fn parse_episodes(html: &str) -> Result<Vec<(u32, String)>, SiteError> {
    let Some(entries) = episode_entries(html) else {
        let document = Html::parse_document(html);
        if document.select(&SCRIPT).next().is_none() {
            return Err(SiteError::Parse("series page has no payload script".into()));
        }
        return Ok(Vec::new());
    };

    Ok(entries
        .iter()
        .filter_map(|entry| {
            let id = RE_ID.captures(entry)?.get(1)?.as_str().to_string();
            let number = RE_NUMBER.captures(entry)?.get(1)?.as_str().parse().ok()?;
            Some((number, id))
        })
        .collect())
}

/// Find the streaming link of one episode on a `/watch/{id}` page.
///
/// Matches the entry by episode id first, then by number.
pub fn parse_streaming_link(html: &str, episode_id: &str, number: u32) -> Option<String> {
    let entries = episode_entries(html)?;

    let id_of = |entry: &str| RE_ID.captures(entry).map(|c| c[1].to_string());
    let number_of = |entry: &str| {
        RE_NUMBER
            .captures(entry)
            .and_then(|c| c[1].parse::<u32>().ok())
    };

    let entry = entries
        .iter()
        .find(|e| id_of(e.as_str()).as_deref() == Some(episode_id))
        .or_else(|| entries.iter().find(|e| number_of(e.as_str()) == Some(number)))?;

    RE_STREAMING_LINK
        .captures(entry)
        .map(|c| c[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERIES_HTML: &str = r#"
        <html><head><script src="/_nuxt/app.js"></script></head><body>
        <script>window.__NUXT__=(function(a,b){return {data:[{series:{id:1042,title:"Naruto",
        episodes:[{id:51001,anime_id:1042,number:"1",title:"Arriva Naruto"},{id:51002,anime_id:1042,number:"2",title:"Konohamaru"},{id:51003,anime_id:1042,number:"3",title:"Sasuke"}],
        status:"Completato"}}]}}(null,false))</script>
        </body></html>
    "#;

    const WATCH_HTML: &str = r#"
        <html><body>
        <script>window.__NUXT__={data:[{episode:{id:51002,number:"2",
        episodes:[{id:51001,number:"1",streaming_link:"https://cdn.aniplay.co/naruto/1.mp4"},{id:51002,number:"2",streaming_link:"https://cdn.aniplay.co/naruto/2.mp4"},{id:51003,number:"3"}]}}]}</script>
        </body></html>
    "#;

    #[test]
    fn test_search_response() {
        let json = r#"{"data":[{"id":1042,"title":"Naruto","type":"Serie"},{"id":1043,"title":"Naruto Shippuden"}],"total":2}"#;
        let resp: SearchResponse = serde_json::from_str(json).unwrap();
        let results: Vec<Anime> = resp.data.into_iter().map(|i| i.into_anime()).collect();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].name(), "Naruto");
        assert_eq!(results[0].link(), "/series/1042");
        assert!(results.iter().all(|a| a.site() == Sites::AniPlay));
    }

    #[test]
    fn test_empty_search_response() {
        let resp: SearchResponse = serde_json::from_str(r#"{"data":[]}"#).unwrap();
        assert!(resp.data.is_empty());
    }

    #[test]
    fn test_malformed_search_response() {
        assert!(serde_json::from_str::<SearchResponse>(r#"{"error":"x"}"#).is_err());
    }

    #[test]
    fn test_parse_episodes() {
        let raw = parse_episodes(SERIES_HTML).unwrap();
        assert_eq!(
            raw,
            vec![
                (1, "51001".to_string()),
                (2, "51002".to_string()),
                (3, "51003".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_episodes_without_listing() {
        let html = r#"<html><body><script>window.__NUXT__={data:[{}]}</script></body></html>"#;
        assert!(parse_episodes(html).unwrap().is_empty());

        let err = parse_episodes("<html><body>502 Bad Gateway</body></html>").unwrap_err();
        assert!(matches!(err, SiteError::Parse(_)));
    }

    #[test]
    fn test_parse_streaming_link() {
        assert_eq!(
            parse_streaming_link(WATCH_HTML, "51002", 2).as_deref(),
            Some("https://cdn.aniplay.co/naruto/2.mp4")
        );
        // Unknown id falls back to the number.
        assert_eq!(
            parse_streaming_link(WATCH_HTML, "99999", 1).as_deref(),
            Some("https://cdn.aniplay.co/naruto/1.mp4")
        );
        // Listed but without a link.
        assert_eq!(parse_streaming_link(WATCH_HTML, "51003", 3), None);
        assert_eq!(parse_streaming_link("<html></html>", "51001", 1), None);
    }

    #[test]
    fn test_series_id() {
        assert_eq!(series_id("/series/1042").unwrap(), 1042);
        assert!(matches!(series_id("/anime/1"), Err(SiteError::InvalidLink(_))));
    }

    #[test]
    fn test_series_into_info() {
        let json = r#"{
            "id": 1042,
            "title": "Naruto",
            "description": "Un ninja chiassoso.",
            "status": "Completato",
            "genres": [{"id": 1, "name": "Azione"}, {"id": 2, "name": "Avventura"}],
            "studios": [{"name": "Studio Pierrot"}],
            "score": 7.9,
            "release_date": "2002-10-03",
            "episodes_count": 220,
            "main_image": {"thumbnail_url": "https://img/t.jpg", "original_url": "https://img/o.jpg"},
            "banner_image": null
        }"#;
        let series: AniPlaySeries = serde_json::from_str(json).unwrap();
        let info = series.into_info().unwrap();
        assert_eq!(info.name(), "Naruto");
        assert_eq!(info.description(), Some("Un ninja chiassoso."));
        assert_eq!(info.cover(), Some("https://img/t.jpg"));
        assert_eq!(info.cover_full(), Some("https://img/o.jpg"));
        assert_eq!(info.banner(), None);
        assert_eq!(info.genres(), ["Azione", "Avventura"]);
        assert!((info.stars().unwrap() - 7.9).abs() < 0.001);
        assert_eq!(info.year(), Some(2002));
        assert_eq!(info.studio(), Some("Studio Pierrot"));
        assert_eq!(info.state(), AnimeState::Finito);
        assert_eq!(info.episode_count(), Some(220));
        assert_eq!(info.site(), Sites::AniPlay);
    }

    #[test]
    fn test_sparse_series_into_info() {
        let series: AniPlaySeries =
            serde_json::from_str(r#"{"title":"Nuovo","status":"Annunciato"}"#).unwrap();
        let info = series.into_info().unwrap();
        assert_eq!(info.state(), AnimeState::NonValido);
        assert_eq!(info.studio(), None);
        assert_eq!(info.year(), None);
        assert!(info.genres().is_empty());
    }

    #[test]
    fn test_state_mapping() {
        assert_eq!(map_state("In corso"), AnimeState::InCorso);
        assert_eq!(map_state("Completato"), AnimeState::Finito);
        assert_eq!(map_state("Annunciato"), AnimeState::NonValido);
    }
}
