use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;

use crate::error::SiteError;
use crate::models::{Anime, AnimeInfo, AnimeState, Sites};

static RESULTS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".film-list").unwrap());
static RESULT_NAME: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".film-list .item a.name").unwrap());
static EPISODE_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".server.active .episodes .episode a").unwrap());
static SERVER: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".server").unwrap());
static INFO: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".widget.info").unwrap());
static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".title").unwrap());
static DESC: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".desc").unwrap());
static THUMB: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".thumb img").unwrap());
static META_DT: LazyLock<Selector> = LazyLock::new(|| Selector::parse("dl dt").unwrap());

static RE_YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(\d{4})\b").unwrap());
static RE_VOTE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+(?:[.,]\d+)?)").unwrap());

/// Response of `/api/episode/info`.
#[derive(Debug, Deserialize)]
pub struct EpisodeInfoResponse {
    pub grabber: Option<String>,
}

impl EpisodeInfoResponse {
    /// The direct media link, if the upstream returned a usable one.
    pub fn into_link(self) -> Option<String> {
        self.grabber
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty())
    }
}

/// Map AnimeWorld's "Stato" text to an [`AnimeState`].
pub fn map_state(text: &str) -> AnimeState {
    match text.trim().to_lowercase().as_str() {
        "in corso" => AnimeState::InCorso,
        "finito" => AnimeState::Finito,
        _ => AnimeState::NonValido,
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse the `/search` results page.
pub fn parse_search(html: &str) -> Result<Vec<Anime>, SiteError> {
    let document = Html::parse_document(html);

    if document.select(&RESULTS).next().is_none() {
        return Err(SiteError::Parse("search results list not found".into()));
    }

    let results = document
        .select(&RESULT_NAME)
        .filter_map(|a| {
            let link = a.value().attr("href")?.trim().to_string();
            let text = collapse_whitespace(&a.text().collect::<String>());
            let name = if text.is_empty() {
                a.value().attr("data-jtitle")?.trim().to_string()
            } else {
                text
            };
            if link.is_empty() || name.is_empty() {
                return None;
            }
            Some(Anime::new(name, link, Sites::AnimeWorld))
        })
        .collect();

    Ok(results)
}

/// Parse the catalog page into raw `(number, data-id)` pairs.
///
/// The number comes from `data-num`. The position in the list is used only
/// when the link carries no number at all; specials such as "2.5" are dropped.
pub fn parse_episodes(html: &str) -> Result<Vec<(u32, String)>, SiteError> {
    let document = Html::parse_document(html);

    if document.select(&INFO).next().is_none() && document.select(&SERVER).next().is_none() {
        return Err(SiteError::Parse("not an AnimeWorld catalog page".into()));
    }

    let mut raw = Vec::new();
    for (index, a) in document.select(&EPISODE_LINK).enumerate() {
        let Some(id) = a.value().attr("data-id") else {
            tracing::warn!(index, "AnimeWorld episode without data-id");
            continue;
        };
        let label = a
            .value()
            .attr("data-num")
            .or_else(|| a.value().attr("data-episode-num"));
        let number = match label {
            None => index as u32 + 1,
            Some(label) => match label.trim().parse::<u32>() {
                Ok(number) => number,
                Err(_) => {
                    tracing::warn!(id, label, "AnimeWorld episode with unusable number");
                    continue;
                }
            },
        };
        raw.push((number, id.to_string()));
    }

    Ok(raw)
}

/// Parse the `.widget.info` block of a catalog page.
pub fn parse_info(html: &str) -> Result<AnimeInfo, SiteError> {
    let document = Html::parse_document(html);
    let info = document
        .select(&INFO)
        .next()
        .ok_or_else(|| SiteError::Parse("info widget not found".into()))?;

    let title = info.select(&TITLE).next();
    let name = title
        .map(|t| collapse_whitespace(&t.text().collect::<String>()))
        .filter(|n| !n.is_empty())
        .or_else(|| {
            title
                .and_then(|t| t.value().attr("data-jtitle"))
                .map(str::to_string)
        })
        .ok_or_else(|| SiteError::Parse("anime title not found".into()))?;

    let description = info
        .select(&DESC)
        .next()
        .map(|d| collapse_whitespace(&d.text().collect::<String>()))
        .filter(|d| !d.is_empty());

    let cover = info
        .select(&THUMB)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(str::to_string);

    // Each `dt` pairs with the element right after it, when that is a `dd`.
    let meta: HashMap<String, String> = info
        .select(&META_DT)
        .filter_map(|dt| {
            let dd = dt.next_siblings().find_map(ElementRef::wrap)?;
            if dd.value().name() != "dd" {
                return None;
            }
            let label = collapse_whitespace(&dt.text().collect::<String>());
            let value = collapse_whitespace(&dd.text().collect::<String>());
            Some((label.trim_end_matches(':').trim().to_lowercase(), value))
        })
        .collect();

    let field = |label: &str| meta.get(label).map(String::as_str).filter(|v| !v.is_empty());

    let genres = field("genere")
        .map(|g| {
            g.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let year = field("data di uscita")
        .and_then(|d| RE_YEAR.captures(d))
        .and_then(|c| c[1].parse().ok());

    let stars = field("voto")
        .and_then(|v| RE_VOTE.captures(v))
        .and_then(|c| c[1].replace(',', ".").parse().ok());

    let episode_count = field("episodi").and_then(|e| e.trim().parse().ok());

    let state = field("stato").map(map_state).unwrap_or(AnimeState::NonValido);

    Ok(AnimeInfo::new(
        name,
        description,
        cover,
        None,
        None,
        genres,
        stars,
        year,
        field("studio").map(str::to_string),
        state,
        episode_count,
        Sites::AnimeWorld,
    ))
}
