//! Shared value types produced by every site adapter.
//!
//! Constructors take the full attribute set and accessors are plain reads.
//! Upstream text is coerced into these types by the adapters, never here.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Streaming sites with an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sites {
    AnimeUnity,
    AnimeWorld,
    AniPlay,
}

impl Sites {
    pub const ALL: &[Sites] = &[Self::AnimeUnity, Self::AnimeWorld, Self::AniPlay];

    /// Lowercase identifier used as the config table name. Matches the serde form.
    pub fn key(self) -> &'static str {
        match self {
            Self::AnimeUnity => "animeunity",
            Self::AnimeWorld => "animeworld",
            Self::AniPlay => "aniplay",
        }
    }
}

impl fmt::Display for Sites {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AnimeUnity => write!(f, "AnimeUnity"),
            Self::AnimeWorld => write!(f, "AnimeWorld"),
            Self::AniPlay => write!(f, "AniPlay"),
        }
    }
}

/// Airing status of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimeState {
    InCorso,
    Finito,
    /// Fallback for any status text the upstream uses that we don't know.
    NonValido,
}

impl fmt::Display for AnimeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InCorso => write!(f, "In corso"),
            Self::Finito => write!(f, "Finito"),
            Self::NonValido => write!(f, "Non valido"),
        }
    }
}

/// A catalog entry returned by a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anime {
    name: String,
    link: String,
    site: Sites,
}

impl Anime {
    pub fn new(name: String, link: String, site: Sites) -> Self {
        Self { name, link, site }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute or site-relative link to the catalog page.
    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn site(&self) -> Sites {
        self.site
    }
}

impl fmt::Display for Anime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] ({})", self.name, self.site, self.link)
    }
}

/// One playable unit of a catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    number: u32,
    link: String,
    site: Sites,
}

impl Episode {
    pub fn new(number: u32, link: String, site: Sites) -> Self {
        Self { number, link, site }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    /// Upstream episode identifier or page path. Opaque outside the adapter.
    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn site(&self) -> Sites {
        self.site
    }
}

impl fmt::Display for Episode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Episode {} [{}] ({})", self.number, self.site, self.link)
    }
}

/// A resolved video link for one episode.
///
/// Videos correlate to episodes by number only. `link` is `None` when the
/// episode was listed but its link could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    number: u32,
    link: Option<String>,
    site: Sites,
}

impl Video {
    pub fn new(number: u32, link: Option<String>, site: Sites) -> Self {
        Self { number, link, site }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn link(&self) -> Option<&str> {
        self.link.as_deref()
    }

    pub fn site(&self) -> Sites {
        self.site
    }

    pub fn is_resolved(&self) -> bool {
        self.link.is_some()
    }
}

impl fmt::Display for Video {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.link {
            Some(link) => write!(f, "Episode {} [{}]: {}", self.number, self.site, link),
            None => write!(f, "Episode {} [{}]: unresolved", self.number, self.site),
        }
    }
}

/// Rich metadata for one catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimeInfo {
    name: String,
    description: Option<String>,
    cover: Option<String>,
    cover_full: Option<String>,
    banner: Option<String>,
    genres: Vec<String>,
    stars: Option<f32>,
    year: Option<u32>,
    studio: Option<String>,
    state: AnimeState,
    episode_count: Option<u32>,
    site: Sites,
}

impl AnimeInfo {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: String,
        description: Option<String>,
        cover: Option<String>,
        cover_full: Option<String>,
        banner: Option<String>,
        genres: Vec<String>,
        stars: Option<f32>,
        year: Option<u32>,
        studio: Option<String>,
        state: AnimeState,
        episode_count: Option<u32>,
        site: Sites,
    ) -> Self {
        Self {
            name,
            description,
            cover,
            cover_full,
            banner,
            genres,
            stars,
            year,
            studio,
            state,
            episode_count,
            site,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn cover(&self) -> Option<&str> {
        self.cover.as_deref()
    }

    pub fn cover_full(&self) -> Option<&str> {
        self.cover_full.as_deref()
    }

    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn genres(&self) -> &[String] {
        &self.genres
    }

    pub fn stars(&self) -> Option<f32> {
        self.stars
    }

    pub fn year(&self) -> Option<u32> {
        self.year
    }

    pub fn studio(&self) -> Option<&str> {
        self.studio.as_deref()
    }

    pub fn state(&self) -> AnimeState {
        self.state
    }

    pub fn episode_count(&self) -> Option<u32> {
        self.episode_count
    }

    pub fn site(&self) -> Sites {
        self.site
    }
}

impl fmt::Display for AnimeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] - {}", self.name, self.site, self.state)?;
        if let Some(year) = self.year {
            write!(f, ", {year}")?;
        }
        if let Some(count) = self.episode_count {
            write!(f, ", {count} episodes")?;
        }
        if !self.genres.is_empty() {
            write!(f, " ({})", self.genres.join(", "))?;
        }
        Ok(())
    }
}

/// A catalog entry together with its episode listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimeEpisodes {
    anime: Anime,
    episodes: Vec<Episode>,
}

impl AnimeEpisodes {
    pub fn new(anime: Anime, episodes: Vec<Episode>) -> Self {
        Self { anime, episodes }
    }

    pub fn anime(&self) -> &Anime {
        &self.anime
    }

    /// Episodes ordered by number. Gaps mirror the upstream listing.
    pub fn episodes(&self) -> &[Episode] {
        &self.episodes
    }

    pub fn site(&self) -> Sites {
        self.anime.site
    }

    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }

    pub fn first_number(&self) -> Option<u32> {
        self.episodes.iter().map(Episode::number).min()
    }

    pub fn last_number(&self) -> Option<u32> {
        self.episodes.iter().map(Episode::number).max()
    }

    pub fn contains(&self, number: u32) -> bool {
        self.episodes.iter().any(|e| e.number == number)
    }
}

impl fmt::Display for AnimeEpisodes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} episodes", self.anime, self.episodes.len())
    }
}
