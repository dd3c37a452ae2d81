//! Single entry point that owns the HTTP client and dispatches on [`Sites`].

use std::ops::RangeInclusive;
use std::time::Duration;

use fas_api::{
    AniPlayClient, Anime, AnimeEpisodes, AnimeInfo, AnimeUnityClient, AnimeWorldClient,
    ListingHints, SiteAdapter, Sites, Video,
};
use futures::future::join_all;
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::{AppConfig, HttpConfig};
use crate::error::FasError;

/// Call `$method` on the adapter matching `$site`, passing the shared client first.
macro_rules! dispatch {
    ($self:ident, $site:expr, $method:ident($($arg:expr),*)) => {
        match $site {
            Sites::AnimeUnity => $self.animeunity.$method(&$self.http, $($arg),*).await,
            Sites::AnimeWorld => $self.animeworld.$method(&$self.http, $($arg),*).await,
            Sites::AniPlay => $self.aniplay.$method(&$self.http, $($arg),*).await,
        }
    };
}

/// Client facade over every site adapter.
pub struct Fas {
    http: Client,
    config: AppConfig,
    animeunity: AnimeUnityClient,
    animeworld: AnimeWorldClient,
    aniplay: AniPlayClient,
}

/// Build the shared HTTP client from config. Redirects are followed by default.
pub fn build_client(config: &HttpConfig) -> Result<Client, FasError> {
    let mut builder = Client::builder().user_agent(config.user_agent.clone());
    if let Some(secs) = config.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    Ok(builder.build()?)
}

/// Check `range` against a listing before resolving it.
///
/// The range must start at 1 or later, be non-decreasing and end at or before
/// the last listed episode.
pub fn validate_range(
    episodes: &AnimeEpisodes,
    range: &RangeInclusive<u32>,
) -> Result<(), FasError> {
    let (start, end) = (*range.start(), *range.end());
    let available = episodes.last_number();
    let in_bounds = available.is_some_and(|last| end <= last);
    if start == 0 || start > end || !in_bounds {
        return Err(FasError::InvalidRange {
            start,
            end,
            available,
        });
    }
    Ok(())
}

impl Fas {
    /// Build the facade and its HTTP client from config.
    pub fn new(config: AppConfig) -> Result<Self, FasError> {
        let http = build_client(&config.http)?;
        Ok(Self::with_client(http, config))
    }

    /// Build the facade around an injected HTTP client.
    pub fn with_client(http: Client, config: AppConfig) -> Self {
        let concurrency = config.http.concurrency;

        let mut animeunity = AnimeUnityClient::new().with_concurrency(concurrency);
        if let Some(url) = &config.sites.animeunity.base_url {
            animeunity = animeunity.with_base_url(url.clone());
        }

        let mut animeworld = AnimeWorldClient::new().with_concurrency(concurrency);
        if let Some(url) = &config.sites.animeworld.base_url {
            animeworld = animeworld.with_base_url(url.clone());
        }

        let mut aniplay = AniPlayClient::new().with_concurrency(concurrency);
        if let Some(url) = &config.sites.aniplay.base_url {
            aniplay = aniplay.with_base_url(url.clone());
        }
        if let Some(url) = &config.sites.aniplay.api_url {
            aniplay = aniplay.with_api_url(url.clone());
        }

        Self {
            http,
            config,
            animeunity,
            animeworld,
            aniplay,
        }
    }

    pub fn client(&self) -> &Client {
        &self.http
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The upstream root the adapter for `site` targets.
    pub fn base_url(&self, site: Sites) -> &str {
        match site {
            Sites::AnimeUnity => self.animeunity.base_url(),
            Sites::AnimeWorld => self.animeworld.base_url(),
            Sites::AniPlay => self.aniplay.base_url(),
        }
    }

    fn ensure_enabled(&self, site: Sites) -> Result<(), FasError> {
        if self.config.site(site).enabled {
            Ok(())
        } else {
            Err(FasError::SiteDisabled(site))
        }
    }

    /// Search one site by title.
    pub async fn search(&self, site: Sites, query: &str) -> Result<Vec<Anime>, FasError> {
        self.ensure_enabled(site)?;
        let results = dispatch!(self, site, search(query))?;
        debug_assert!(results.iter().all(|a| a.site() == site));
        debug!(%site, query, count = results.len(), "search finished");
        Ok(results)
    }

    /// Search every enabled site concurrently. Results are not deduplicated.
    pub async fn search_all(&self, query: &str) -> Vec<(Sites, Result<Vec<Anime>, FasError>)> {
        let searches = self
            .config
            .enabled_sites()
            .into_iter()
            .map(|site| async move { (site, self.search(site, query).await) });

        let results = join_all(searches).await;
        for (site, result) in &results {
            if let Err(e) = result {
                warn!(%site, error = %e, "search failed");
            }
        }
        results
    }

    /// List the episodes of `anime` on the site it came from.
    pub async fn get_anime_episodes(
        &self,
        anime: &Anime,
        hints: &ListingHints,
    ) -> Result<AnimeEpisodes, FasError> {
        let site = anime.site();
        self.ensure_enabled(site)?;
        let episodes = dispatch!(self, site, get_anime_episodes(anime, hints))?;
        debug_assert!(episodes.episodes().iter().all(|e| e.site() == site));
        Ok(episodes)
    }

    /// Validate `range` against the listing, then resolve its video links.
    pub async fn get_episodes_link(
        &self,
        episodes: &AnimeEpisodes,
        range: RangeInclusive<u32>,
    ) -> Result<Vec<Video>, FasError> {
        let site = episodes.site();
        self.ensure_enabled(site)?;
        validate_range(episodes, &range)?;

        let videos = dispatch!(self, site, get_episodes_link(episodes, range.clone()))?;
        debug_assert!(videos
            .iter()
            .all(|v| v.site() == site && range.contains(&v.number())));

        let unresolved = videos.iter().filter(|v| !v.is_resolved()).count();
        if unresolved > 0 {
            warn!(%site, unresolved, total = videos.len(), "some episode links are missing");
        }
        Ok(videos)
    }

    /// Fetch rich metadata for the catalog entry at `link` on `site`.
    pub async fn get_info(&self, site: Sites, link: &str) -> Result<AnimeInfo, FasError> {
        self.ensure_enabled(site)?;
        let info = dispatch!(self, site, get_info(link))?;
        debug_assert_eq!(info.site(), site);
        Ok(info)
    }
}
