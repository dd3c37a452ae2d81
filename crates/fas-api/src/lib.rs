//! Site-abstraction layer for Italian anime streaming sites.
//!
//! Every adapter implements [`SiteAdapter`] over the shared data model in
//! [`models`]. The HTTP client is injected on each call.

pub mod animeunity;
pub mod animeworld;
pub mod aniplay;
mod episodes;
mod error;
mod http;
pub mod models;
pub mod traits;

pub use animeunity::AnimeUnityClient;
pub use animeworld::AnimeWorldClient;
pub use aniplay::AniPlayClient;
pub use error::SiteError;
pub use models::{Anime, AnimeEpisodes, AnimeInfo, AnimeState, Episode, Sites, Video};
pub use traits::{ListingHints, SiteAdapter, DEFAULT_CONCURRENCY};

pub type Result<T> = std::result::Result<T, SiteError>;
