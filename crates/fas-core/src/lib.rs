//! Configuration and the [`Fas`] facade over the site adapters in `fas_api`.

pub mod config;
pub mod error;
pub mod facade;

pub use config::AppConfig;
pub use error::FasError;
pub use facade::{validate_range, Fas};

pub use fas_api::{
    Anime, AnimeEpisodes, AnimeInfo, AnimeState, Episode, ListingHints, SiteError, Sites, Video,
};
