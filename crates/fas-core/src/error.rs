use fas_api::{SiteError, Sites};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FasError {
    #[error(transparent)]
    Site(#[from] SiteError),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("invalid episode range {start}..={end} (last listed episode: {available:?})")]
    InvalidRange {
        start: u32,
        end: u32,
        available: Option<u32>,
    },

    #[error("{0} is disabled in the config")]
    SiteDisabled(Sites),
}
