use thiserror::Error;

use crate::models::Sites;

/// Errors from a site adapter.
#[derive(Debug, Error)]
pub enum SiteError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid link: {0}")]
    InvalidLink(String),

    #[error("{found} entity passed to the {expected} adapter")]
    WrongSite { expected: Sites, found: Sites },
}

impl From<serde_json::Error> for SiteError {
    fn from(e: serde_json::Error) -> Self {
        SiteError::Parse(e.to_string())
    }
}

/// Fail with [`SiteError::WrongSite`] unless `found` is `expected`.
pub(crate) fn ensure_site(expected: Sites, found: Sites) -> Result<(), SiteError> {
    if expected == found {
        Ok(())
    } else {
        Err(SiteError::WrongSite { expected, found })
    }
}
