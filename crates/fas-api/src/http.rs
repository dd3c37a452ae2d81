use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::SiteError;

/// Check the HTTP response for errors and return the body text on failure.
async fn check_response(resp: Response) -> Result<Response, SiteError> {
    if resp.status().is_success() {
        Ok(resp)
    } else {
        let status = resp.status().as_u16();
        let url = resp.url().to_string();
        let body = resp.text().await.unwrap_or_default();
        tracing::warn!(status, %url, "upstream returned an error status");
        Err(SiteError::Api {
            status,
            message: body,
        })
    }
}

/// Send a request and return the body as text.
pub(crate) async fn fetch_text(req: RequestBuilder) -> Result<String, SiteError> {
    let resp = check_response(req.send().await?).await?;
    Ok(resp.text().await?)
}

/// Send a request and deserialize the JSON body.
pub(crate) async fn fetch_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, SiteError> {
    let resp = check_response(req.send().await?).await?;
    resp.json()
        .await
        .map_err(|e| SiteError::Parse(e.to_string()))
}

/// Resolve a site-relative link against `base`. Absolute links pass through.
///
/// Every upstream URL goes through here. A leading `/` on `link` is relative to
/// `base` itself, so a mirror mounted under a path prefix keeps that prefix.
pub(crate) fn absolute_url(base: &str, link: &str) -> Result<String, SiteError> {
    if let Ok(url) = Url::parse(link) {
        return Ok(url.into());
    }

    let mut base = Url::parse(base).map_err(|e| SiteError::InvalidLink(format!("{base}: {e}")))?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(link.trim_start_matches('/'))
        .map(String::from)
        .map_err(|e| SiteError::InvalidLink(format!("{link}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_url_relative_link() {
        let url = absolute_url("https://animeworld.so", "/play/naruto.abc").unwrap();
        assert_eq!(url, "https://animeworld.so/play/naruto.abc");
    }

    #[test]
    fn test_absolute_url_keeps_absolute_link() {
        let url = absolute_url(
            "https://www.animeunity.to",
            "https://mirror.example/anime/12-one-piece",
        )
        .unwrap();
        assert_eq!(url, "https://mirror.example/anime/12-one-piece");
    }

    #[test]
    fn test_absolute_url_keeps_base_path_prefix() {
        let base = "https://mirror.example/aw";
        assert_eq!(
            absolute_url(base, "/search").unwrap(),
            "https://mirror.example/aw/search"
        );
        assert_eq!(
            absolute_url(base, "/play/naruto.abc").unwrap(),
            "https://mirror.example/aw/play/naruto.abc"
        );
        assert_eq!(
            absolute_url("https://mirror.example/aw/", "api/episode/info").unwrap(),
            "https://mirror.example/aw/api/episode/info"
        );
    }

    #[test]
    fn test_absolute_url_bad_base() {
        let err = absolute_url("not a url", "/x").unwrap_err();
        assert!(matches!(err, SiteError::InvalidLink(_)));
    }

    #[tokio::test]
    async fn test_fetch_text_refused_connection_is_http_error() {
        let client = reqwest::Client::new();
        let err = fetch_text(client.get("http://127.0.0.1:9/"))
            .await
            .unwrap_err();
        assert!(matches!(err, SiteError::Http(_)));
    }
}
