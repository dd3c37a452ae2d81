//! Episode listing cleanup and concurrent range resolution, shared by all adapters.

use std::collections::HashSet;
use std::future::Future;
use std::ops::RangeInclusive;

use futures::stream::{self, StreamExt};

use crate::error::SiteError;
use crate::models::{AnimeEpisodes, Episode, Sites, Video};

/// Build a listing from raw `(number, link)` pairs.
///
/// Drops episode 0, keeps the first occurrence of a duplicated number and
/// sorts by number.
pub(crate) fn normalize(site: Sites, raw: impl IntoIterator<Item = (u32, String)>) -> Vec<Episode> {
    let mut seen = HashSet::new();
    let mut episodes: Vec<Episode> = raw
        .into_iter()
        .filter(|(number, link)| {
            if *number == 0 {
                tracing::warn!(%site, %link, "dropping episode without a valid number");
                return false;
            }
            if !seen.insert(*number) {
                tracing::debug!(%site, number, "dropping duplicate episode");
                return false;
            }
            true
        })
        .map(|(number, link)| Episode::new(number, link, site))
        .collect();
    episodes.sort_by_key(Episode::number);
    episodes
}

/// Resolve one video per listed episode inside `range`, `concurrency` at a time.
///
/// Each number is resolved once even if the listing repeats it. A failed
/// episode becomes a `Video` with no link. If every resolution fails the
/// first error is returned instead.
pub(crate) async fn resolve_range<'a, F, Fut>(
    site: Sites,
    episodes: &'a AnimeEpisodes,
    range: &RangeInclusive<u32>,
    concurrency: usize,
    resolve: F,
) -> Result<Vec<Video>, SiteError>
where
    F: Fn(&'a Episode) -> Fut,
    Fut: Future<Output = Result<Option<String>, SiteError>>,
{
    let mut seen = HashSet::new();
    let targets: Vec<&'a Episode> = episodes
        .episodes()
        .iter()
        .filter(|e| range.contains(&e.number()) && seen.insert(e.number()))
        .collect();

    if targets.is_empty() {
        return Ok(Vec::new());
    }

    tracing::debug!(%site, count = targets.len(), "resolving episode links");

    // Built eagerly: a `.map` closure over `&Episode` inside the stream is not provably `Send`.
    let requests: Vec<_> = targets
        .into_iter()
        .map(|episode| {
            let number = episode.number();
            let fut = resolve(episode);
            async move { (number, fut.await) }
        })
        .collect();

    let results: Vec<(u32, Result<Option<String>, SiteError>)> = stream::iter(requests)
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    if results.iter().all(|(_, r)| r.is_err()) {
        let first = results.into_iter().find_map(|(_, r)| r.err());
        return match first {
            Some(e) => Err(e),
            None => Ok(Vec::new()),
        };
    }

    Ok(results
        .into_iter()
        .map(|(number, result)| {
            let link = match result {
                Ok(link) => link,
                Err(e) => {
                    tracing::warn!(%site, number, error = %e, "episode link resolution failed");
                    None
                }
            };
            Video::new(number, link, site)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Anime;

    fn listing(numbers: &[u32]) -> AnimeEpisodes {
        let site = Sites::AnimeWorld;
        AnimeEpisodes::new(
            Anime::new("Test".into(), "/play/test".into(), site),
            numbers
                .iter()
                .map(|n| Episode::new(*n, format!("id-{n}"), site))
                .collect(),
        )
    }

    fn sorted_numbers(videos: &[Video]) -> Vec<u32> {
        let mut numbers: Vec<u32> = videos.iter().map(Video::number).collect();
        numbers.sort_unstable();
        numbers
    }

    #[test]
    fn test_normalize_sorts_and_dedupes() {
        let raw = vec![
            (3, "c".to_string()),
            (1, "a".to_string()),
            (0, "zero".to_string()),
            (2, "b".to_string()),
            (1, "dup".to_string()),
        ];
        let episodes = normalize(Sites::AniPlay, raw);
        let numbers: Vec<u32> = episodes.iter().map(Episode::number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(episodes[0].link(), "a");
        assert!(episodes.iter().all(|e| e.site() == Sites::AniPlay));
    }

    #[tokio::test]
    async fn test_resolve_range_stays_inside_range() {
        let episodes = listing(&[1, 2, 3, 4, 5, 6]);
        let videos = resolve_range(Sites::AnimeWorld, &episodes, &(2..=4), 3, |ep| async move {
            Ok(Some(format!("https://cdn/{}", ep.link())))
        })
        .await
        .unwrap();

        assert_eq!(sorted_numbers(&videos), vec![2, 3, 4]);
        assert!(videos.iter().all(|v| v.site() == Sites::AnimeWorld));
        let third = videos.iter().find(|v| v.number() == 3).unwrap();
        assert_eq!(third.link(), Some("https://cdn/id-3"));
    }

    #[tokio::test]
    async fn test_resolve_range_omits_gaps() {
        let episodes = listing(&[1, 2, 5]);
        let videos = resolve_range(Sites::AnimeWorld, &episodes, &(1..=5), 8, |_| async {
            Ok(Some("x".to_string()))
        })
        .await
        .unwrap();
        assert_eq!(sorted_numbers(&videos), vec![1, 2, 5]);
    }

    #[tokio::test]
    async fn test_resolve_range_partial_failure_is_absent_link() {
        let episodes = listing(&[1, 2, 3]);
        let videos = resolve_range(Sites::AnimeWorld, &episodes, &(1..=3), 2, |ep| async move {
            if ep.number() == 2 {
                Err(SiteError::Parse("boom".into()))
            } else {
                Ok(Some(format!("link-{}", ep.number())))
            }
        })
        .await
        .unwrap();

        assert_eq!(videos.len(), 3);
        let failed = videos.iter().find(|v| v.number() == 2).unwrap();
        assert!(!failed.is_resolved());
        assert_eq!(videos.iter().filter(|v| v.is_resolved()).count(), 2);
    }

    #[tokio::test]
    async fn test_resolve_range_all_failed_is_error() {
        let episodes = listing(&[1, 2, 3]);
        let result = resolve_range(Sites::AnimeWorld, &episodes, &(1..=3), 4, |_| async {
            Err(SiteError::Api {
                status: 503,
                message: String::new(),
            })
        })
        .await;
        assert!(matches!(result, Err(SiteError::Api { status: 503, .. })));
    }

    #[tokio::test]
    async fn test_resolve_range_empty_range_is_empty() {
        let episodes = listing(&[1, 2, 3]);
        let videos = resolve_range(Sites::AnimeWorld, &episodes, &(10..=20), 4, |_| async {
            Err(SiteError::Parse("never called".into()))
        })
        .await
        .unwrap();
        assert!(videos.is_empty());
    }

    #[tokio::test]
    async fn test_resolve_range_repeated_number_resolves_once() {
        let site = Sites::AnimeWorld;
        let episodes = AnimeEpisodes::new(
            Anime::new("Test".into(), "/play/test".into(), site),
            vec![
                Episode::new(1, "a".into(), site),
                Episode::new(2, "b".into(), site),
                Episode::new(2, "b-dup".into(), site),
                Episode::new(3, "c".into(), site),
            ],
        );
        let videos = resolve_range(site, &episodes, &(1..=3), 4, |ep| async move {
            Ok(Some(ep.link().to_string()))
        })
        .await
        .unwrap();

        assert_eq!(sorted_numbers(&videos), vec![1, 2, 3]);
        let second = videos.iter().find(|v| v.number() == 2).unwrap();
        assert_eq!(second.link(), Some("b"));
    }

    #[tokio::test]
    async fn test_resolve_range_unresolved_without_error_is_kept() {
        let episodes = listing(&[7]);
        let videos = resolve_range(Sites::AnimeWorld, &episodes, &(7..=7), 1, |_| async {
            Ok(None)
        })
        .await
        .unwrap();
        assert_eq!(videos, vec![Video::new(7, None, Sites::AnimeWorld)]);
    }
}
