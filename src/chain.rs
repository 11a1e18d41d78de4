//! Fallback chain registry: media type → ordered provider list.
//!
//! The ordering encodes which provider is tried first for each media type
//! and is read-only at call time; changing it is a construction-time
//! concern (see [`AggregatorConfig`](crate::config::AggregatorConfig)),
//! not a runtime API.

use std::collections::HashMap;

use crate::types::MediaType;

/// Static lookup from media type to the ordered provider ids to try.
///
/// Default policy: anime tries AniList first for its richer GraphQL
/// metadata, then Kitsu, with the rate-limited MyAnimeList mirror last
/// because it has both the strictest limit and the weakest schema.
/// Movies and TV have a single general-purpose provider. The catch-all
/// multi category tries the general-purpose provider first, then the
/// anime-first provider.
#[derive(Debug, Clone)]
pub struct FallbackChains {
    chains: HashMap<MediaType, Vec<String>>,
}

impl FallbackChains {
    /// Builds the default chain ordering.
    pub fn new() -> Self {
        let mut chains = HashMap::new();
        chains.insert(
            MediaType::Anime,
            vec![
                "anilist".to_string(),
                "kitsu".to_string(),
                "jikan".to_string(),
            ],
        );
        chains.insert(MediaType::Movie, vec!["tmdb".to_string()]);
        chains.insert(MediaType::Tv, vec!["tmdb".to_string()]);
        chains.insert(
            MediaType::Multi,
            vec!["tmdb".to_string(), "anilist".to_string()],
        );
        Self { chains }
    }

    /// Replaces the chain for one media type. Construction-time only.
    pub fn with_override(mut self, media_type: MediaType, order: Vec<String>) -> Self {
        self.chains.insert(media_type, order);
        self
    }

    /// Returns the ordered provider ids for a media type.
    pub fn chain_for(&self, media_type: MediaType) -> &[String] {
        self.chains
            .get(&media_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl Default for FallbackChains {
    fn default() -> Self {
        Self::new()
    }
}
