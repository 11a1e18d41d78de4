//! Jikan provider: unofficial REST mirror of the MyAnimeList database.
//!
//! The only provider here with an externally imposed hard rate limit
//! (~1 request/second, HTTP 429 when exceeded). The client enforces
//! 1,100ms spacing between requests, and a bounded retry honors the
//! mirror's declared `Retry-After` before surfacing failure. Scores are
//! already on the 0..10 scale.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use crate::{
    error::{Error, Result},
    net::{HttpClient, retry::retry},
    provider::{MediaDetails, Provider},
    relations::{self, jikan_status},
    types::{MediaItem, MediaType, SearchOptions},
};

const API_BASE: &str = "https://api.jikan.moe/v4";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    data: Vec<Anime>,
}

#[derive(Debug, Deserialize)]
struct DetailResponse {
    data: Anime,
}

#[derive(Debug, Deserialize)]
struct Anime {
    mal_id: i64,
    title: Option<String>,
    title_japanese: Option<String>,
    synopsis: Option<String>,
    status: Option<String>,
    episodes: Option<u32>,
    score: Option<f64>,
    year: Option<i32>,
    images: Option<Images>,
    #[serde(default)]
    genres: Vec<Genre>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Images {
    jpg: Option<ImageSet>,
}

#[derive(Debug, Deserialize)]
struct ImageSet {
    image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Genre {
    name: String,
}

/// Jikan REST provider (MyAnimeList mirror).
pub struct JikanProvider {
    client: HttpClient,
}

impl JikanProvider {
    /// Creates a new Jikan provider with strict request spacing.
    pub fn new() -> Self {
        Self {
            client: HttpClient::new("jikan")
                .with_rate_limit(1_100)
                .with_header("Accept", "application/json"),
        }
    }

    /// Maps a raw search payload (`data[]`) into canonical items.
    pub fn parse_search_response(raw: Value) -> Result<Vec<MediaItem>> {
        let response: SearchResponse = serde_json::from_value(raw)
            .map_err(|e| Error::malformed(format!("jikan: {}", e)))?;
        Ok(response.data.into_iter().map(map_anime).collect())
    }

    async fn get(&self, url: String) -> Result<Value> {
        // The mirror actively throttles; three retries with a 1s base
        // backoff, deferring to any Retry-After the mirror declares.
        retry(
            || self.client.get_json::<Value>(&url),
            3,
            Duration::from_secs(1),
            Error::is_retryable,
        )
        .await
    }
}

fn map_anime(anime: Anime) -> MediaItem {
    MediaItem {
        id: anime.mal_id.to_string(),
        title: anime.title.unwrap_or_else(|| "Unknown Title".to_string()),
        original_title: anime.title_japanese,
        media_type: MediaType::Anime,
        year: anime.year,
        image_url: anime.images.and_then(|i| i.jpg).and_then(|j| j.image_url),
        // Jikan scores are already on the 0..10 scale
        score: anime.score,
        status: anime
            .status
            .as_deref()
            .map(jikan_status)
            .unwrap_or_default(),
        episodes: anime.episodes,
        overview: anime.synopsis,
        genres: anime.genres.into_iter().map(|g| g.name).collect(),
        duration: parse_duration_minutes(anime.duration.as_deref()),
        provider: "jikan".to_string(),
    }
}

/// Jikan reports runtime as prose ("24 min per ep"); take the leading
/// number as minutes when present.
fn parse_duration_minutes(raw: Option<&str>) -> Option<u32> {
    raw?.split_whitespace().next()?.parse().ok()
}

impl Default for JikanProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for JikanProvider {
    fn id(&self) -> &'static str {
        "jikan"
    }

    fn name(&self) -> &'static str {
        "Jikan"
    }

    fn base_url(&self) -> &str {
        API_BASE
    }

    async fn search(
        &self,
        query: &str,
        _media_type: MediaType,
        options: &SearchOptions,
    ) -> Result<Vec<MediaItem>> {
        let url = format!(
            "{}/anime?q={}&limit={}",
            API_BASE,
            urlencoding::encode(query),
            options.limit
        );
        let raw = self.get(url).await?;
        Self::parse_search_response(raw)
    }

    async fn get_details(&self, id: &str, _media_type: MediaType) -> Result<MediaDetails> {
        let url = format!("{}/anime/{}/full", API_BASE, id);
        let raw = self.get(url).await?;

        let response: DetailResponse = serde_json::from_value(raw.clone())
            .map_err(|e| Error::malformed(format!("jikan: {}", e)))?;

        Ok(MediaDetails {
            item: map_anime(response.data),
            relations: relations::normalize("jikan", &raw, Utc::now()),
        })
    }

    /// Matches the enforced request spacing so batches never trip the
    /// mirror's limit in the first place.
    fn batch_delay(&self) -> Duration {
        Duration::from_millis(1_100)
    }
}
