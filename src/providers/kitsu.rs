//! Kitsu provider: anime/manga catalog behind a JSON:API interface.
//!
//! Plain GETs with `filter`/`page` query parameters and the
//! `application/vnd.api+json` media type. Kitsu reports its average
//! rating as a 0..100 string ("82.25"), rescaled to 0..10 at the
//! mapping boundary.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use crate::{
    error::{Error, Result},
    net::{HttpClient, retry::retry},
    provider::{MediaDetails, Provider},
    relations::{self, kitsu_status},
    types::{MediaItem, MediaType, SearchOptions, rescale_score},
};

const API_BASE: &str = "https://kitsu.io/api/edge";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    data: Vec<Resource>,
}

#[derive(Debug, Deserialize)]
struct DetailResponse {
    data: Resource,
}

#[derive(Debug, Deserialize)]
struct Resource {
    id: String,
    attributes: Attributes,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Attributes {
    canonical_title: Option<String>,
    titles: Option<Titles>,
    synopsis: Option<String>,
    start_date: Option<String>,
    status: Option<String>,
    episode_count: Option<u32>,
    episode_length: Option<u32>,
    average_rating: Option<String>,
    poster_image: Option<PosterImage>,
}

#[derive(Debug, Deserialize)]
struct Titles {
    ja_jp: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PosterImage {
    small: Option<String>,
}

/// Kitsu JSON:API provider.
pub struct KitsuProvider {
    client: HttpClient,
}

impl KitsuProvider {
    /// Creates a new Kitsu provider.
    pub fn new() -> Self {
        Self {
            client: HttpClient::new("kitsu")
                .with_rate_limit(400)
                .with_header("Accept", "application/vnd.api+json")
                .with_header("Content-Type", "application/vnd.api+json"),
        }
    }

    /// Maps a raw search payload (`data[]`) into canonical items.
    pub fn parse_search_response(raw: Value) -> Result<Vec<MediaItem>> {
        let response: SearchResponse = serde_json::from_value(raw)
            .map_err(|e| Error::malformed(format!("kitsu: {}", e)))?;
        Ok(response.data.into_iter().map(map_resource).collect())
    }

    async fn get(&self, url: String) -> Result<Value> {
        retry(
            || self.client.get_json::<Value>(&url),
            2,
            Duration::from_millis(500),
            Error::is_retryable,
        )
        .await
    }
}

fn map_resource(resource: Resource) -> MediaItem {
    let attributes = resource.attributes;

    // Kitsu rates on a 0..100 scale but serializes it as a string.
    let raw_score = attributes
        .average_rating
        .as_deref()
        .and_then(|s| s.parse::<f64>().ok());

    MediaItem {
        id: resource.id,
        title: attributes
            .canonical_title
            .unwrap_or_else(|| "Unknown Title".to_string()),
        original_title: attributes.titles.and_then(|t| t.ja_jp),
        media_type: MediaType::Anime,
        year: attributes
            .start_date
            .as_deref()
            .and_then(|d| d.get(..4))
            .and_then(|y| y.parse().ok()),
        image_url: attributes.poster_image.and_then(|p| p.small),
        score: rescale_score(raw_score, 100.0),
        status: attributes
            .status
            .as_deref()
            .map(kitsu_status)
            .unwrap_or_default(),
        episodes: attributes.episode_count,
        overview: attributes.synopsis,
        genres: Vec::new(),
        duration: attributes.episode_length,
        provider: "kitsu".to_string(),
    }
}

impl Default for KitsuProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for KitsuProvider {
    fn id(&self) -> &'static str {
        "kitsu"
    }

    fn name(&self) -> &'static str {
        "Kitsu"
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
            "{}/anime?filter[text]={}&page[limit]={}",
            API_BASE,
            urlencoding::encode(query),
            options.limit
        );
        let raw = self.get(url).await?;
        Self::parse_search_response(raw)
    }

    async fn get_details(&self, id: &str, _media_type: MediaType) -> Result<MediaDetails> {
        let url = format!(
            "{}/anime/{}?include=mediaRelationships.destination",
            API_BASE, id
        );
        let raw = self.get(url).await?;

        let response: DetailResponse = serde_json::from_value(raw.clone())
            .map_err(|e| Error::malformed(format!("kitsu: {}", e)))?;

        Ok(MediaDetails {
            item: map_resource(response.data),
            relations: relations::normalize("kitsu", &raw, Utc::now()),
        })
    }
}
