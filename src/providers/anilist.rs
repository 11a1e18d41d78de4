//! AniList provider: anime catalog behind a GraphQL API.
//!
//! All calls are POSTs against a single endpoint with a fixed query
//! template plus variables. AniList reports scores on a 0..100 scale,
//! rescaled to 0..10 at the mapping boundary, and is the only provider
//! here with a native bulk capability: one request can alias N search
//! sub-queries.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::time::Duration;
use tracing::warn;

use crate::{
    error::{Error, Result},
    net::{HttpClient, retry::retry},
    provider::{MediaDetails, Provider},
    relations::{self, anilist_status},
    types::{MediaItem, MediaType, SearchOptions, rescale_score},
};

const API_URL: &str = "https://graphql.anilist.co";

const MEDIA_FIELDS: &str = "\
id
title { romaji english native }
type
format
status
description
startDate { year }
episodes
duration
coverImage { large }
averageScore
genres";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    data: Option<SearchData>,
}

#[derive(Debug, Deserialize)]
struct SearchData {
    #[serde(rename = "Page")]
    page: Option<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    media: Vec<Media>,
}

#[derive(Debug, Deserialize)]
struct Media {
    id: i64,
    title: Title,
    status: Option<String>,
    description: Option<String>,
    #[serde(rename = "startDate")]
    start_date: Option<StartDate>,
    episodes: Option<u32>,
    duration: Option<u32>,
    #[serde(rename = "coverImage")]
    cover_image: Option<CoverImage>,
    #[serde(rename = "averageScore")]
    average_score: Option<f64>,
    #[serde(default)]
    genres: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Title {
    romaji: Option<String>,
    english: Option<String>,
    native: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StartDate {
    year: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct CoverImage {
    large: Option<String>,
}

/// AniList GraphQL provider.
pub struct AniListProvider {
    client: HttpClient,
}

impl AniListProvider {
    /// Creates a new AniList provider.
    ///
    /// AniList allows ~90 requests per minute; 700ms spacing keeps batch
    /// traffic comfortably inside that.
    pub fn new() -> Self {
        Self {
            client: HttpClient::new("anilist").with_rate_limit(700),
        }
    }

    fn search_query() -> String {
        format!(
            "query ($search: String, $perPage: Int) {{\n\
             Page(page: 1, perPage: $perPage) {{\n\
             media(search: $search, type: ANIME) {{ {MEDIA_FIELDS} }}\n\
             }}\n}}"
        )
    }

    fn details_query() -> String {
        format!(
            "query ($id: Int) {{\n\
             Media(id: $id, type: ANIME) {{ {MEDIA_FIELDS}\n\
             nextAiringEpisode {{ episode airingAt }}\n\
             relations {{ edges {{ relationType node {{ id title {{ romaji english }} type coverImage {{ large }} }} }} }}\n\
             }}\n}}"
        )
    }

    /// Maps a raw search payload (`data.Page.media`) into canonical items.
    pub fn parse_search_response(raw: Value) -> Result<Vec<MediaItem>> {
        let response: SearchResponse = serde_json::from_value(raw)
            .map_err(|e| Error::malformed(format!("anilist: {}", e)))?;
        let page = response
            .data
            .and_then(|d| d.page)
            .ok_or_else(|| Error::malformed("anilist: missing data.Page"))?;
        Ok(page.media.into_iter().map(map_media).collect())
    }

    async fn post(&self, query: String, variables: Value) -> Result<Value> {
        let body = json!({ "query": query, "variables": variables });
        retry(
            || self.client.post_json::<Value>(API_URL, &body),
            2,
            Duration::from_millis(500),
            Error::is_retryable,
        )
        .await
    }

    /// Sequential per-query fallback used when the bulk request fails.
    async fn batch_search_sequential(
        &self,
        queries: &[String],
        media_type: MediaType,
        options: &SearchOptions,
    ) -> HashMap<String, Vec<MediaItem>> {
        let mut results = HashMap::with_capacity(queries.len());
        for (i, query) in queries.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.batch_delay()).await;
            }
            let items = self
                .search(query, media_type, options)
                .await
                .unwrap_or_default();
            results.insert(query.clone(), items);
        }
        results
    }
}

fn map_media(media: Media) -> MediaItem {
    let title = media
        .title
        .english
        .or(media.title.romaji)
        .unwrap_or_else(|| "Unknown Title".to_string());

    MediaItem {
        id: media.id.to_string(),
        title,
        original_title: media.title.native,
        media_type: MediaType::Anime,
        year: media.start_date.and_then(|d| d.year),
        image_url: media.cover_image.and_then(|c| c.large),
        score: rescale_score(media.average_score, 100.0),
        status: media
            .status
            .as_deref()
            .map(anilist_status)
            .unwrap_or_default(),
        episodes: media.episodes,
        overview: media.description,
        genres: media.genres,
        duration: media.duration,
        provider: "anilist".to_string(),
    }
}

impl Default for AniListProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for AniListProvider {
    fn id(&self) -> &'static str {
        "anilist"
    }

    fn name(&self) -> &'static str {
        "AniList"
    }

    fn base_url(&self) -> &str {
        API_URL
    }

    async fn search(
        &self,
        query: &str,
        _media_type: MediaType,
        options: &SearchOptions,
    ) -> Result<Vec<MediaItem>> {
        let variables = json!({ "search": query, "perPage": options.limit });
        let raw = self.post(Self::search_query(), variables).await?;
        Self::parse_search_response(raw)
    }

    async fn get_details(&self, id: &str, _media_type: MediaType) -> Result<MediaDetails> {
        let numeric_id: i64 = id
            .parse()
            .map_err(|_| Error::validation(format!("anilist ids are numeric, got '{}'", id)))?;

        let raw = self
            .post(Self::details_query(), json!({ "id": numeric_id }))
            .await?;

        // A null Media with no transport error means the id doesn't resolve.
        let media_value = raw
            .pointer("/data/Media")
            .filter(|v| !v.is_null())
            .cloned()
            .ok_or_else(|| Error::not_found(format!("anilist media {}", id)))?;

        let media: Media = serde_json::from_value(media_value)
            .map_err(|e| Error::malformed(format!("anilist: {}", e)))?;

        Ok(MediaDetails {
            item: map_media(media),
            relations: relations::normalize("anilist", &raw, Utc::now()),
        })
    }

    fn supports_native_batch(&self) -> bool {
        true
    }

    async fn batch_search(
        &self,
        queries: &[String],
        media_type: MediaType,
        options: &SearchOptions,
    ) -> HashMap<String, Vec<MediaItem>> {
        if queries.is_empty() {
            return HashMap::new();
        }

        // One request aliasing a Page sub-query per search string.
        let params: Vec<String> = (0..queries.len())
            .map(|i| format!("$q{}: String", i))
            .collect();
        let blocks: Vec<String> = (0..queries.len())
            .map(|i| {
                format!(
                    "q{i}: Page(page: 1, perPage: $perPage) {{\n\
                     media(search: $q{i}, type: ANIME) {{ {MEDIA_FIELDS} }}\n}}"
                )
            })
            .collect();
        let query = format!(
            "query ($perPage: Int, {}) {{\n{}\n}}",
            params.join(", "),
            blocks.join("\n")
        );

        let mut variables = serde_json::Map::new();
        variables.insert("perPage".to_string(), json!(options.limit));
        for (i, q) in queries.iter().enumerate() {
            variables.insert(format!("q{}", i), json!(q));
        }

        let raw = match self.post(query, Value::Object(variables)).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "anilist bulk search failed, falling back to per-query");
                return self.batch_search_sequential(queries, media_type, options).await;
            }
        };

        let mut results = HashMap::with_capacity(queries.len());
        for (i, q) in queries.iter().enumerate() {
            let items = raw
                .pointer(&format!("/data/q{}/media", i))
                .cloned()
                .and_then(|media| {
                    serde_json::from_value::<Vec<Media>>(media)
                        .map(|list| list.into_iter().map(map_media).collect::<Vec<_>>())
                        .ok()
                })
                .unwrap_or_default();
            results.insert(q.clone(), items);
        }
        results
    }
}
