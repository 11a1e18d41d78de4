//! TMDB provider: general-purpose movie/TV database.
//!
//! Plain REST GETs with the API key as a query parameter. A missing key
//! is a configuration error detected before any network call. TMDB is
//! also the only provider with a season concept, so it backs
//! `get_seasons`, and the only one exposing recommendation-style links
//! and collection membership for the relations envelope.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use crate::{
    error::{Error, Result},
    net::{HttpClient, retry::retry},
    provider::{MediaDetails, Provider},
    relations::{self, tmdb_status},
    types::{MediaItem, MediaType, SearchOptions, SeasonSummary},
};

const API_BASE: &str = "https://api.themoviedb.org/3";
const IMAGE_BASE: &str = "https://image.tmdb.org/t/p/w342";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    id: i64,
    // Movies use title/original_title/release_date; TV uses
    // name/original_name/first_air_date. Multi results mix both.
    title: Option<String>,
    name: Option<String>,
    original_title: Option<String>,
    original_name: Option<String>,
    release_date: Option<String>,
    first_air_date: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    vote_average: Option<f64>,
    media_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Season {
    season_number: u32,
    name: Option<String>,
    episode_count: Option<u32>,
    air_date: Option<String>,
    overview: Option<String>,
}

/// TMDB REST provider.
pub struct TmdbProvider {
    client: HttpClient,
    api_key: Option<String>,
}

impl TmdbProvider {
    /// Creates a new TMDB provider.
    ///
    /// The key is optional at construction so the provider can always be
    /// registered; calls fail with a configuration error while it is
    /// absent.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: HttpClient::new("tmdb").with_rate_limit(250),
            api_key,
        }
    }

    fn key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::config("TMDB API key is not configured"))
    }

    fn search_path(media_type: MediaType) -> &'static str {
        match media_type {
            MediaType::Movie => "search/movie",
            MediaType::Tv | MediaType::Anime => "search/tv",
            MediaType::Multi => "search/multi",
        }
    }

    /// Maps a raw search payload (`results[]`) into canonical items.
    ///
    /// `media_type` is the caller's hint, used when an entry carries no
    /// `media_type` of its own (single-endpoint searches).
    pub fn parse_search_response(raw: Value, media_type: MediaType) -> Result<Vec<MediaItem>> {
        let response: SearchResponse = serde_json::from_value(raw)
            .map_err(|e| Error::malformed(format!("tmdb: {}", e)))?;
        Ok(response
            .results
            .into_iter()
            .filter_map(|entry| map_entry(entry, media_type))
            .collect())
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

    fn detail_path(media_type: MediaType) -> &'static str {
        match media_type {
            MediaType::Movie => "movie",
            _ => "tv",
        }
    }
}

fn map_entry(entry: Entry, fallback_type: MediaType) -> Option<MediaItem> {
    // Multi search interleaves people with movies/shows; skip anything
    // that is neither.
    let media_type = match entry.media_type.as_deref() {
        Some("movie") => MediaType::Movie,
        Some("tv") => MediaType::Tv,
        Some(_) => return None,
        None => fallback_type,
    };

    let title = entry.title.or(entry.name)?;
    let date = entry.release_date.or(entry.first_air_date);

    Some(MediaItem {
        id: entry.id.to_string(),
        title,
        original_title: entry.original_title.or(entry.original_name),
        media_type,
        year: date
            .as_deref()
            .and_then(|d| d.get(..4))
            .and_then(|y| y.parse().ok()),
        image_url: entry
            .poster_path
            .map(|path| format!("{}{}", IMAGE_BASE, path)),
        // vote_average is already on the 0..10 scale
        score: entry.vote_average.filter(|v| *v > 0.0),
        status: Default::default(),
        episodes: None,
        overview: entry.overview.filter(|o| !o.is_empty()),
        genres: Vec::new(),
        duration: None,
        provider: "tmdb".to_string(),
    })
}

#[async_trait]
impl Provider for TmdbProvider {
    fn id(&self) -> &'static str {
        "tmdb"
    }

    fn name(&self) -> &'static str {
        "TMDB"
    }

    fn base_url(&self) -> &str {
        API_BASE
    }

    async fn search(
        &self,
        query: &str,
        media_type: MediaType,
        options: &SearchOptions,
    ) -> Result<Vec<MediaItem>> {
        let key = self.key()?;
        let url = format!(
            "{}/{}?api_key={}&query={}&page=1",
            API_BASE,
            Self::search_path(media_type),
            key,
            urlencoding::encode(query)
        );
        let raw = self.get(url).await?;
        let mut items = Self::parse_search_response(raw, media_type)?;
        items.truncate(options.limit);
        Ok(items)
    }

    async fn get_details(&self, id: &str, media_type: MediaType) -> Result<MediaDetails> {
        let key = self.key()?;
        let url = format!(
            "{}/{}/{}?api_key={}&append_to_response=recommendations,similar",
            API_BASE,
            Self::detail_path(media_type),
            id,
            key
        );
        let raw = self.get(url).await?;

        let entry: Entry = serde_json::from_value(raw.clone())
            .map_err(|e| Error::malformed(format!("tmdb: {}", e)))?;
        let mut item = map_entry(entry, media_type)
            .ok_or_else(|| Error::malformed("tmdb: detail entry missing title"))?;

        let relations = relations::normalize("tmdb", &raw, Utc::now());
        item.status = relations.status;

        Ok(MediaDetails { item, relations })
    }

    async fn get_seasons(&self, id: &str) -> Result<Vec<SeasonSummary>> {
        let key = self.key()?;
        let url = format!("{}/tv/{}?api_key={}", API_BASE, id, key);
        let raw = self.get(url).await?;

        let seasons: Vec<Season> = raw
            .get("seasons")
            .cloned()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| Error::malformed(format!("tmdb: {}", e)))?
            .unwrap_or_default();

        Ok(seasons
            .into_iter()
            .map(|s| SeasonSummary {
                season_number: s.season_number,
                name: s.name,
                episode_count: s.episode_count,
                air_date: s.air_date,
                overview: s.overview,
            })
            .collect())
    }
}
