//! Core data types for media items, search options, and result envelopes.
//!
//! This module defines the fundamental data structures used throughout
//! Shirabe:
//!
//! - [`MediaItem`] - The provider-agnostic normalized media record
//! - [`SeasonSummary`] - One season of a TV/anime entry
//! - [`SearchOptions`] - Parameters controlling a search call
//! - [`SearchResponse`] - The envelope returned by every orchestrated search
//!
//! # Examples
//!
//! ```rust
//! use shirabe::types::*;
//!
//! let options = SearchOptionsBuilder::default()
//!     .limit(5_usize)
//!     .enable_fallback(false)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(options.limit, 5);
//! assert_eq!(options.timeout_ms, 10_000);
//! ```

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// The kind of media a query targets.
///
/// `Multi` is the catch-all category used when the caller does not know
/// (or care) whether the title is a movie, show, or anime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MediaType {
    Movie,
    Tv,
    Anime,
    Multi,
}

/// Canonical airing/release status.
///
/// Each adapter owns the lookup table from its provider's raw status
/// vocabulary into this enum; anything unmapped becomes `Unknown`
/// rather than an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaStatus {
    Finished,
    Releasing,
    NotYetReleased,
    Cancelled,
    #[default]
    Unknown,
}

/// The normalized representation of one media record.
///
/// `id` is provider-scoped, not globally unique; uniqueness requires
/// pairing it with [`provider`](MediaItem::provider). Items are
/// constructed once per adapter response mapping and never mutated by
/// the aggregation layer.
///
/// # Examples
///
/// ```rust
/// use shirabe::types::{MediaItem, MediaStatus, MediaType};
///
/// let item = MediaItem {
///     id: "1".to_string(),
///     title: "Monster".to_string(),
///     original_title: None,
///     media_type: MediaType::Anime,
///     year: Some(2004),
///     image_url: None,
///     score: Some(8.2),
///     status: MediaStatus::Finished,
///     episodes: Some(74),
///     overview: None,
///     genres: vec!["Drama".to_string()],
///     duration: Some(24),
///     provider: "anilist".to_string(),
/// };
/// assert_eq!(item.provider, "anilist");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaItem {
    /// Identifier within the provider's own id space
    pub id: String,

    /// Display title
    pub title: String,

    /// Original (native-language) title, when distinct
    pub original_title: Option<String>,

    /// Kind of media this record describes
    pub media_type: MediaType,

    /// First release year
    pub year: Option<i32>,

    /// Poster/cover image URL
    pub image_url: Option<String>,

    /// Score on a 0..10 scale. Adapters whose provider reports 0..100
    /// or 0..5 rescale at the mapping boundary; a missing raw score
    /// stays `None`, never becomes 0.
    pub score: Option<f64>,

    /// Canonical airing/release status
    pub status: MediaStatus,

    /// Episode count, if the provider exposes one
    pub episodes: Option<u32>,

    /// Synopsis/description
    pub overview: Option<String>,

    /// Genre names
    #[serde(default)]
    pub genres: Vec<String>,

    /// Episode/feature runtime in minutes
    pub duration: Option<u32>,

    /// Identifier of the adapter that produced this item. Set by the
    /// adapter's mapping code, never taken from the raw payload.
    pub provider: String,
}

/// One season of a show, as reported by a provider with a season concept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonSummary {
    pub season_number: u32,
    pub name: Option<String>,
    pub episode_count: Option<u32>,
    pub air_date: Option<String>,
    pub overview: Option<String>,
}

/// Options controlling a search call.
///
/// Every field is independently optional; the builder fills in the
/// defaults below. No invariant couples the fields.
///
/// # Builder Usage
///
/// ```rust
/// use shirabe::types::SearchOptionsBuilder;
///
/// let options = SearchOptionsBuilder::default()
///     .limit(20_usize)
///     .timeout_ms(5_000_u64)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct SearchOptions {
    /// Maximum number of results requested from each provider
    #[builder(default = "10")]
    pub limit: usize,

    /// Time budget for a single provider invocation, in milliseconds
    #[builder(default = "10_000")]
    pub timeout_ms: u64,

    /// Whether an empty (but successful) result advances the fallback chain
    #[builder(default = "true")]
    pub enable_fallback: bool,

    /// Call only the chain's first provider and return its outcome as-is
    #[builder(default = "false")]
    pub use_first_provider_only: bool,

    /// Race the whole chain concurrently instead of walking it in order
    #[builder(default = "false")]
    pub race: bool,

    /// Number of queries processed concurrently per batch chunk
    #[builder(default = "5")]
    pub chunk_size: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            limit: 10,
            timeout_ms: 10_000,
            enable_fallback: true,
            use_first_provider_only: false,
            race: false,
            chunk_size: 5,
        }
    }
}

/// Outcome marker for a [`SearchResponse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SearchStatus {
    Success,
    Failed,
}

/// The envelope returned by every orchestrated search call.
///
/// Exactly one envelope is produced per call. `provider` names the
/// adapter that answered, or `"none"` / `"parallel"` for aggregate
/// failures of the sequential and racing strategies respectively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<MediaItem>,
    pub provider: String,
    pub status: SearchStatus,
    pub error: Option<String>,
    pub duration_ms: Option<u64>,
    pub query: String,
}

impl SearchResponse {
    /// Builds a success envelope for the given provider and results.
    pub fn ok(
        query: impl Into<String>,
        provider: impl Into<String>,
        results: Vec<MediaItem>,
        duration_ms: u64,
    ) -> Self {
        SearchResponse {
            results,
            provider: provider.into(),
            status: SearchStatus::Success,
            error: None,
            duration_ms: Some(duration_ms),
            query: query.into(),
        }
    }

    /// Builds a failed envelope carrying a human-readable error string.
    pub fn failed(
        query: impl Into<String>,
        provider: impl Into<String>,
        error: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        SearchResponse {
            results: Vec::new(),
            provider: provider.into(),
            status: SearchStatus::Failed,
            error: Some(error.into()),
            duration_ms: Some(duration_ms),
            query: query.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == SearchStatus::Success
    }

    /// Picks the result whose title best matches the query that produced
    /// this envelope, via [`matching::best_match`](crate::matching::best_match).
    ///
    /// Providers return their own relevance ordering; this re-scores
    /// explicitly so an exact title hit wins even when the provider
    /// ranked it lower.
    pub fn best_match(&self) -> Option<&MediaItem> {
        crate::matching::best_match(&self.results, &self.query)
    }
}

/// Rescales a raw provider score onto the canonical 0..10 scale.
///
/// `scale_max` is the provider's own maximum (100 for AniList/Kitsu,
/// 10 for Jikan/TMDB, 5 for star-rating services). A missing raw score
/// stays missing; it is never collapsed to 0.
///
/// # Examples
///
/// ```rust
/// use shirabe::types::rescale_score;
///
/// assert_eq!(rescale_score(Some(85.0), 100.0), Some(8.5));
/// assert_eq!(rescale_score(Some(7.3), 10.0), Some(7.3));
/// assert_eq!(rescale_score(None, 100.0), None);
/// ```
pub fn rescale_score(raw: Option<f64>, scale_max: f64) -> Option<f64> {
    raw.map(|value| value * 10.0 / scale_max)
}
