//! # Shirabe - Unified media metadata search and aggregation library
//!
//! Shirabe lets an application search for a title once and receive a single
//! normalized result set, even though the underlying catalog data is spread
//! across several independent, inconsistent, rate-limited media databases.
//! No single provider is authoritative or always available, so Shirabe tries
//! providers in a configurable order, tolerates partial or total failure of
//! any one of them, and presents a uniform shape to callers regardless of
//! which provider ultimately answered.
//!
//! ## Features
//!
//! - **Fallback chains**: per-media-type provider ordering with automatic
//!   advance on failure or empty result
//! - **Parallel racing**: opt-in concurrent invocation of a whole chain with
//!   deterministic chain-order selection
//! - **Batch search**: many queries in one logical call, per-query failure
//!   isolation, native bulk search where a provider supports it
//! - **Normalization**: one canonical item shape and one relations envelope
//!   (status, next episode/season, prequel/sequel, recommendations) across
//!   all providers
//! - **Rate limiting & retry**: per-provider request spacing and bounded
//!   exponential backoff that honors provider-declared wait times
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use shirabe::prelude::*;
//! use shirabe::config::AggregatorConfig;
//!
//! #[tokio::main]
//! async fn main() -> shirabe::Result<()> {
//!     let aggregator = Aggregator::new(
//!         AggregatorConfig::new().with_tmdb_api_key("your-key"),
//!     );
//!
//!     let envelope = aggregator
//!         .search("monster", MediaType::Anime, None)
//!         .await?;
//!
//!     for item in &envelope.results {
//!         println!("{} ({:?}) via {}", item.title, item.year, item.provider);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`aggregator`]: the orchestration engine (sequential fallback, racing,
//!   timeouts, batching)
//! - [`provider`]: the adapter contract and the provider registry
//! - [`providers`]: the four concrete adapters
//! - [`relations`]: pure cross-provider relations normalization
//! - [`chain`]: media type → provider ordering
//! - [`types`]: canonical data model and envelopes
//! - [`net`]: HTTP client, rate limiting, retry, JSON helpers
//! - [`error`]: the error taxonomy the orchestrator reacts to

pub mod aggregator;
pub mod chain;
pub mod config;
pub mod error;
pub mod matching;
pub mod net;
pub mod provider;
pub mod providers;
pub mod relations;
pub mod types;

/// Prelude module for convenient imports.
///
/// ```rust
/// use shirabe::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        aggregator::Aggregator,
        chain::FallbackChains,
        provider::{MediaDetails, Provider, Providers},
        relations::RelationsEnvelope,
        types::{
            MediaItem, MediaStatus, MediaType, SearchOptions, SearchOptionsBuilder,
            SearchResponse, SearchStatus, SeasonSummary,
        },
    };
}

// Re-export main types at crate root for direct access
pub use aggregator::Aggregator;
pub use chain::FallbackChains;
pub use config::AggregatorConfig;
pub use error::{Error, Result};
pub use provider::{MediaDetails, Provider, Providers};
pub use relations::RelationsEnvelope;
pub use types::{
    MediaItem, MediaStatus, MediaType, SearchOptions, SearchOptionsBuilder, SearchResponse,
    SearchStatus, SeasonSummary,
};
