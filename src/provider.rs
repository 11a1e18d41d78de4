//! Provider trait and collection for managing catalog providers.
//!
//! This module defines the core [`Provider`] trait that every catalog
//! adapter must implement, and the [`Providers`] collection the aggregation
//! layer resolves adapters from. The trait is the entire contract between
//! the orchestrator and a provider: the orchestrator never inspects a
//! concrete adapter type beyond it.
//!
//! # Examples
//!
//! ```rust
//! use shirabe::prelude::*;
//!
//! # async fn example() -> shirabe::Result<()> {
//! let mut providers = Providers::new();
//! // providers.add(AniListProvider::new());
//! // providers.add(KitsuProvider::new());
//!
//! if let Some(provider) = providers.get("anilist") {
//!     let results = provider
//!         .search("monster", MediaType::Anime, &SearchOptions::default())
//!         .await?;
//!     println!("{} results", results.len());
//! }
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tracing::warn;

use crate::{
    error::Result,
    relations::RelationsEnvelope,
    types::{MediaItem, MediaType, SearchOptions, SeasonSummary},
};

/// A canonical item together with its normalized relations, as returned
/// by [`Provider::get_details`].
#[derive(Debug, Clone)]
pub struct MediaDetails {
    pub item: MediaItem,
    pub relations: RelationsEnvelope,
}

/// Trait that all catalog providers must implement.
///
/// # Contract
///
/// - [`search`](Provider::search) never returns a "null" result: an empty
///   vector is a valid negative ("no matches"), a typed error is a genuine
///   failure. The orchestrator treats the two differently.
/// - [`get_details`](Provider::get_details) returns
///   [`Error::NotFound`](crate::Error::NotFound) when the id does not
///   resolve.
/// - [`get_seasons`](Provider::get_seasons) may legitimately return an
///   empty vector for providers with no season concept; the default
///   implementation does exactly that.
/// - [`batch_search`](Provider::batch_search) must never let one query's
///   failure void the others.
///
/// Rate-limit handling is adapter-local: each implementation composes
/// [`net::retry`](crate::net::retry) and its
/// [`HttpClient`](crate::net::HttpClient) spacing with provider-specific
/// trigger conditions. The orchestrator is unaware of these details.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Unique, lowercase identifier for this provider (e.g. `"anilist"`).
    fn id(&self) -> &'static str;

    /// Human-readable provider name.
    fn name(&self) -> &'static str;

    /// Base URL of the provider's API.
    fn base_url(&self) -> &str;

    /// Searches the provider's catalog.
    ///
    /// Returned items are fully normalized: provider id set, score on the
    /// 0..10 scale, status translated through the adapter's vocabulary
    /// table.
    async fn search(
        &self,
        query: &str,
        media_type: MediaType,
        options: &SearchOptions,
    ) -> Result<Vec<MediaItem>>;

    /// Fetches one record plus its normalized relations.
    async fn get_details(&self, id: &str, media_type: MediaType) -> Result<MediaDetails>;

    /// Lists the seasons of a record.
    ///
    /// Providers without a season concept keep this default, which
    /// reports "no seasons" without erroring.
    async fn get_seasons(&self, _id: &str) -> Result<Vec<SeasonSummary>> {
        Ok(Vec::new())
    }

    /// Whether [`batch_search`](Provider::batch_search) is backed by a
    /// native bulk endpoint rather than the per-query default below.
    fn supports_native_batch(&self) -> bool {
        false
    }

    /// Pause inserted between per-query calls in the default batch path.
    fn batch_delay(&self) -> Duration {
        Duration::from_millis(400)
    }

    /// Searches many queries in one logical call.
    ///
    /// The default iterates queries sequentially with
    /// [`batch_delay`](Provider::batch_delay) between calls to respect the
    /// provider's rate limit. A failed query records an empty result and
    /// the batch continues; this method never fails as a whole.
    ///
    /// Providers with a native bulk endpoint override this for efficiency
    /// but must preserve the same per-query isolation, falling back to the
    /// sequential path if the bulk request itself fails.
    async fn batch_search(
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
            let items = match self.search(query, media_type, options).await {
                Ok(items) => items,
                Err(e) => {
                    warn!(provider = self.id(), query = %query, error = %e,
                        "batch query failed, recording empty result");
                    Vec::new()
                }
            };
            results.insert(query.clone(), items);
        }

        results
    }
}

/// A collection of providers indexed by id.
///
/// The aggregation layer resolves fallback-chain entries against this
/// registry. It is populated once at construction and read-only afterwards.
pub struct Providers {
    providers: Vec<Box<dyn Provider>>,
    by_id: HashMap<String, usize>,
}

impl Providers {
    /// Creates a new empty provider collection.
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            by_id: HashMap::new(),
        }
    }

    /// Adds a provider to the collection, indexed by its id.
    pub fn add(&mut self, provider: impl Provider + 'static) -> &mut Self {
        let id = provider.id().to_string();
        let index = self.providers.len();
        self.providers.push(Box::new(provider));
        self.by_id.insert(id, index);
        self
    }

    /// Retrieves a provider by its id.
    pub fn get(&self, id: &str) -> Option<&dyn Provider> {
        self.by_id
            .get(id)
            .and_then(|&index| self.providers.get(index))
            .map(|p| p.as_ref())
    }

    /// Returns the ids of all registered providers.
    pub fn list_ids(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.id()).collect()
    }

    /// Returns the number of providers in the collection.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns `true` if the collection contains no providers.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl Default for Providers {
    fn default() -> Self {
        Self::new()
    }
}
