//! The search orchestrator: fallback chains, racing, timeouts, batching.
//!
//! [`Aggregator`] is the crate's public surface. It consumes the provider
//! registry and the fallback chain registry, walks (or races) the chain
//! configured for a media type, and always hands the caller one normalized
//! [`SearchResponse`] envelope - never a raw provider error.
//!
//! Strategy per call:
//!
//! - invalid input (empty/overlong query) is a terminal validation error
//!   and consumes no fallback attempt
//! - `use_first_provider_only` calls only the chain head and returns its
//!   outcome as-is
//! - the sequential default walks the chain in order: the first non-empty
//!   success short-circuits; an empty success advances only while
//!   `enable_fallback` is set; an adapter error is recorded and always
//!   advances
//! - `race` invokes the whole chain concurrently, waits for every outcome,
//!   and picks deterministically in chain order (never completion order)
//! - every provider invocation is raced against `timeout_ms`; a timeout is
//!   just another adapter error to the chain logic
//!
//! # Examples
//!
//! ```rust,no_run
//! use shirabe::prelude::*;
//! use shirabe::config::AggregatorConfig;
//!
//! # async fn example() -> shirabe::Result<()> {
//! let aggregator = Aggregator::new(AggregatorConfig::new().with_tmdb_api_key("key"));
//!
//! let envelope = aggregator
//!     .search("monster", MediaType::Anime, None)
//!     .await?;
//! println!("{} results from {}", envelope.results.len(), envelope.provider);
//! # Ok(())
//! # }
//! ```

use futures::future;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::{
    chain::FallbackChains,
    config::AggregatorConfig,
    error::{Error, Result},
    provider::{MediaDetails, Provider, Providers},
    providers::{AniListProvider, JikanProvider, KitsuProvider, TmdbProvider},
    types::{MediaItem, MediaType, SearchOptions, SearchResponse, SeasonSummary},
};

const MAX_QUERY_LEN: usize = 100;

/// The provider aggregation engine.
///
/// Holds the provider registry, the fallback chains, and the configuration,
/// all read-only after construction. See the module docs for call
/// semantics.
pub struct Aggregator {
    providers: Providers,
    chains: FallbackChains,
    config: AggregatorConfig,
}

impl Aggregator {
    /// Builds an aggregator with the four stock providers and the default
    /// chain ordering, applying any overrides from `config`.
    pub fn new(config: AggregatorConfig) -> Self {
        let mut providers = Providers::new();
        providers.add(AniListProvider::new());
        providers.add(KitsuProvider::new());
        providers.add(JikanProvider::new());
        providers.add(TmdbProvider::new(config.tmdb_api_key.clone()));

        let mut chains = FallbackChains::new();
        for (media_type, order) in &config.chain_overrides {
            chains = chains.with_override(*media_type, order.clone());
        }

        Self {
            providers,
            chains,
            config,
        }
    }

    /// Builds an aggregator from explicit parts.
    ///
    /// This is how alternative or mock provider sets are injected.
    pub fn with_providers(
        providers: Providers,
        chains: FallbackChains,
        config: AggregatorConfig,
    ) -> Self {
        Self {
            providers,
            chains,
            config,
        }
    }

    fn default_options(&self) -> SearchOptions {
        let mut options = SearchOptions::default();
        if let Some(timeout_ms) = self.config.default_timeout_ms {
            options.timeout_ms = timeout_ms;
        }
        if let Some(chunk_size) = self.config.default_chunk_size {
            options.chunk_size = chunk_size;
        }
        options
    }

    /// Searches for a title, trying providers per the media type's chain.
    ///
    /// Returns `Err` only for input validation failures; every provider
    /// outcome, including total failure of the chain, arrives as an
    /// envelope.
    pub async fn search(
        &self,
        query: &str,
        media_type: MediaType,
        options: Option<SearchOptions>,
    ) -> Result<SearchResponse> {
        let options = options.unwrap_or_else(|| self.default_options());
        let query = validate_query(query)?;

        let started = Instant::now();
        if options.race {
            Ok(self
                .search_parallel(&query, media_type, &options, started)
                .await)
        } else {
            Ok(self
                .search_sequential(&query, media_type, &options, started)
                .await)
        }
    }

    /// Searches many query strings in one logical call.
    ///
    /// Per-query independence: a failed or invalid query records an empty
    /// result; the batch itself never fails. When the chain's primary
    /// provider has a native bulk endpoint, it gets the first shot and any
    /// query it answers emptily is retried through the full single-query
    /// fallback path. Otherwise queries run as chunked concurrent single
    /// searches with a settle-down pause between chunks.
    pub async fn batch_search(
        &self,
        queries: &[String],
        media_type: MediaType,
        options: Option<SearchOptions>,
    ) -> HashMap<String, Vec<MediaItem>> {
        let options = options.unwrap_or_else(|| self.default_options());
        let mut results: HashMap<String, Vec<MediaItem>> = HashMap::with_capacity(queries.len());

        // Invalid queries never reach the network; they simply come back
        // empty like any other per-query failure in batch mode.
        let mut valid: Vec<String> = Vec::with_capacity(queries.len());
        for query in queries {
            match validate_query(query) {
                // Keep the caller's original string as the result key.
                Ok(_) => valid.push(query.clone()),
                Err(e) => {
                    debug!(query = %query, error = %e, "skipping invalid batch query");
                    results.insert(query.clone(), Vec::new());
                }
            }
        }

        let primary = self
            .chains
            .chain_for(media_type)
            .first()
            .and_then(|id| self.providers.get(id));

        match primary {
            Some(provider) if provider.supports_native_batch() && !valid.is_empty() => {
                let native = provider.batch_search(&valid, media_type, &options).await;
                for (query, items) in native {
                    if items.is_empty() {
                        // Give empties a second chance via the other providers.
                        let envelope = self
                            .search_sequential(&query, media_type, &options, Instant::now())
                            .await;
                        results.insert(query, envelope.results);
                    } else {
                        results.insert(query, items);
                    }
                }
            }
            _ => {
                self.batch_search_chunked(&valid, media_type, &options, &mut results)
                    .await;
            }
        }

        results
    }

    /// Fetches one record with normalized relations.
    ///
    /// With no `provider_hint` the media type's primary provider is asked.
    /// `NotFound` surfaces directly - provider id spaces are not
    /// interchangeable, so there is no fallback here.
    pub async fn get_details(
        &self,
        id: &str,
        media_type: MediaType,
        provider_hint: Option<&str>,
    ) -> Result<MediaDetails> {
        let provider = self.resolve_provider(media_type, provider_hint)?;
        let budget = Duration::from_millis(
            self.config
                .default_timeout_ms
                .unwrap_or(SearchOptions::default().timeout_ms),
        );

        tokio::time::timeout(budget, provider.get_details(id, media_type))
            .await
            .map_err(|_| Error::timeout(provider.id(), budget.as_millis() as u64))?
    }

    /// Lists seasons for a record, resolved like [`get_details`](Self::get_details).
    pub async fn get_seasons(
        &self,
        id: &str,
        media_type: MediaType,
        provider_hint: Option<&str>,
    ) -> Result<Vec<SeasonSummary>> {
        let provider = self.resolve_provider(media_type, provider_hint)?;
        let budget = Duration::from_millis(
            self.config
                .default_timeout_ms
                .unwrap_or(SearchOptions::default().timeout_ms),
        );

        tokio::time::timeout(budget, provider.get_seasons(id))
            .await
            .map_err(|_| Error::timeout(provider.id(), budget.as_millis() as u64))?
    }

    fn resolve_provider(
        &self,
        media_type: MediaType,
        provider_hint: Option<&str>,
    ) -> Result<&dyn Provider> {
        let id = match provider_hint {
            Some(hint) => hint,
            None => self
                .chains
                .chain_for(media_type)
                .first()
                .map(String::as_str)
                .ok_or_else(|| {
                    Error::config(format!("no providers configured for {:?}", media_type))
                })?,
        };

        self.providers
            .get(id)
            .ok_or_else(|| Error::not_found(format!("Provider: {}", id)))
    }

    async fn search_sequential(
        &self,
        query: &str,
        media_type: MediaType,
        options: &SearchOptions,
        started: Instant,
    ) -> SearchResponse {
        let chain = self.chains.chain_for(media_type);
        if chain.is_empty() {
            return SearchResponse::failed(
                query,
                "none",
                format!("no providers configured for {:?}", media_type),
                elapsed_ms(started),
            );
        }

        let mut last_error: Option<Error> = None;

        for id in chain.iter() {
            let Some(provider) = self.providers.get(id) else {
                warn!(provider = %id, "chain names an unregistered provider");
                if options.use_first_provider_only {
                    return SearchResponse::failed(
                        query,
                        "none",
                        format!("Not found: Provider: {}", id),
                        elapsed_ms(started),
                    );
                }
                last_error = Some(Error::not_found(format!("Provider: {}", id)));
                continue;
            };

            match self
                .call_with_timeout(provider, query, media_type, options)
                .await
            {
                Ok(items) if !items.is_empty() => {
                    debug!(provider = %id, count = items.len(), "search succeeded");
                    return SearchResponse::ok(query, id.as_str(), items, elapsed_ms(started));
                }
                Ok(items) => {
                    debug!(provider = %id, "search returned no matches");
                    // An empty success is a valid negative; it only
                    // advances the chain while fallback is enabled.
                    if options.use_first_provider_only || !options.enable_fallback {
                        return SearchResponse::ok(query, id.as_str(), items, elapsed_ms(started));
                    }
                }
                Err(e) => {
                    warn!(provider = %id, error = %e, "search failed, advancing chain");
                    if options.use_first_provider_only {
                        return SearchResponse::failed(
                            query,
                            id.as_str(),
                            e.to_string(),
                            elapsed_ms(started),
                        );
                    }
                    last_error = Some(e);
                }
            }
        }

        let message = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "all providers failed".to_string());
        SearchResponse::failed(query, "none", message, elapsed_ms(started))
    }

    async fn search_parallel(
        &self,
        query: &str,
        media_type: MediaType,
        options: &SearchOptions,
        started: Instant,
    ) -> SearchResponse {
        let chain = self.chains.chain_for(media_type);
        let providers: Vec<&dyn Provider> = chain
            .iter()
            .filter_map(|id| self.providers.get(id))
            .collect();

        if providers.is_empty() {
            return SearchResponse::failed(
                query,
                "parallel",
                format!("no providers configured for {:?}", media_type),
                elapsed_ms(started),
            );
        }

        // Wait for every outcome; join_all preserves chain order, which is
        // what makes the selection below deterministic regardless of
        // completion order.
        let calls = providers.iter().map(|provider| async {
            (
                provider.id(),
                self.call_with_timeout(*provider, query, media_type, options)
                    .await,
            )
        });
        let outcomes = future::join_all(calls).await;

        for (id, outcome) in &outcomes {
            if let Ok(items) = outcome {
                if !items.is_empty() {
                    return SearchResponse::ok(query, *id, items.clone(), elapsed_ms(started));
                }
            }
        }

        // No non-empty success: prefer the completed provider with the most
        // results (chain order breaks ties).
        let mut best: Option<(&str, &Vec<MediaItem>)> = None;
        for (id, outcome) in &outcomes {
            if let Ok(items) = outcome {
                if best.map_or(true, |(_, current)| items.len() > current.len()) {
                    best = Some((id, items));
                }
            }
        }
        if let Some((id, items)) = best {
            return SearchResponse::ok(query, id, items.clone(), elapsed_ms(started));
        }

        let message = outcomes
            .iter()
            .filter_map(|(_, outcome)| outcome.as_ref().err())
            .next_back()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "all providers failed".to_string());
        SearchResponse::failed(query, "parallel", message, elapsed_ms(started))
    }

    async fn batch_search_chunked(
        &self,
        queries: &[String],
        media_type: MediaType,
        options: &SearchOptions,
        results: &mut HashMap<String, Vec<MediaItem>>,
    ) {
        let chunk_size = options.chunk_size.max(1);
        let pause = Duration::from_millis(self.config.chunk_pause_ms);
        let chunks: Vec<&[String]> = queries.chunks(chunk_size).collect();
        let total = chunks.len();

        for (index, chunk) in chunks.into_iter().enumerate() {
            let calls = chunk.iter().map(|query| async {
                let envelope = self
                    .search_sequential(query, media_type, options, Instant::now())
                    .await;
                (query.clone(), envelope)
            });

            for (query, envelope) in future::join_all(calls).await {
                // Failed envelopes flatten to empty arrays in batch mode.
                results.insert(query, envelope.results);
            }

            if index + 1 < total {
                tokio::time::sleep(pause).await;
            }
        }
    }

    /// Races a provider invocation against the per-call time budget.
    async fn call_with_timeout(
        &self,
        provider: &dyn Provider,
        query: &str,
        media_type: MediaType,
        options: &SearchOptions,
    ) -> crate::Result<Vec<MediaItem>> {
        let budget = Duration::from_millis(options.timeout_ms);
        tokio::time::timeout(budget, provider.search(query, media_type, options))
            .await
            .map_err(|_| Error::timeout(provider.id(), options.timeout_ms))?
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

/// Trims and bounds-checks a query string before any network activity.
fn validate_query(query: &str) -> Result<String> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("query must not be empty"));
    }
    if trimmed.chars().count() > MAX_QUERY_LEN {
        return Err(Error::validation(format!(
            "query exceeds {} characters",
            MAX_QUERY_LEN
        )));
    }
    Ok(trimmed.to_string())
}
