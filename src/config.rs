//! Aggregator configuration.
//!
//! Configuration is a plain value constructed once at initialization and
//! threaded through to the adapters and chain registry; nothing mutates it
//! mid-flight. The owning application (settings UI, env, file) decides
//! where the values come from.

use std::collections::HashMap;

use crate::types::MediaType;

/// Read-only configuration consumed at aggregator construction.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// API key for the general-purpose movie/TV provider. Calls to that
    /// provider fail with a configuration error when absent; the other
    /// providers need no credentials.
    pub tmdb_api_key: Option<String>,

    /// Optional per-media-type override of the default provider ordering.
    pub chain_overrides: HashMap<MediaType, Vec<String>>,

    /// Default per-provider time budget in milliseconds, applied when a
    /// call's options leave it unset.
    pub default_timeout_ms: Option<u64>,

    /// Default batch chunk size, applied the same way.
    pub default_chunk_size: Option<usize>,

    /// Pause between batch chunks in milliseconds.
    pub chunk_pause_ms: u64,
}

impl AggregatorConfig {
    pub fn new() -> Self {
        AggregatorConfig {
            tmdb_api_key: None,
            chain_overrides: HashMap::new(),
            default_timeout_ms: None,
            default_chunk_size: None,
            chunk_pause_ms: 1_000,
        }
    }

    /// Sets the API key for the general-purpose provider.
    pub fn with_tmdb_api_key(mut self, key: impl Into<String>) -> Self {
        self.tmdb_api_key = Some(key.into());
        self
    }

    /// Overrides the provider ordering for one media type.
    pub fn with_chain_override(mut self, media_type: MediaType, order: Vec<String>) -> Self {
        self.chain_overrides.insert(media_type, order);
        self
    }

    /// Sets the pause inserted between batch chunks.
    pub fn with_chunk_pause_ms(mut self, ms: u64) -> Self {
        self.chunk_pause_ms = ms;
        self
    }
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self::new()
    }
}
