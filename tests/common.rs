//! Common test utilities: deterministic mock providers and item builders.
//!
//! The aggregation layer only ever talks to the [`Provider`] trait, so the
//! orchestration tests run entirely against scripted mocks - no network.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use shirabe::prelude::*;
use shirabe::{Error, Result};

/// Builds a canonical item the way an adapter mapping would.
#[allow(dead_code)]
pub fn item(id: &str, title: &str, provider: &str, score: Option<f64>) -> MediaItem {
    MediaItem {
        id: id.to_string(),
        title: title.to_string(),
        original_title: None,
        media_type: MediaType::Anime,
        year: Some(2004),
        image_url: None,
        score,
        status: MediaStatus::Finished,
        episodes: Some(74),
        overview: None,
        genres: vec![],
        duration: Some(24),
        provider: provider.to_string(),
    }
}

/// What a scripted provider does when asked to search.
#[derive(Clone)]
#[allow(dead_code)]
pub enum MockOutcome {
    /// Return these items
    Items(Vec<MediaItem>),
    /// Return an empty (but successful) result
    Empty,
    /// Fail with a provider error carrying this message
    Fail(String),
    /// Per-query script: `None` fails the query, missing keys return empty
    PerQuery(HashMap<String, Option<Vec<MediaItem>>>),
}

/// A deterministic provider with a scripted outcome, an optional response
/// delay, and a call counter.
#[allow(dead_code)]
pub struct MockProvider {
    id: &'static str,
    outcome: MockOutcome,
    delay: Option<Duration>,
    details: Option<MediaItem>,
    calls: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl MockProvider {
    pub fn new(id: &'static str, outcome: MockOutcome) -> Self {
        Self {
            id,
            outcome,
            delay: None,
            details: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Adds an artificial latency before every search response.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Scripts the record returned by `get_details`.
    pub fn with_details(mut self, item: MediaItem) -> Self {
        self.details = Some(item);
        self
    }

    /// Shared handle to this provider's search call counter.
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn id(&self) -> &'static str {
        self.id
    }

    fn name(&self) -> &'static str {
        self.id
    }

    fn base_url(&self) -> &str {
        "http://mock.invalid"
    }

    async fn search(
        &self,
        query: &str,
        _media_type: MediaType,
        _options: &SearchOptions,
    ) -> Result<Vec<MediaItem>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.outcome {
            MockOutcome::Items(items) => Ok(items.clone()),
            MockOutcome::Empty => Ok(Vec::new()),
            MockOutcome::Fail(message) => Err(Error::provider(self.id, message.clone())),
            MockOutcome::PerQuery(script) => match script.get(query) {
                Some(Some(items)) => Ok(items.clone()),
                Some(None) => Err(Error::provider(self.id, format!("scripted failure: {}", query))),
                None => Ok(Vec::new()),
            },
        }
    }

    async fn get_details(&self, id: &str, _media_type: MediaType) -> Result<MediaDetails> {
        match &self.details {
            Some(item) => Ok(MediaDetails {
                item: item.clone(),
                relations: RelationsEnvelope::default(),
            }),
            None => Err(Error::not_found(format!("{} id {}", self.id, id))),
        }
    }

    fn batch_delay(&self) -> Duration {
        Duration::from_millis(1)
    }
}

/// A mock with a native bulk endpoint, like the GraphQL provider.
#[allow(dead_code)]
pub struct NativeBatchMock {
    inner: MockProvider,
    bulk: HashMap<String, Vec<MediaItem>>,
}

#[allow(dead_code)]
impl NativeBatchMock {
    pub fn new(id: &'static str, bulk: HashMap<String, Vec<MediaItem>>) -> Self {
        Self {
            inner: MockProvider::new(id, MockOutcome::Empty),
            bulk,
        }
    }
}

#[async_trait]
impl Provider for NativeBatchMock {
    fn id(&self) -> &'static str {
        self.inner.id
    }

    fn name(&self) -> &'static str {
        self.inner.id
    }

    fn base_url(&self) -> &str {
        "http://mock.invalid"
    }

    async fn search(
        &self,
        query: &str,
        media_type: MediaType,
        options: &SearchOptions,
    ) -> Result<Vec<MediaItem>> {
        self.inner.search(query, media_type, options).await
    }

    async fn get_details(&self, id: &str, media_type: MediaType) -> Result<MediaDetails> {
        self.inner.get_details(id, media_type).await
    }

    fn supports_native_batch(&self) -> bool {
        true
    }

    async fn batch_search(
        &self,
        queries: &[String],
        _media_type: MediaType,
        _options: &SearchOptions,
    ) -> HashMap<String, Vec<MediaItem>> {
        queries
            .iter()
            .map(|q| (q.clone(), self.bulk.get(q).cloned().unwrap_or_default()))
            .collect()
    }
}
