//! Orchestration behavior against deterministic mock providers.
//!
//! Covers the fallback chain, racing, batching, and envelope semantics
//! without touching the network.

use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::time::Duration;

use shirabe::config::AggregatorConfig;
use shirabe::prelude::*;
use shirabe::Error;

mod common;
use common::{MockOutcome, MockProvider, NativeBatchMock, item};

fn aggregator_with_chain(providers: Providers, chain: Vec<&str>) -> Aggregator {
    let chains = FallbackChains::new().with_override(
        MediaType::Anime,
        chain.into_iter().map(String::from).collect(),
    );
    Aggregator::with_providers(
        providers,
        chains,
        AggregatorConfig::new().with_chunk_pause_ms(1),
    )
}

#[cfg(test)]
mod search_tests {
    use super::*;

    #[tokio::test]
    async fn test_single_successful_provider_passes_items_through() {
        let items = vec![item("1", "Monster", "alpha", Some(8.2))];
        let mut providers = Providers::new();
        providers.add(MockProvider::new("alpha", MockOutcome::Items(items.clone())));
        let aggregator = aggregator_with_chain(providers, vec!["alpha"]);

        let envelope = aggregator
            .search("monster", MediaType::Anime, None)
            .await
            .unwrap();

        assert!(envelope.is_success());
        assert_eq!(envelope.provider, "alpha");
        assert_eq!(envelope.results.len(), 1);
        assert_eq!(envelope.results[0].title, "Monster");
        assert_eq!(envelope.results[0].score, Some(8.2));
        assert_eq!(envelope.query, "monster");
    }

    #[tokio::test]
    async fn test_whitespace_query_is_a_validation_error_not_a_search() {
        let alpha = MockProvider::new("alpha", MockOutcome::Items(vec![]));
        let calls = alpha.call_counter();
        let mut providers = Providers::new();
        providers.add(alpha);
        let aggregator = aggregator_with_chain(providers, vec!["alpha"]);

        let result = aggregator.search("   ", MediaType::Anime, None).await;

        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_overlong_query_is_rejected() {
        let mut providers = Providers::new();
        providers.add(MockProvider::new("alpha", MockOutcome::Empty));
        let aggregator = aggregator_with_chain(providers, vec!["alpha"]);

        let long = "x".repeat(101);
        let result = aggregator.search(&long, MediaType::Anime, None).await;
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_sequential_fallback_advances_past_errors() {
        let mut providers = Providers::new();
        providers.add(MockProvider::new("alpha", MockOutcome::Fail("down".into())));
        providers.add(MockProvider::new(
            "beta",
            MockOutcome::Items(vec![item("2", "Monster", "beta", None)]),
        ));
        let aggregator = aggregator_with_chain(providers, vec!["alpha", "beta"]);

        let envelope = aggregator
            .search("monster", MediaType::Anime, None)
            .await
            .unwrap();

        assert!(envelope.is_success());
        assert_eq!(envelope.provider, "beta");
    }

    #[tokio::test]
    async fn test_sequential_short_circuits_on_first_nonempty_result() {
        let beta = MockProvider::new(
            "beta",
            MockOutcome::Items(vec![item("9", "Other", "beta", None)]),
        );
        let beta_calls = beta.call_counter();

        let mut providers = Providers::new();
        providers.add(MockProvider::new(
            "alpha",
            MockOutcome::Items(vec![item("1", "Monster", "alpha", None)]),
        ));
        providers.add(beta);
        let aggregator = aggregator_with_chain(providers, vec!["alpha", "beta"]);

        let envelope = aggregator
            .search("monster", MediaType::Anime, None)
            .await
            .unwrap();

        assert_eq!(envelope.provider, "alpha");
        assert_eq!(beta_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_all_providers_failing_yields_failed_envelope_with_last_error() {
        let mut providers = Providers::new();
        providers.add(MockProvider::new("alpha", MockOutcome::Fail("first".into())));
        providers.add(MockProvider::new("beta", MockOutcome::Fail("boom".into())));
        let aggregator = aggregator_with_chain(providers, vec!["alpha", "beta"]);

        let envelope = aggregator
            .search("monster", MediaType::Anime, None)
            .await
            .unwrap();

        assert_eq!(envelope.status, SearchStatus::Failed);
        assert_eq!(envelope.provider, "none");
        assert_eq!(
            envelope.error.as_deref(),
            Some("Provider error [beta]: boom")
        );
        assert!(envelope.results.is_empty());
    }

    #[tokio::test]
    async fn test_disabled_fallback_returns_first_empty_immediately() {
        let beta = MockProvider::new(
            "beta",
            MockOutcome::Items(vec![item("9", "Other", "beta", None)]),
        );
        let beta_calls = beta.call_counter();

        let mut providers = Providers::new();
        providers.add(MockProvider::new("alpha", MockOutcome::Empty));
        providers.add(beta);
        let aggregator = aggregator_with_chain(providers, vec!["alpha", "beta"]);

        let options = SearchOptionsBuilder::default()
            .enable_fallback(false)
            .build()
            .unwrap();
        let envelope = aggregator
            .search("monster", MediaType::Anime, Some(options))
            .await
            .unwrap();

        assert!(envelope.is_success());
        assert_eq!(envelope.provider, "alpha");
        assert!(envelope.results.is_empty());
        assert_eq!(beta_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_first_provider_only_returns_error_outcome_as_is() {
        let beta = MockProvider::new(
            "beta",
            MockOutcome::Items(vec![item("9", "Other", "beta", None)]),
        );
        let beta_calls = beta.call_counter();

        let mut providers = Providers::new();
        providers.add(MockProvider::new("alpha", MockOutcome::Fail("down".into())));
        providers.add(beta);
        let aggregator = aggregator_with_chain(providers, vec!["alpha", "beta"]);

        let options = SearchOptionsBuilder::default()
            .use_first_provider_only(true)
            .build()
            .unwrap();
        let envelope = aggregator
            .search("monster", MediaType::Anime, Some(options))
            .await
            .unwrap();

        assert_eq!(envelope.status, SearchStatus::Failed);
        assert_eq!(envelope.provider, "alpha");
        assert_eq!(beta_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_search_is_idempotent_against_deterministic_providers() {
        let mut providers = Providers::new();
        providers.add(MockProvider::new(
            "alpha",
            MockOutcome::Items(vec![item("1", "Monster", "alpha", Some(8.2))]),
        ));
        let aggregator = aggregator_with_chain(providers, vec!["alpha"]);

        let first = aggregator
            .search("monster", MediaType::Anime, None)
            .await
            .unwrap();
        let second = aggregator
            .search("monster", MediaType::Anime, None)
            .await
            .unwrap();

        assert_eq!(first.provider, second.provider);
        assert_eq!(first.status, second.status);
        assert_eq!(first.results.len(), second.results.len());
        assert_eq!(first.results[0].id, second.results[0].id);
        assert_eq!(first.results[0].score, second.results[0].score);
    }

    #[tokio::test]
    async fn test_timeout_is_just_another_fallback_trigger() {
        let mut providers = Providers::new();
        providers.add(
            MockProvider::new(
                "slow",
                MockOutcome::Items(vec![item("1", "Monster", "slow", None)]),
            )
            .with_delay(Duration::from_millis(200)),
        );
        providers.add(MockProvider::new(
            "fast",
            MockOutcome::Items(vec![item("2", "Monster", "fast", None)]),
        ));
        let aggregator = aggregator_with_chain(providers, vec!["slow", "fast"]);

        let options = SearchOptionsBuilder::default()
            .timeout_ms(50_u64)
            .build()
            .unwrap();
        let envelope = aggregator
            .search("monster", MediaType::Anime, Some(options))
            .await
            .unwrap();

        assert!(envelope.is_success());
        assert_eq!(envelope.provider, "fast");
    }

    #[tokio::test]
    async fn test_monster_scenario_stops_at_the_graphql_provider() {
        // Query "Monster" against [graphql, jsonapi, restmirror]; the first
        // provider answers, the rest are never invoked.
        let jsonapi = MockProvider::new("jsonapi", MockOutcome::Empty);
        let restmirror = MockProvider::new("restmirror", MockOutcome::Empty);
        let jsonapi_calls = jsonapi.call_counter();
        let restmirror_calls = restmirror.call_counter();

        let mut providers = Providers::new();
        providers.add(MockProvider::new(
            "graphql",
            MockOutcome::Items(vec![item("1", "Monster", "graphql", Some(8.2))]),
        ));
        providers.add(jsonapi);
        providers.add(restmirror);
        let aggregator =
            aggregator_with_chain(providers, vec!["graphql", "jsonapi", "restmirror"]);

        let envelope = aggregator
            .search("Monster", MediaType::Anime, None)
            .await
            .unwrap();

        assert_eq!(envelope.status, SearchStatus::Success);
        assert_eq!(envelope.provider, "graphql");
        assert_eq!(envelope.results[0].score, Some(8.2));
        assert_eq!(jsonapi_calls.load(Ordering::SeqCst), 0);
        assert_eq!(restmirror_calls.load(Ordering::SeqCst), 0);
    }
}

#[cfg(test)]
mod parallel_tests {
    use super::*;

    #[tokio::test]
    async fn test_race_selects_by_chain_order_not_completion_order() {
        // A sits first in the chain but resolves late; B resolves early.
        // Chain order is the tie-break, so A must win.
        let mut providers = Providers::new();
        providers.add(
            MockProvider::new(
                "a",
                MockOutcome::Items(vec![item("1", "Monster", "a", None)]),
            )
            .with_delay(Duration::from_millis(100)),
        );
        providers.add(
            MockProvider::new(
                "b",
                MockOutcome::Items(vec![item("2", "Monster", "b", None)]),
            )
            .with_delay(Duration::from_millis(5)),
        );
        let aggregator = aggregator_with_chain(providers, vec!["a", "b"]);

        let options = SearchOptionsBuilder::default().race(true).build().unwrap();
        let envelope = aggregator
            .search("monster", MediaType::Anime, Some(options))
            .await
            .unwrap();

        assert_eq!(envelope.provider, "a");
    }

    #[tokio::test]
    async fn test_race_with_no_nonempty_success_prefers_most_results() {
        let mut providers = Providers::new();
        providers.add(MockProvider::new("a", MockOutcome::Fail("down".into())));
        providers.add(MockProvider::new("b", MockOutcome::Empty));
        let aggregator = aggregator_with_chain(providers, vec!["a", "b"]);

        let options = SearchOptionsBuilder::default().race(true).build().unwrap();
        let envelope = aggregator
            .search("monster", MediaType::Anime, Some(options))
            .await
            .unwrap();

        // b completed without throwing, so its (empty) result wins over
        // a's failure.
        assert!(envelope.is_success());
        assert_eq!(envelope.provider, "b");
        assert!(envelope.results.is_empty());
    }

    #[tokio::test]
    async fn test_race_where_everything_throws_fails_as_parallel() {
        let mut providers = Providers::new();
        providers.add(MockProvider::new("a", MockOutcome::Fail("x".into())));
        providers.add(MockProvider::new("b", MockOutcome::Fail("y".into())));
        let aggregator = aggregator_with_chain(providers, vec!["a", "b"]);

        let options = SearchOptionsBuilder::default().race(true).build().unwrap();
        let envelope = aggregator
            .search("monster", MediaType::Anime, Some(options))
            .await
            .unwrap();

        assert_eq!(envelope.status, SearchStatus::Failed);
        assert_eq!(envelope.provider, "parallel");
        assert!(envelope.error.is_some());
    }
}

#[cfg(test)]
mod batch_tests {
    use super::*;

    #[tokio::test]
    async fn test_one_query_failing_never_drops_the_others() {
        let mut script = HashMap::new();
        script.insert("x".to_string(), None);
        script.insert(
            "y".to_string(),
            Some(vec![item("2", "Y Title", "alpha", None)]),
        );

        let mut providers = Providers::new();
        providers.add(MockProvider::new("alpha", MockOutcome::PerQuery(script)));
        let aggregator = aggregator_with_chain(providers, vec!["alpha"]);

        let queries = vec!["x".to_string(), "y".to_string()];
        let results = aggregator
            .batch_search(&queries, MediaType::Anime, None)
            .await;

        assert_eq!(results.len(), 2);
        assert!(results["x"].is_empty());
        assert_eq!(results["y"].len(), 1);
        assert_eq!(results["y"][0].title, "Y Title");
    }

    #[tokio::test]
    async fn test_invalid_batch_queries_come_back_empty() {
        let mut providers = Providers::new();
        providers.add(MockProvider::new(
            "alpha",
            MockOutcome::Items(vec![item("1", "Hit", "alpha", None)]),
        ));
        let aggregator = aggregator_with_chain(providers, vec!["alpha"]);

        let queries = vec!["  ".to_string(), "ok".to_string()];
        let results = aggregator
            .batch_search(&queries, MediaType::Anime, None)
            .await;

        assert!(results["  "].is_empty());
        assert_eq!(results["ok"].len(), 1);
    }

    #[tokio::test]
    async fn test_native_bulk_empties_are_retried_through_the_fallback_chain() {
        let mut bulk = HashMap::new();
        bulk.insert(
            "hit".to_string(),
            vec![item("1", "Hit", "native", None)],
        );
        // "miss" is absent from the bulk script, so the native pass
        // returns it empty and the single-query fallback gets a shot.

        let mut providers = Providers::new();
        providers.add(NativeBatchMock::new("native", bulk));
        providers.add(MockProvider::new(
            "backup",
            MockOutcome::Items(vec![item("7", "Miss", "backup", None)]),
        ));
        let aggregator = aggregator_with_chain(providers, vec!["native", "backup"]);

        let queries = vec!["hit".to_string(), "miss".to_string()];
        let results = aggregator
            .batch_search(&queries, MediaType::Anime, None)
            .await;

        assert_eq!(results["hit"][0].provider, "native");
        assert_eq!(results["miss"][0].provider, "backup");
    }

    #[tokio::test]
    async fn test_chunked_batch_processes_every_chunk() {
        let mut providers = Providers::new();
        providers.add(MockProvider::new(
            "alpha",
            MockOutcome::Items(vec![item("1", "Hit", "alpha", None)]),
        ));
        let aggregator = aggregator_with_chain(providers, vec!["alpha"]);

        let queries: Vec<String> = (0..7).map(|i| format!("query {}", i)).collect();
        let options = SearchOptionsBuilder::default()
            .chunk_size(3_usize)
            .build()
            .unwrap();
        let results = aggregator
            .batch_search(&queries, MediaType::Anime, Some(options))
            .await;

        assert_eq!(results.len(), 7);
        for query in &queries {
            assert_eq!(results[query].len(), 1);
        }
    }

    #[tokio::test]
    async fn test_default_trait_batch_isolates_per_query_failures() {
        let mut script = HashMap::new();
        script.insert("bad".to_string(), None);
        script.insert(
            "good".to_string(),
            Some(vec![item("3", "Good", "solo", None)]),
        );
        let provider = MockProvider::new("solo", MockOutcome::PerQuery(script));

        let queries = vec!["bad".to_string(), "good".to_string()];
        let results = provider
            .batch_search(&queries, MediaType::Anime, &SearchOptions::default())
            .await;

        assert!(results["bad"].is_empty());
        assert_eq!(results["good"].len(), 1);
    }
}

#[cfg(test)]
mod details_tests {
    use super::*;

    #[tokio::test]
    async fn test_details_honor_the_provider_hint() {
        let mut providers = Providers::new();
        providers.add(MockProvider::new("alpha", MockOutcome::Empty));
        providers.add(
            MockProvider::new("beta", MockOutcome::Empty)
                .with_details(item("42", "Hinted", "beta", Some(7.0))),
        );
        let aggregator = aggregator_with_chain(providers, vec!["alpha", "beta"]);

        let details = aggregator
            .get_details("42", MediaType::Anime, Some("beta"))
            .await
            .unwrap();

        assert_eq!(details.item.title, "Hinted");
        assert_eq!(details.item.provider, "beta");
    }

    #[tokio::test]
    async fn test_missing_record_surfaces_not_found_without_fallback() {
        let mut providers = Providers::new();
        providers.add(MockProvider::new("alpha", MockOutcome::Empty));
        providers.add(
            MockProvider::new("beta", MockOutcome::Empty)
                .with_details(item("42", "Other", "beta", None)),
        );
        let aggregator = aggregator_with_chain(providers, vec!["alpha", "beta"]);

        // Primary provider has no record; the id space is not shared, so
        // no second provider is consulted.
        let result = aggregator.get_details("42", MediaType::Anime, None).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_seasons_default_to_empty_for_seasonless_providers() {
        let mut providers = Providers::new();
        providers.add(MockProvider::new("alpha", MockOutcome::Empty));
        let aggregator = aggregator_with_chain(providers, vec!["alpha"]);

        let seasons = aggregator
            .get_seasons("1", MediaType::Anime, None)
            .await
            .unwrap();
        assert!(seasons.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_provider_hint_is_reported() {
        let mut providers = Providers::new();
        providers.add(MockProvider::new("alpha", MockOutcome::Empty));
        let aggregator = aggregator_with_chain(providers, vec!["alpha"]);

        let result = aggregator
            .get_details("1", MediaType::Anime, Some("nope"))
            .await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }
}
