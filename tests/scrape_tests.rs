//! Integration tests for the scrape pipeline
//!
//! These tests use wiremock to stand in for a Discourse instance and
//! exercise the full listing-walk + batch-scheduling cycle end-to-end.

use discourse_harvest::cache::RequestCache;
use discourse_harvest::config::{CacheConfig, Config, ForumConfig, OutputConfig, ScrapeConfig};
use discourse_harvest::scraper::{
    build_http_client, BatchScheduler, Coordinator, ListingWalker, TopicFetcher,
};
use discourse_harvest::HarvestError;
use std::sync::Arc;
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointed at the given mock server
fn create_test_config(base_url: &str, category: &str, cache: CacheConfig) -> Config {
    Config {
        forum: ForumConfig {
            base_url: base_url.to_string(),
            category: category.to_string(),
        },
        scrape: ScrapeConfig {
            page_count: 1,
            page_size: 2,
            max_retries: 3,
            retry_delay_seconds: 0, // No waiting in tests
            batch_size: 2,
            requests_per_second: 1000.0, // Effectively no pacing in tests
            max_connections: 4,
            timeout_seconds: 5,
        },
        cache,
        output: OutputConfig::default(),
    }
}

fn disabled_cache() -> CacheConfig {
    CacheConfig {
        enabled: false,
        directory: String::new(),
        expiry_hours: 24,
    }
}

fn enabled_cache(dir: &std::path::Path) -> CacheConfig {
    CacheConfig {
        enabled: true,
        directory: dir.to_string_lossy().into_owned(),
        expiry_hours: 24,
    }
}

fn listing_body(slugs: &[&str]) -> serde_json::Value {
    serde_json::json!({
        "topic_list": {
            "topics": slugs.iter().map(|s| serde_json::json!({"slug": s})).collect::<Vec<_>>()
        }
    })
}

async fn mount_listing(server: &MockServer, category: &str, id: u32, slugs: &[&str]) {
    Mock::given(method("GET"))
        .and(path(format!("/c/{}/{}/l/top.json", category, id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing_body(slugs)))
        .mount(server)
        .await;
}

async fn mount_topic(server: &MockServer, slug: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/t/{}.json", slug)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"slug": slug, "posts": []})),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_partial_failure_scenario() {
    // The spec scenario: "a" succeeds, "b" fails every attempt.
    let server = MockServer::start().await;

    mount_listing(&server, "feedback", 7, &["a", "b"]).await;
    mount_topic(&server, "a").await;

    // "b" always returns 500; expect exactly max_retries attempts.
    Mock::given(method("GET"))
        .and(path("/t/b.json"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), "feedback", disabled_cache());
    let mut coordinator = Coordinator::new(config).unwrap();
    let output = coordinator.run().await.expect("run should complete");

    assert_eq!(output.successes.len(), 1);
    assert_eq!(output.successes[0]["slug"], "a");
    assert_eq!(output.failures.len(), 1);
    assert!(output.failures.contains("b"));
}

#[tokio::test]
async fn test_retry_succeeds_after_transient_failures() {
    let server = MockServer::start().await;

    mount_listing(&server, "feedback", 7, &["flaky"]).await;

    // First two attempts fail, the third succeeds.
    Mock::given(method("GET"))
        .and(path("/t/flaky.json"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/t/flaky.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"slug": "flaky"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), "feedback", disabled_cache());
    let mut coordinator = Coordinator::new(config).unwrap();
    let output = coordinator.run().await.unwrap();

    assert_eq!(output.successes.len(), 1);
    assert!(output.failures.is_empty());
}

#[tokio::test]
async fn test_successes_preserve_scheduling_order() {
    let server = MockServer::start().await;

    let slugs = ["t-one", "t-two", "t-three", "t-four", "t-five"];
    mount_listing(&server, "bug-report", 6, &slugs).await;
    for slug in &slugs {
        mount_topic(&server, slug).await;
    }

    let mut config = create_test_config(&server.uri(), "bug-report", disabled_cache());
    config.scrape.page_size = 5;
    config.scrape.batch_size = 2; // 3 batches: [1,2] [3,4] [5]

    let mut coordinator = Coordinator::new(config).unwrap();
    let output = coordinator.run().await.unwrap();

    let fetched: Vec<&str> = output
        .successes
        .iter()
        .map(|payload| payload["slug"].as_str().unwrap())
        .collect();
    assert_eq!(fetched, slugs);
    assert!(output.failures.is_empty());
}

#[tokio::test]
async fn test_unknown_category_makes_no_network_calls() {
    let server = MockServer::start().await;

    let config = create_test_config(&server.uri(), "feedback", disabled_cache());
    let client = build_http_client(&config.scrape).unwrap();
    let cache = Arc::new(RequestCache::disabled());
    let walker = ListingWalker::new(client, cache, server.uri(), 2);

    let err = walker.list_topics("typo-category", 1).await.unwrap_err();
    assert!(matches!(err, HarvestError::UnknownCategory { .. }));

    let requests = server.received_requests().await.unwrap();
    assert!(requests.is_empty(), "no request should have been made");
}

#[tokio::test]
async fn test_empty_listing_page_does_not_stop_walk() {
    let server = MockServer::start().await;

    // Page 0 and 2 have topics; page 1 returns a body with no topic_list.
    Mock::given(method("GET"))
        .and(path("/c/help/8/l/top.json"))
        .and(wiremock::matchers::query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"errors": []})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/c/help/8/l/top.json"))
        .and(wiremock::matchers::query_param("page", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing_body(&["early"])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/c/help/8/l/top.json"))
        .and(wiremock::matchers::query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing_body(&["late"])))
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), "help", disabled_cache());
    let client = build_http_client(&config.scrape).unwrap();
    let walker = ListingWalker::new(client, Arc::new(RequestCache::disabled()), server.uri(), 2);

    let slugs = walker.list_topics("help", 3).await.unwrap();
    assert_eq!(slugs, vec!["early", "late"]);
}

#[tokio::test]
async fn test_failed_listing_page_treated_as_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/c/general/4/l/top.json"))
        .and(wiremock::matchers::query_param("page", "0"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/c/general/4/l/top.json"))
        .and(wiremock::matchers::query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing_body(&["survivor"])))
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), "general", disabled_cache());
    let client = build_http_client(&config.scrape).unwrap();
    let walker = ListingWalker::new(client, Arc::new(RequestCache::disabled()), server.uri(), 2);

    let slugs = walker.list_topics("general", 2).await.unwrap();
    assert_eq!(slugs, vec!["survivor"]);
}

#[tokio::test]
async fn test_cached_rerun_makes_no_additional_requests() {
    let server = MockServer::start().await;
    let cache_dir = tempfile::tempdir().unwrap();

    // Every endpoint may be hit exactly once across both runs.
    Mock::given(method("GET"))
        .and(path("/c/feedback/7/l/top.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing_body(&["once"])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/t/once.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"slug": "once"})))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), "feedback", enabled_cache(cache_dir.path()));

    let mut first = Coordinator::new(config.clone()).unwrap();
    let first_output = first.run().await.unwrap();

    let mut second = Coordinator::new(config).unwrap();
    let second_output = second.run().await.unwrap();

    assert_eq!(first_output.successes, second_output.successes);
    assert_eq!(first_output.failures, second_output.failures);
    assert_eq!(second_output.successes.len(), 1);
}

#[tokio::test]
async fn test_disabled_cache_always_fetches() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/c/feedback/7/l/top.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing_body(&["again"])))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/t/again.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"slug": "again"})),
        )
        .expect(2)
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), "feedback", disabled_cache());

    Coordinator::new(config.clone()).unwrap().run().await.unwrap();
    Coordinator::new(config).unwrap().run().await.unwrap();
}

#[tokio::test]
async fn test_refetch_pass_hits_only_given_slugs() {
    let server = MockServer::start().await;

    mount_topic(&server, "recovered").await;

    let config = create_test_config(&server.uri(), "feedback", disabled_cache());
    let mut coordinator = Coordinator::new(config).unwrap();

    let output = coordinator.refetch(&["recovered".to_string()]).await;

    assert_eq!(output.successes.len(), 1);
    assert!(output.failures.is_empty());

    // No listing endpoint exists on the mock server, so a listing walk
    // would have failed loudly; verify only the topic fetch happened.
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.path(), "/t/recovered.json");
}

#[tokio::test]
async fn test_malformed_body_is_never_cached() {
    // A 200 whose body is not JSON must not be stored: each retry attempt,
    // and a later refetch pass, has to re-hit the network for it.
    let server = MockServer::start().await;
    let cache_dir = tempfile::tempdir().unwrap();

    mount_listing(&server, "feedback", 7, &["garbled"]).await;
    Mock::given(method("GET"))
        .and(path("/t/garbled.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .expect(6) // 3 attempts in the first run + 3 in the refetch
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), "feedback", enabled_cache(cache_dir.path()));

    let mut coordinator = Coordinator::new(config.clone()).unwrap();
    let output = coordinator.run().await.unwrap();
    assert!(output.successes.is_empty());
    assert!(output.failures.contains("garbled"));

    let mut retry = Coordinator::new(config).unwrap();
    let retry_output = retry.refetch(&["garbled".to_string()]).await;
    assert!(retry_output.failures.contains("garbled"));
}

#[tokio::test]
async fn test_batch_starts_respect_rate_budget() {
    let server = MockServer::start().await;

    let slugs = ["r-one", "r-two", "r-three"];
    for slug in &slugs {
        mount_topic(&server, slug).await;
    }

    let mut config = create_test_config(&server.uri(), "feedback", disabled_cache());
    config.scrape.batch_size = 1;
    config.scrape.requests_per_second = 2.0; // 500ms between batch starts

    let client = build_http_client(&config.scrape).unwrap();
    let fetcher = Arc::new(TopicFetcher::new(
        client,
        Arc::new(RequestCache::disabled()),
        server.uri(),
        &config.scrape,
    ));
    let scheduler = BatchScheduler::new(fetcher, &config.scrape);

    let slugs: Vec<String> = slugs.iter().map(|s| s.to_string()).collect();
    let started = Instant::now();
    let output = scheduler.run(&slugs).await;
    let elapsed = started.elapsed();

    assert_eq!(output.successes.len(), 3);
    assert!(output.failures.is_empty());
    // Three batches, so two enforced 500ms gaps between starts. The fetches
    // themselves are near-instant against the mock server, so anything at or
    // above the two gaps shows the pacing, not the I/O.
    assert!(
        elapsed >= Duration::from_millis(1000),
        "batches started too close together: {:?}",
        elapsed
    );
}

#[tokio::test]
async fn test_malformed_topic_body_counts_as_failure() {
    let server = MockServer::start().await;

    mount_listing(&server, "feedback", 7, &["garbled"]).await;
    Mock::given(method("GET"))
        .and(path("/t/garbled.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .expect(3)
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), "feedback", disabled_cache());
    let mut coordinator = Coordinator::new(config).unwrap();
    let output = coordinator.run().await.unwrap();

    assert!(output.successes.is_empty());
    assert!(output.failures.contains("garbled"));
}
