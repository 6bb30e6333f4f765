//! Integration tests for model resolution and dispatch
//!
//! Validates the catalog → selector → dispatcher chain against mock
//! provider endpoints.

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pixie_engine::dispatch::Dispatcher;
use pixie_engine::error::EngineError;
use pixie_engine::gemini::{CatalogClient, GenerateClient};
use pixie_engine::selector::{resolve_candidates, SelectionCache, Workload};

fn catalog_body() -> serde_json::Value {
    json!({
        "models": [
            {
                "name": "models/gemini-1.5-pro",
                "supportedGenerationMethods": ["generateContent"]
            },
            {
                "name": "models/gemini-1.5-flash",
                "supportedGenerationMethods": ["generateContent"]
            }
        ]
    })
}

fn generation_body(text: &str) -> serde_json::Value {
    json!({
        "candidates": [
            { "content": { "parts": [{ "text": text }] } }
        ]
    })
}

#[tokio::test]
async fn test_resolve_and_dispatch_fall_through_to_second_candidate() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog_body()))
        .mount(&server)
        .await;

    // The top-ranked model is quota-limited...
    Mock::given(method("POST"))
        .and(path("/models/gemini-1.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": { "message": "Resource exhausted. Please retry in 2.5s." }
        })))
        .mount(&server)
        .await;

    // ...and the runner-up answers.
    Mock::given(method("POST"))
        .and(path("/models/gemini-1.5-pro:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(generation_body("All good.")))
        .mount(&server)
        .await;

    let http = reqwest::Client::new();
    let catalog = CatalogClient::new(server.uri(), http.clone());
    let cache = SelectionCache::new();

    let candidates = resolve_candidates(&catalog, &cache, "key", Workload::Interview, None)
        .await
        .expect("resolution should succeed");
    assert_eq!(candidates, vec!["gemini-1.5-flash", "gemini-1.5-pro"]);

    let backend = GenerateClient::new(server.uri(), http);
    let dispatcher =
        Dispatcher::with_default_classifier(backend, cache.clone(), Workload::Interview);

    let body = json!({"contents": [{"role": "user", "parts": [{"text": "hi"}]}]});
    let result = dispatcher
        .dispatch("key", &candidates, &body)
        .await
        .expect("dispatch should fall through to the second candidate");

    assert_eq!(result.text, "All good.");
    assert_eq!(result.model, "gemini-1.5-pro");
    assert_eq!(cache.get(), Some("gemini-1.5-pro".to_string()));
}

#[tokio::test]
async fn test_catalog_failure_is_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let catalog = CatalogClient::new(server.uri(), reqwest::Client::new());
    let cache = SelectionCache::new();

    let err = resolve_candidates(&catalog, &cache, "bad-key", Workload::Interview, None)
        .await
        .expect_err("listing failure must surface");

    match err {
        EngineError::CatalogFetch { status, body } => {
            assert_eq!(status, 403);
            assert_eq!(body, "forbidden");
        }
        other => panic!("expected CatalogFetch, got {other:?}"),
    }
}

#[tokio::test]
async fn test_fresh_cache_skips_the_catalog() {
    // No catalog mock is mounted: a fetch would fail loudly.
    let server = MockServer::start().await;

    let catalog = CatalogClient::new(server.uri(), reqwest::Client::new());
    let cache = SelectionCache::new();
    cache.set("gemini-1.5-flash");

    let candidates = resolve_candidates(&catalog, &cache, "key", Workload::Interview, None)
        .await
        .expect("cached selection should satisfy resolution");
    assert_eq!(candidates, vec!["gemini-1.5-flash"]);
}

#[tokio::test]
async fn test_pin_leads_even_with_fresh_cache() {
    let server = MockServer::start().await;

    let catalog = CatalogClient::new(server.uri(), reqwest::Client::new());
    let cache = SelectionCache::new();
    cache.set("gemini-1.5-flash");

    let candidates = resolve_candidates(
        &catalog,
        &cache,
        "key",
        Workload::Interview,
        Some("models/gemini-exp-1206"),
    )
    .await
    .expect("pin plus cache should resolve");
    assert_eq!(candidates, vec!["gemini-exp-1206", "gemini-1.5-flash"]);
}

#[tokio::test]
async fn test_empty_generation_is_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-1.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let backend = GenerateClient::new(server.uri(), reqwest::Client::new());
    let dispatcher = Dispatcher::with_default_classifier(
        backend,
        SelectionCache::new(),
        Workload::Interview,
    );

    let err = dispatcher
        .dispatch("key", &["gemini-1.5-flash".to_string()], &json!({}))
        .await
        .expect_err("empty output must not be retried");
    assert!(matches!(err, EngineError::EmptyGeneration { model } if model == "gemini-1.5-flash"));
}
