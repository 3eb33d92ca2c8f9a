//! HTTP-level tests for the chat API
//!
//! Run with: cargo test --features server --test api_test

#![cfg(feature = "server")]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use intent_router::api::create_router_api;
use intent_router::{
    CompletionProvider, CredentialSet, IntentRouter, MemoryStore, ProviderError, RouterConfig,
    WeatherError, WeatherLookup, WeatherReport,
};

struct FixedProvider(Option<String>);

#[async_trait]
impl CompletionProvider for FixedProvider {
    async fn complete(&self, _: &str, model: &str, _: &str) -> Result<String, ProviderError> {
        self.0
            .clone()
            .ok_or_else(|| ProviderError::classify(model, Some(429), "quota exceeded"))
    }

    fn provider_name(&self) -> &str {
        "fixed"
    }
}

struct NoWeather;

#[async_trait]
impl WeatherLookup for NoWeather {
    async fn current(&self, _: &str) -> Result<WeatherReport, WeatherError> {
        Err(WeatherError::Unavailable("offline".to_string()))
    }
}

fn app(completion: Option<Value>) -> axum::Router {
    let mut config = RouterConfig::default();
    config.provider.credentials = CredentialSet::collect(Some("key"), Vec::<String>::new());
    let router = IntentRouter::builder(config)
        .provider(Arc::new(FixedProvider(completion.map(|v| v.to_string()))))
        .store(Arc::new(MemoryStore::new()))
        .weather(Arc::new(NoWeather))
        .build()
        .unwrap();
    create_router_api(Arc::new(router))
}

fn chat_request(query: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "query": query }).to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let response = app(None)
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["store"], "memory");
}

#[tokio::test]
async fn test_chat_count() {
    let completion = json!({
        "tool": "database",
        "action": "count",
        "parameters": {"entity": "product", "filters": {}}
    });
    let response = app(Some(completion))
        .oneshot(chat_request("How many products?"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["responseText"], "There are 0 products.");
    assert!(body["structuredData"].is_null());
}

#[tokio::test]
async fn test_chat_exhausted_is_503_with_stable_text() {
    let response = app(None).oneshot(chat_request("hello")).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("temporarily unavailable"));
    assert!(!message.contains("quota"));
}

#[tokio::test]
async fn test_chat_rejects_blank_query() {
    let response = app(None).oneshot(chat_request("   ")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
