//! Integration tests for Unscatter
//!
//! These run the gateway against a local HTTP server speaking the proxy's
//! JSON contract.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use unscatter::classify::messages;
use unscatter::config::{ApiConfig, Config};
use unscatter::{AnalysisGateway, AnalyzeError, ImagePayload, LimiterConfig};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> Config {
    Config {
        api: ApiConfig {
            base_url: server.uri(),
            timeout_ms: 2_000,
        },
        ..Default::default()
    }
}

fn plan_body() -> serde_json::Value {
    json!({
        "tasks": [
            {"id": 1, "task": "Buy milk", "cluster": "Errands", "effort": "low", "impact": "low", "dependencies": []},
            {"id": 2, "task": "Call dentist", "cluster": "Health", "effort": "low", "impact": "medium", "dependencies": []}
        ],
        "nextActionId": 2
    })
}

// =============================================================================
// Analysis
// =============================================================================

#[tokio::test]
async fn test_analyze_success_then_cached() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/analyze"))
        .and(body_partial_json(json!({"inputText": "Buy milk. Call dentist.", "images": []})))
        .respond_with(ResponseTemplate::new(200).set_body_json(plan_body()))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = AnalysisGateway::from_config(&config_for(&server)).expect("Failed to build gateway");

    let first = gateway.analyze("Buy milk. Call dentist.", &[]).await.unwrap();
    let second = gateway.analyze("Buy milk. Call dentist.", &[]).await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.tasks.len(), 2);
    assert_eq!(first.next_action().map(|t| t.text.as_str()), Some("Call dentist"));
}

#[tokio::test]
async fn test_analyze_sends_images() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/analyze"))
        .and(body_partial_json(json!({"images": [{"mimeType": "image/png"}]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(plan_body()))
        .expect(1)
        .mount(&server)
        .await;

    let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D];
    let gateway = AnalysisGateway::from_config(&config_for(&server)).unwrap();

    gateway
        .analyze("", &[ImagePayload::from_bytes("image/png", &png)])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_error_body_is_classified() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/analyze"))
        .respond_with(
            ResponseTemplate::new(429)
                .set_body_json(json!({"error": "Too many requests from this IP", "code": "rate_limited"})),
        )
        .mount(&server)
        .await;

    let gateway = AnalysisGateway::from_config(&config_for(&server)).unwrap();
    let err = gateway.analyze("Plan my week", &[]).await.unwrap_err();

    assert!(matches!(err, AnalyzeError::QuotaExceeded));
    assert_eq!(err.to_string(), messages::QUOTA_EXCEEDED);
}

#[tokio::test]
async fn test_auth_status_without_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/analyze"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let gateway = AnalysisGateway::from_config(&config_for(&server)).unwrap();
    let err = gateway.analyze("Plan my week", &[]).await.unwrap_err();

    assert!(matches!(err, AnalyzeError::AuthFailure));
}

#[tokio::test]
async fn test_invalid_structure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/analyze"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tasks": "none", "nextActionId": 1})))
        .mount(&server)
        .await;

    let gateway = AnalysisGateway::from_config(&config_for(&server)).unwrap();
    let err = gateway.analyze("Plan my week", &[]).await.unwrap_err();

    assert!(matches!(err, AnalyzeError::InvalidResponseStructure));
    assert_eq!(gateway.cache_stats().await.size, 0);
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/analyze"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(plan_body())
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.api.timeout_ms = 200;
    let gateway = AnalysisGateway::from_config(&config).unwrap();

    let err = gateway.analyze("Plan my week", &[]).await.unwrap_err();
    assert!(matches!(err, AnalyzeError::NetworkFailure));
}

#[tokio::test]
async fn test_unreachable_service() {
    let config = Config {
        api: ApiConfig {
            // Reserved port, nothing listens here
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_ms: 2_000,
        },
        ..Default::default()
    };
    let gateway = AnalysisGateway::from_config(&config).unwrap();

    let err = gateway.analyze("Plan my week", &[]).await.unwrap_err();
    assert_eq!(err.to_string(), messages::NETWORK_FAILURE);
}

#[tokio::test]
async fn test_limit_applies_before_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/analyze"))
        .respond_with(ResponseTemplate::new(200).set_body_json(plan_body()))
        .expect(1)
        .mount(&server)
        .await;

    let config = Config {
        rate_limit: LimiterConfig {
            max_requests: 1,
            window_ms: 60_000,
        },
        ..config_for(&server)
    };
    let gateway = AnalysisGateway::from_config(&config).unwrap();

    gateway.analyze("one", &[]).await.unwrap();
    let err = gateway.analyze("two", &[]).await.unwrap_err();

    assert!(matches!(err, AnalyzeError::RateLimited { .. }));
    assert!(err.to_string().starts_with("Rate limit exceeded. Please wait "));
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_ok() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": "ok", "timestamp": "2025-01-01T00:00:00.000Z"})),
        )
        .mount(&server)
        .await;

    let gateway = AnalysisGateway::from_config(&config_for(&server)).unwrap();
    let health = gateway.health().await.unwrap();

    assert!(health.is_ok());
    assert_eq!(gateway.limiter_stats().await.active, 0);
}

#[tokio::test]
async fn test_health_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "Internal Server Error"})))
        .mount(&server)
        .await;

    let gateway = AnalysisGateway::from_config(&config_for(&server)).unwrap();
    let err = gateway.health().await.unwrap_err();

    assert!(matches!(err, AnalyzeError::GenericFailure));
}
