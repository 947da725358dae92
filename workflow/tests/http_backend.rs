//! HttpBackend against a mock REST API

use models::{ScanId, Severity};
use url::Url;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use workflow::{BackendError, HttpBackend, ScanBackend, StartResponse, DEFAULT_TIMEOUT};

fn backend(server: &MockServer) -> HttpBackend {
    HttpBackend::new(Url::parse(&server.uri()).unwrap(), DEFAULT_TIMEOUT).unwrap()
}

fn target() -> Url {
    Url::parse("https://shop.example/").unwrap()
}

#[tokio::test]
async fn test_start_scan_accepted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/analysis/start"))
        .and(header("authorization", "Bearer tok-1"))
        .and(body_json(serde_json::json!({ "url": "https://shop.example/" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": 42, "status": "PENDING" })))
        .expect(1)
        .mount(&server)
        .await;

    match backend(&server).start_scan(&target(), "tok-1").await.unwrap() {
        StartResponse::Accepted(accepted) => {
            assert_eq!(accepted.id, ScanId::Remote("42".into()));
            assert_eq!(accepted.status.as_deref(), Some("PENDING"));
        }
        other => panic!("expected an accepted scan, got {other:?}"),
    }
}

#[tokio::test]
async fn test_start_scan_synchronous_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/analysis/start"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "url": "https://shop.example/",
            "vulnerabilities": [
                {"type": "SQL_INJECTION", "severity": "CRITICAL", "pattern": "' OR 1=1--", "confidence": 0.99},
                {"type": "CSP_MISSING", "severity": "MEDIUM", "confidence": "0.95"}
            ],
            "vulnerability_count": 2
        })))
        .mount(&server)
        .await;

    match backend(&server).start_scan(&target(), "tok").await.unwrap() {
        StartResponse::Completed(result) => {
            assert_eq!(result.vulnerabilities.len(), 2);
            assert_eq!(result.vulnerabilities[0].severity, Severity::Critical);
            assert_eq!(result.vulnerabilities[1].confidence_percent(), 95);
        }
        other => panic!("expected a completed result, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unauthorized_is_distinguished() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/analysis/start"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({ "message": "expired" })))
        .mount(&server)
        .await;

    let err = backend(&server).start_scan(&target(), "stale").await.unwrap_err();
    assert_eq!(err, BackendError::Unauthorized);
}

#[tokio::test]
async fn test_status_poll() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/analysis/status/42"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "FAILED",
            "errorMessage": "crawler blocked"
        })))
        .mount(&server)
        .await;

    let reply = backend(&server).scan_status(&ScanId::parse("42"), "tok").await.unwrap();
    assert_eq!(reply.status, "FAILED");
    assert_eq!(reply.error_message.as_deref(), Some("crawler blocked"));
}

#[tokio::test]
async fn test_server_error_carries_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/analysis/status/7"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({ "error": "database down" })))
        .mount(&server)
        .await;

    let err = backend(&server).scan_status(&ScanId::parse("7"), "tok").await.unwrap_err();
    assert_eq!(err, BackendError::Http { status: 500, message: "database down".into() });
}

#[tokio::test]
async fn test_malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/analysis/status/7"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = backend(&server).scan_status(&ScanId::parse("7"), "tok").await.unwrap_err();
    assert!(matches!(err, BackendError::Decode(_)));
}

#[tokio::test]
async fn test_history_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/analysis"))
        .and(query_param("page", "2"))
        .and(query_param("size", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "content": [
                {"id": 3, "targetUrl": "https://a.example", "status": "COMPLETED"}
            ],
            "totalPages": 4
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = backend(&server).list_scans(2, 5, "tok").await.unwrap();
    assert_eq!(page.total_pages, 4);
    assert_eq!(page.items[0].id, ScanId::Remote("3".into()));
}
