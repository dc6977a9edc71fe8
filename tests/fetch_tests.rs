//! Fetcher behaviour against a mock HTTP server.

use std::time::Duration;

use serde_json::{json, Value};
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use litexport::config::{FetchLimits, QuerySpec};
use litexport::crossref::CrossrefClient;
use litexport::springer::{SpringerClient, StopReason};
use litexport::ExportError;

const SPRINGER_PATH: &str = "/openaccess/json";
const CROSSREF_PATH: &str = "/works";

fn limits(max_pages: usize) -> FetchLimits {
    FetchLimits {
        max_pages,
        request_timeout: Duration::from_secs(5),
    }
}

fn springer_client(server: &MockServer, max_pages: usize) -> SpringerClient {
    let endpoint = Url::parse(&format!("{}{}", server.uri(), SPRINGER_PATH)).unwrap();
    SpringerClient::new(endpoint, "test-key", &limits(max_pages)).unwrap()
}

fn crossref_client(server: &MockServer) -> CrossrefClient {
    let endpoint = Url::parse(&format!("{}{}", server.uri(), CROSSREF_PATH)).unwrap();
    CrossrefClient::new(endpoint, &limits(1)).unwrap()
}

fn springer_page(start: usize, count: usize) -> Value {
    let records: Vec<Value> = (start..start + count)
        .map(|i| {
            json!({
                "title": format!("Paper {}", i),
                "publicationName": "Machine Learning",
                "publicationDate": "2020-06-01",
                "url": [{ "format": "html", "platform": "web", "value": format!("http://link.example/{}", i) }]
            })
        })
        .collect();
    json!({ "apiMessage": "This JSON was provided by Springer Nature", "records": records })
}

async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.map(|r| r.len()).unwrap_or(0)
}

// =============================================================================
// Springer pagination
// =============================================================================

#[tokio::test]
async fn test_springer_stops_on_empty_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SPRINGER_PATH))
        .and(query_param("s", "1"))
        .and(query_param("p", "50"))
        .and(query_param("q", "ai"))
        .and(query_param("api_key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(springer_page(1, 50)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(SPRINGER_PATH))
        .and(query_param("s", "51"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "records": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let query = QuerySpec::springer("ai", 50, 200, Some("test-key".to_string())).unwrap();
    let report = springer_client(&server, 20).fetch(&query).await.unwrap();

    assert_eq!(report.records.len(), 50);
    assert_eq!(report.pages_requested, 2);
    assert_eq!(report.stop, StopReason::EmptyPage);
    assert_eq!(request_count(&server).await, 2);
}

#[tokio::test]
async fn test_springer_stops_at_record_cap() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SPRINGER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(springer_page(1, 50)))
        .mount(&server)
        .await;

    let query = QuerySpec::springer("ai", 50, 100, Some("test-key".to_string())).unwrap();
    let report = springer_client(&server, 20).fetch(&query).await.unwrap();

    assert_eq!(report.records.len(), 100);
    assert_eq!(report.pages_requested, 2);
    assert_eq!(report.stop, StopReason::RecordCap);
    assert_eq!(request_count(&server).await, 2);
}

#[tokio::test]
async fn test_springer_keeps_whole_last_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SPRINGER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(springer_page(1, 30)))
        .mount(&server)
        .await;

    let query = QuerySpec::springer("ai", 30, 50, Some("test-key".to_string())).unwrap();
    let report = springer_client(&server, 20).fetch(&query).await.unwrap();

    assert_eq!(report.records.len(), 60);
    assert_eq!(report.stop, StopReason::RecordCap);
}

#[tokio::test]
async fn test_springer_advances_start_offset() {
    let server = MockServer::start().await;

    for (start, count) in [(1, 10), (11, 10), (21, 0)] {
        Mock::given(method("GET"))
            .and(path(SPRINGER_PATH))
            .and(query_param("s", start.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(springer_page(start, count)))
            .expect(1)
            .mount(&server)
            .await;
    }

    let query = QuerySpec::springer("ai", 10, 1000, Some("test-key".to_string())).unwrap();
    let report = springer_client(&server, 20).fetch(&query).await.unwrap();

    assert_eq!(report.records.len(), 20);
    assert_eq!(report.pages_requested, 3);
    let titles: Vec<&str> = report.records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles.first(), Some(&"Paper 1"));
    assert_eq!(titles.last(), Some(&"Paper 20"));
}

#[tokio::test]
async fn test_springer_page_limit_bounds_endless_pages() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SPRINGER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(springer_page(1, 5)))
        .mount(&server)
        .await;

    let query = QuerySpec::springer("ai", 5, 10_000, Some("test-key".to_string())).unwrap();
    let report = springer_client(&server, 3).fetch(&query).await.unwrap();

    assert_eq!(report.stop, StopReason::PageLimit);
    assert_eq!(report.pages_requested, 3);
    assert_eq!(report.records.len(), 15);
    assert_eq!(request_count(&server).await, 3);
}

#[tokio::test]
async fn test_springer_retries_once_on_error_description() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SPRINGER_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "error_description": "Premium content requested" })),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(SPRINGER_PATH))
        .and(query_param("s", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(springer_page(1, 3)))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(SPRINGER_PATH))
        .and(query_param("s", "4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "records": [] })))
        .mount(&server)
        .await;

    let query = QuerySpec::springer("ai", 3, 100, Some("test-key".to_string())).unwrap();
    let report = springer_client(&server, 20).fetch(&query).await.unwrap();

    assert_eq!(report.records.len(), 3);
    assert_eq!(request_count(&server).await, 3);
}

#[tokio::test]
async fn test_springer_persistent_error_marker_fails() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SPRINGER_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "error_description": "Premium content requested" })),
        )
        .mount(&server)
        .await;

    let query = QuerySpec::springer("ai", 50, 200, Some("test-key".to_string())).unwrap();
    let err = springer_client(&server, 20).fetch(&query).await.unwrap_err();

    match err {
        ExportError::Api(msg) => assert!(msg.contains("Premium content requested")),
        other => panic!("expected Api error, got {other:?}"),
    }
    assert_eq!(request_count(&server).await, 2);
}

#[tokio::test]
async fn test_springer_http_error_carries_status_and_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SPRINGER_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API key"))
        .mount(&server)
        .await;

    let query = QuerySpec::springer("ai", 50, 200, Some("bad-key".to_string())).unwrap();
    let err = springer_client(&server, 20).fetch(&query).await.unwrap_err();

    match err {
        ExportError::Http { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, "Invalid API key");
        }
        other => panic!("expected Http error, got {other:?}"),
    }
    assert_eq!(request_count(&server).await, 1);
}

// =============================================================================
// Crossref
// =============================================================================

#[tokio::test]
async fn test_crossref_normalizes_every_item() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CROSSREF_PATH))
        .and(query_param("query", "deep learning"))
        .and(query_param("rows", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "message-type": "work-list",
            "message": {
                "items": [
                    {
                        "title": ["Deep learning"],
                        "container-title": ["Nature"],
                        "issued": { "date-parts": [[2019]] },
                        "URL": "http://dx.doi.org/10.1038/nature14539"
                    },
                    { "title": ["No date"] },
                    {}
                ]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let query = QuerySpec::crossref("deep learning", 3).unwrap();
    let records = crossref_client(&server).fetch(&query).await.unwrap();

    assert_eq!(records.len(), 3);
    let first = &records.records()[0];
    assert_eq!(first.year, "2019");
    assert_eq!(first.publication, "Nature");
    assert_eq!(records.records()[1].title, "No date");
    assert!(records.records()[1].year.is_empty());
}

#[tokio::test]
async fn test_crossref_error_status_is_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CROSSREF_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "failed",
            "message-type": "validation-failure",
            "message": [{ "type": "integer-not-valid", "message": "Integer specified as huge is not a valid integer" }]
        })))
        .mount(&server)
        .await;

    let query = QuerySpec::crossref("ai", 10).unwrap();
    let err = crossref_client(&server).fetch(&query).await.unwrap_err();
    assert!(matches!(err, ExportError::Api(_)), "got {err:?}");
}

#[tokio::test]
async fn test_crossref_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CROSSREF_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .mount(&server)
        .await;

    let query = QuerySpec::crossref("ai", 10).unwrap();
    let err = crossref_client(&server).fetch(&query).await.unwrap_err();
    assert!(
        matches!(err, ExportError::Http { status: 503, .. }),
        "got {err:?}"
    );
}

#[tokio::test]
async fn test_crossref_request_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CROSSREF_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "ok", "message": { "items": [] } }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let endpoint = Url::parse(&format!("{}{}", server.uri(), CROSSREF_PATH)).unwrap();
    let client = CrossrefClient::new(
        endpoint,
        &FetchLimits {
            max_pages: 1,
            request_timeout: Duration::from_millis(200),
        },
    )
    .unwrap();

    let query = QuerySpec::crossref("ai", 10).unwrap();
    let err = client.fetch(&query).await.unwrap_err();
    assert!(matches!(err, ExportError::Network(_)), "got {err:?}");
}
