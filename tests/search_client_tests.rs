use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use podsearch::error::SearchError;
use podsearch::search_client::{Credential, SearchProvider, SerpApiClient};

mod test_helpers {
    use super::*;

    pub fn client(server: &MockServer, key: Option<&str>) -> SerpApiClient {
        SerpApiClient::new(Credential::Fixed(key.map(str::to_string)))
            .unwrap()
            .with_base_url(&server.uri())
    }
}

use test_helpers::client;

#[tokio::test]
async fn test_maps_organic_results_and_sends_trimmed_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("engine", "google"))
        .and(query_param("q", "climate policy"))
        .and(query_param("api_key", "secret-key"))
        .and(query_param("num", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "organic_results": [
                {
                    "title": "Climate policy explained",
                    "link": "https://www.example.org/climate",
                    "snippet": "An overview",
                    "displayed_link": "example.org › climate",
                    "source": "Example",
                    "date": "Mar 3, 2025"
                },
                {
                    "title": "No source here",
                    "link": "https://news.test/a/b",
                    "snippet": "Body"
                },
                {
                    "title": "Missing link is skipped"
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let results = client(&server, Some("  secret-key\n"))
        .search("climate policy", 3)
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].title, "Climate policy explained");
    assert_eq!(results[0].display_link, "example.org › climate");
    assert_eq!(results[0].source, "Example");
    assert_eq!(results[0].date.as_deref(), Some("Mar 3, 2025"));

    assert_eq!(results[1].source, "news.test");
    assert_eq!(results[1].display_link, "news.test");
    assert!(results[1].date.is_none());
}

#[tokio::test]
async fn test_missing_credential_is_configuration_error_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client(&server, None).search("q", 5).await.unwrap_err();
    assert!(matches!(err, SearchError::Configuration(_)));
    assert_eq!(err.to_string(), "SERP_API_KEY is not configured");

    let err = client(&server, Some("   ")).search("q", 5).await.unwrap_err();
    assert!(matches!(err, SearchError::Configuration(_)));
}

#[tokio::test]
async fn test_unset_env_credential_is_checked_per_call() {
    let client = SerpApiClient::new(Credential::from_env_var(
        "PODSEARCH_TEST_KEY_THAT_IS_NEVER_SET",
    ))
    .unwrap();
    assert!(!client.is_configured());
    let err = client.search("q", 5).await.unwrap_err();
    assert_eq!(err.kind(), "ConfigurationError");
}

#[tokio::test]
async fn test_unauthorized_carries_status_and_upstream_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid API key."})),
        )
        .mount(&server)
        .await;

    let err = client(&server, Some("bad")).search("q", 5).await.unwrap_err();
    match err {
        SearchError::Upstream {
            status_code,
            message,
        } => {
            assert_eq!(status_code, Some(401));
            assert_eq!(message, "SERP API returned 401: Invalid API key.");
        }
        other => panic!("expected upstream error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_without_error_field_uses_generic_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503).set_body_string("gateway down"))
        .mount(&server)
        .await;

    let err = client(&server, Some("key")).search("q", 5).await.unwrap_err();
    assert_eq!(err.to_string(), "SERP API returned 503: Unknown error");
    assert_eq!(err.kind(), "UpstreamError");
}

#[tokio::test]
async fn test_unreachable_upstream_did_not_respond() {
    // nothing listens on port 1
    let client = SerpApiClient::new(Credential::Fixed(Some("key".into())))
        .unwrap()
        .with_base_url("http://127.0.0.1:1");

    let err = client.search("q", 5).await.unwrap_err();
    match err {
        SearchError::Upstream {
            status_code,
            message,
        } => {
            assert_eq!(status_code, None);
            assert!(message.contains("did not respond"));
        }
        other => panic!("expected upstream error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_slow_upstream_times_out_as_did_not_respond() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"organic_results": []}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let err = client(&server, Some("key"))
        .with_timeout(Duration::from_millis(100))
        .search("q", 5)
        .await
        .unwrap_err();
    match err {
        SearchError::Upstream {
            status_code,
            message,
        } => {
            assert_eq!(status_code, None);
            assert!(message.contains("did not respond"));
        }
        other => panic!("expected upstream error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_success_without_organic_results_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "search_metadata": {"status": "Success"},
            "error": "Google hasn't returned any results for this query."
        })))
        .mount(&server)
        .await;

    let results = client(&server, Some("key")).search("zzzz", 5).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_garbage_body_is_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let err = client(&server, Some("key")).search("q", 5).await.unwrap_err();
    assert!(matches!(
        err,
        SearchError::Upstream {
            status_code: Some(200),
            ..
        }
    ));
}
