//! Integration tests for the HTTP transport against a mock server
//!
//! Covers path resolution, credential attachment, request shape and status
//! handling through the full client stack.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use festival_client::{
    ClientConfig, ClientError, Credential, FestivalClient, HttpTransport, RetryPolicy, Session, TicketTypeId,
    Transport,
};
use festival_core::RequestDescriptor;
use festival_testing::fixtures;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_policy() -> RetryPolicy {
    RetryPolicy::builder()
        .initial_delay(Duration::from_millis(1))
        .max_delay(Duration::from_millis(10))
        .build()
}

fn client_for(server: &MockServer, token: Option<&str>) -> FestivalClient {
    let config = ClientConfig {
        api_base: format!("{}/api/v1/", server.uri()),
        api_token: token.map(str::to_string),
        http_timeout: Duration::from_secs(5),
        retry: fast_policy(),
        ..ClientConfig::default()
    };
    FestivalClient::from_config(&config).unwrap()
}

#[tokio::test]
async fn test_logical_path_resolved_against_base() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tickets/types/on-sale"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![fixtures::ticket_type(7, 5)]))
        .expect(1)
        .mount(&server)
        .await;

    let ticket_types = client_for(&server, None).on_sale_ticket_types().await.unwrap();

    assert_eq!(ticket_types, vec![fixtures::ticket_type(7, 5)]);
}

#[tokio::test]
async fn test_bearer_credential_attached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/lineup/artists"))
        .and(header("authorization", "Bearer s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::lineup()))
        .expect(1)
        .mount(&server)
        .await;

    let artists = client_for(&server, Some("s3cret")).artists().await.unwrap();

    assert_eq!(artists.len(), 3);
}

#[tokio::test]
async fn test_no_credential_means_no_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/lineup/artists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    client_for(&server, None).artists().await.unwrap();

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    assert!(received[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_rotated_credential_keeps_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/schedule/slots"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![fixtures::slot(1, 10)]))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    client.schedule_slots().await.unwrap();

    let rotated = client.with_credential(Some(Credential::new("fresh")));
    assert_eq!(rotated.transport().session().credential().map(Credential::expose), Some("fresh"));
    assert_eq!(rotated.schedule_slots().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_reserve_body_and_params_preserved() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/tickets/types/12/reserve"))
        .and(body_json(json!({ "quantity": 2, "channel": "web", "dry_run": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "reserved": 2, "available": 18 })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/core/editions"))
        .and(query_param("is_active", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![fixtures::edition()]))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Some("tok"));
    let result = client
        .reservations()
        .commit(TicketTypeId::new(12), 2, "web")
        .await
        .unwrap();
    let edition = client.active_edition().await.unwrap();

    assert_eq!((result.reserved, result.available), (2, 18));
    assert_eq!(edition.map(|e| e.year), Some(2025));
}

#[tokio::test]
async fn test_server_errors_retried_until_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/lineup/artists"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(3)
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/lineup/artists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::lineup()))
        .expect(1)
        .mount(&server)
        .await;

    let artists = client_for(&server, None).artists().await.unwrap();

    assert_eq!(artists, fixtures::lineup());
}

#[tokio::test]
async fn test_forbidden_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/tickets/types/3/reserve"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({ "detail": "Forbidden" })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server, None)
        .reservations()
        .commit(TicketTypeId::new(3), 1, "web")
        .await
        .unwrap_err();

    assert_eq!(err, ClientError::Unauthorized { status: 403 });
}

#[tokio::test]
async fn test_transport_hands_back_every_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/teapot"))
        .respond_with(ResponseTemplate::new(418).set_body_string("short and stout"))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(Session::new(server.uri(), None).unwrap(), Duration::from_secs(5)).unwrap();
    let response = transport.execute(&RequestDescriptor::get("/teapot")).await.unwrap();

    assert_eq!(response.status, 418);
    assert_eq!(response.body, b"short and stout");
}

#[tokio::test]
async fn test_unreachable_server_is_network_failure() {
    // Bind then release an ephemeral port so nothing is listening on it.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let config = ClientConfig {
        api_base: format!("http://127.0.0.1:{port}/api/v1"),
        retry: RetryPolicy::no_retry(),
        ..ClientConfig::default()
    };
    let err = FestivalClient::from_config(&config)
        .unwrap()
        .artists()
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Network(_)));
    assert!(err.is_retryable());
}

#[test]
fn test_invalid_base_url_rejected() {
    let config = ClientConfig {
        api_base: "not a url".to_string(),
        ..ClientConfig::default()
    };

    assert!(matches!(
        FestivalClient::from_config(&config),
        Err(ClientError::InvalidBaseUrl(_))
    ));
}
