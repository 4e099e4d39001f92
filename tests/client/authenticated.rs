use crate::common;
use httpmock::Method::GET;
use std::time::Duration;
use yfinance_session::{CacheMode, CredentialService, QueryParams};

fn symbols(s: &str) -> Option<QueryParams> {
    let mut p = QueryParams::new();
    p.insert("symbols".into(), s.into());
    Some(p)
}

#[tokio::test]
async fn api_fetches_cookie_and_crumb_first() {
    let server = common::setup_server();
    let (cookie, crumb) = common::mock_cookie_crumb(&server);
    let api = server.mock(|when, then| {
        when.method(GET)
            .path("/v7/finance/quote")
            .query_param("symbols", "AAPL")
            .query_param("crumb", "crumb-value")
            .header("cookie", "A=B");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"quoteResponse":{"result":[],"error":null}}"#);
    });

    let client = common::client_for(&server).build().unwrap();
    let body = client
        .get_authenticated(
            &common::url(&server, "/v7/finance/quote"),
            symbols("AAPL"),
            CacheMode::Use,
        )
        .await
        .unwrap();

    assert!(body.contains("quoteResponse"));
    cookie.assert();
    crumb.assert();
    api.assert();
}

#[tokio::test]
async fn responses_are_served_from_cache_on_second_call() {
    let server = common::setup_server();
    let _auth = common::mock_cookie_crumb(&server);
    let api = server.mock(|when, then| {
        when.method(GET)
            .path("/v7/finance/quote")
            .query_param("symbols", "CACHE");
        then.status(200).body(r#"{"n":1}"#);
    });

    let client = common::client_for(&server)
        .cache_ttl(Duration::from_secs(10))
        .build()
        .unwrap();
    assert!(client.cache_enabled());
    let url = common::url(&server, "/v7/finance/quote");

    let a = client
        .get_authenticated(&url, symbols("CACHE"), CacheMode::Use)
        .await
        .unwrap();
    api.assert_calls(1);
    let b = client
        .get_authenticated(&url, symbols("CACHE"), CacheMode::Use)
        .await
        .unwrap();
    api.assert_calls(1);
    assert_eq!(a, b);

    // Refresh goes to the network but still updates the cache.
    client
        .get_authenticated(&url, symbols("CACHE"), CacheMode::Refresh)
        .await
        .unwrap();
    api.assert_calls(2);
    client
        .get_authenticated(&url, symbols("CACHE"), CacheMode::Use)
        .await
        .unwrap();
    api.assert_calls(2);

    // Bypass always hits the network.
    client
        .get_authenticated(&url, symbols("CACHE"), CacheMode::Bypass)
        .await
        .unwrap();
    api.assert_calls(3);
}

#[tokio::test]
async fn failed_responses_are_not_cached() {
    let server = common::setup_server();
    let _auth = common::mock_cookie_crumb(&server);
    let api = server.mock(|when, then| {
        when.method(GET).path("/v7/finance/quote");
        then.status(500);
    });

    let client = common::client_for(&server)
        .cache_ttl(Duration::from_secs(10))
        .build()
        .unwrap();
    let url = common::url(&server, "/v7/finance/quote");
    for _ in 0..2 {
        assert!(
            client
                .get_authenticated(&url, symbols("X"), CacheMode::Use)
                .await
                .is_err()
        );
    }
    api.assert_calls(2);
    assert_eq!(client.cache().unwrap().len().await, 0);
}

#[derive(Debug, serde::Deserialize)]
struct Envelope {
    count: u32,
}

#[tokio::test]
async fn get_json_authenticated_decodes() {
    let server = common::setup_server();
    let _auth = common::mock_cookie_crumb(&server);
    let _api = server.mock(|when, then| {
        when.method(GET).path("/v1/finance/search");
        then.status(200).body(r#"{"count": 3}"#);
    });

    let client = common::client_for(&server).build().unwrap();
    let env: Envelope = client
        .get_json_authenticated(&common::url(&server, "/v1/finance/search"), None, CacheMode::Bypass)
        .await
        .unwrap();
    assert_eq!(env.count, 3);
}

#[tokio::test]
async fn client_exposes_credential_service() {
    let server = common::setup_server();
    let _auth = common::mock_cookie_crumb(&server);
    let client = common::client_for(&server).build().unwrap();

    let svc: &dyn CredentialService = &client;
    assert_eq!(svc.crumb().await.unwrap(), "crumb-value");
    assert_eq!(client.session().cookie().await.as_deref(), Some("A=B"));
}
