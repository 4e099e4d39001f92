use crate::common;
use httpmock::Method::GET;
use yfinance_session::{CacheMode, ErrorKind, YfError};

async fn fetch_with_status(status: u16) -> YfError {
    let server = common::setup_server();
    let _auth = common::mock_cookie_crumb(&server);
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/v7/finance/quote")
            .query_param("crumb", "crumb-value");
        then.status(status)
            .header("content-type", "application/json")
            .body("{}");
    });

    let client = common::client_for(&server).build().unwrap();
    let err = client
        .get_authenticated(&common::url(&server, "/v7/finance/quote"), None, CacheMode::Bypass)
        .await
        .unwrap_err();
    mock.assert();
    err
}

#[tokio::test]
async fn quote_404_maps_to_not_found() {
    match fetch_with_status(404).await {
        YfError::NotFound { url } => assert!(url.contains("/v7/finance/quote")),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn quote_429_maps_to_rate_limited() {
    match fetch_with_status(429).await {
        YfError::RateLimited { url } => assert!(url.contains("/v7/finance/quote")),
        other => panic!("expected RateLimited, got {other:?}"),
    }
}

#[tokio::test]
async fn quote_5xx_maps_to_network_kind() {
    let err = fetch_with_status(502).await;
    assert!(matches!(err, YfError::ServerError { status: 502, .. }), "got {err:?}");
    assert_eq!(err.kind(), ErrorKind::Network);
}

#[tokio::test]
async fn other_4xx_is_unknown() {
    let err = fetch_with_status(418).await;
    assert!(matches!(err, YfError::Status { status: 418, .. }), "got {err:?}");
    assert_eq!(err.kind(), ErrorKind::Unknown);
}
