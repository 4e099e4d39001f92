use crate::common;
use httpmock::Method::GET;
use yfinance_session::{ErrorKind, Transport, YfError};

#[tokio::test]
async fn requests_after_close_fail_without_panicking() {
    let server = common::setup_server();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/x");
        then.status(200).body("x");
    });

    let transport = Transport::default();
    let url = common::url(&server, "/x");
    transport.get(&url, None).await.unwrap();

    transport.close();
    assert!(transport.is_closed());

    let err = transport.get(&url, None).await.unwrap_err();
    assert!(matches!(err, YfError::Closed), "got {err:?}");
    assert_eq!(err.kind(), ErrorKind::Network);
    assert!(matches!(
        transport.post(&url, None, &[]).await,
        Err(YfError::Closed)
    ));
    mock.assert_calls(1);
}

#[tokio::test]
async fn close_is_idempotent() {
    let server = common::setup_server();
    let _m = server.mock(|when, then| {
        when.method(GET).path("/x");
        then.status(200);
    });

    let transport = Transport::default();
    transport.get(&common::url(&server, "/x"), None).await.unwrap();
    transport.close();
    transport.close();
    transport.close();
    assert!(transport.is_closed());
}

#[tokio::test]
async fn close_before_any_request_never_builds_the_engine() {
    let server = common::setup_server();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/x");
        then.status(200);
    });

    let transport = Transport::default();
    transport.close();
    assert!(transport.get(&common::url(&server, "/x"), None).await.is_err());
    assert!(!transport.is_initialized());
    assert_eq!(mock.hits(), 0);
}

#[tokio::test]
async fn client_close_shuts_down_transport() {
    let server = common::setup_server();
    let client = common::client_for(&server)
        .cache_ttl(std::time::Duration::from_secs(5))
        .build()
        .unwrap();
    let transport = std::sync::Arc::clone(client.transport());
    client.close();
    assert!(transport.is_closed());
}
