use crate::common;
use httpmock::Method::GET;
use yfinance_session::YfError;

#[tokio::test]
async fn missing_set_cookie_header_is_an_error() {
    let server = common::setup_server();

    // Cookie endpoint returns 200 but no Set-Cookie header.
    let cookie = server.mock(|when, then| {
        when.method(GET).path("/consent");
        then.status(200);
    });
    let crumb = server.mock(|when, then| {
        // won't be reached, but good to have
        when.method(GET).path("/v1/test/getcrumb");
        then.status(200).body("crumb-value");
    });

    let session = common::session_for(&server);
    let err = session.get_token().await.unwrap_err();
    cookie.assert();

    match err {
        YfError::Auth(s) => {
            assert!(s.contains("cookie step"), "unexpected error: {s}");
            assert!(s.contains("No cookie received"), "unexpected error: {s}");
        }
        other => panic!("expected Auth error, got {other:?}"),
    }
    assert_eq!(
        crumb.hits(),
        0,
        "crumb endpoint should not be called if cookie fails"
    );
}

#[tokio::test]
async fn invalid_crumb_body_is_an_error() {
    let server = common::setup_server();

    let _cookie = server.mock(|when, then| {
        when.method(GET).path("/consent");
        then.status(200).header("set-cookie", "A=B; Path=/");
    });
    // Crumb endpoint returns "{}" which should be rejected
    let _crumb = server.mock(|when, then| {
        when.method(GET).path("/v1/test/getcrumb");
        then.status(200).body("{}");
    });

    let session = common::session_for(&server);
    let err = session.get_token().await.unwrap_err();

    match err {
        YfError::Auth(s) => assert!(s.contains("Received invalid crumb"), "unexpected: {s}"),
        other => panic!("expected Auth error, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_crumb_body_is_an_error() {
    let server = common::setup_server();
    let _cookie = server.mock(|when, then| {
        when.method(GET).path("/consent");
        then.status(200).header("set-cookie", "A=B; Path=/");
    });
    let _crumb = common::mock_basic_crumb(&server, 200, "   \n");

    let session = common::session_for(&server);
    match session.get_token().await.unwrap_err() {
        YfError::Auth(s) => assert!(s.contains("empty crumb"), "unexpected: {s}"),
        other => panic!("expected Auth error, got {other:?}"),
    }
}

#[tokio::test]
async fn consent_collect_failure_names_its_step() {
    let server = common::setup_server();
    let _page = server.mock(|when, then| {
        when.method(GET).path("/guce/consent");
        then.status(200).body(common::CONSENT_HTML);
    });
    let collect = server.mock(|when, then| {
        when.method(httpmock::Method::POST).path("/v2/collectConsent");
        then.status(500);
    });

    let session = common::session_for(&server).with_strategy(yfinance_session::Strategy::Csrf);
    match session.get_token().await.unwrap_err() {
        YfError::Auth(s) => {
            assert!(s.contains("csrf strategy: consent collect step"), "unexpected: {s}");
            assert!(s.contains("basic strategy: cookie step"), "unexpected: {s}");
        }
        other => panic!("expected Auth error, got {other:?}"),
    }
    collect.assert_calls(1);
}
