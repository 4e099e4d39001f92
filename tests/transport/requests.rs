use crate::common;
use futures::future::join_all;
use httpmock::Method::{GET, POST};
use serde_json::json;
use std::sync::Arc;
use yfinance_session::{BrowserProfile, ErrorKind, QueryParams, Transport, YfError};

#[tokio::test]
async fn get_sends_profile_headers_and_params() {
    let server = common::setup_server();
    let profile = BrowserProfile::Chrome120;
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/v7/finance/quote")
            .query_param("symbols", "AAPL,MSFT")
            .header("user-agent", profile.user_agent())
            .header("accept-language", "en-US,en;q=0.9")
            .header_exists("accept")
            .header_exists("sec-ch-ua");
        then.status(200)
            .header("x-request-id", "abc")
            .body("{\"ok\":true}");
    });

    let transport = Transport::builder().profile(profile).build();
    assert!(!transport.is_initialized());

    let mut params = QueryParams::new();
    params.insert("symbols".into(), "AAPL,MSFT".into());
    let resp = transport
        .get(&common::url(&server, "/v7/finance/quote"), Some(&params))
        .await
        .unwrap();

    mock.assert();
    assert!(transport.is_initialized());
    assert_eq!(resp.status(), 200);
    assert!(resp.is_success());
    assert_eq!(resp.text(), "{\"ok\":true}");
    assert_eq!(resp.header("x-request-id"), Some("abc"));
}

#[tokio::test]
async fn stored_cookie_is_attached_to_get_and_post_json() {
    let server = common::setup_server();
    let get = server.mock(|when, then| {
        when.method(GET).path("/data").header("cookie", "A=B");
        then.status(200).body("got");
    });
    let post = server.mock(|when, then| {
        when.method(POST)
            .path("/search")
            .header("cookie", "A=B")
            .json_body(json!({"query": "apple", "size": 5}));
        then.status(200).body("posted");
    });

    let transport = Transport::default();
    transport.set_cookie("A=B");

    let r = transport.get(&common::url(&server, "/data"), None).await.unwrap();
    assert_eq!(r.text(), "got");
    let r = transport
        .post_json(
            &common::url(&server, "/search"),
            None,
            &json!({"query": "apple", "size": 5}),
        )
        .await
        .unwrap();
    assert_eq!(r.into_text(), "posted");

    get.assert();
    post.assert();
}

#[tokio::test]
async fn post_encodes_form_in_order() {
    let server = common::setup_server();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/form")
            .query_param("sessionId", "s1")
            .header("content-type", "application/x-www-form-urlencoded")
            .body("agree=agree&agree=agree&note=two+words");
        then.status(302).header("location", "/done");
    });
    let done = server.mock(|when, then| {
        when.method(GET).path("/done");
        then.status(200).body("done");
    });

    let transport = Transport::default();
    let mut params = QueryParams::new();
    params.insert("sessionId".into(), "s1".into());
    let resp = transport
        .post(
            &common::url(&server, "/form"),
            Some(&params),
            &[("agree", "agree"), ("agree", "agree"), ("note", "two words")],
        )
        .await
        .unwrap();

    mock.assert();
    done.assert();
    assert_eq!(resp.text(), "done");
}

#[derive(Debug, serde::Deserialize)]
struct Payload {
    value: u32,
}

#[tokio::test]
async fn get_json_decodes_and_classifies() {
    let server = common::setup_server();
    let _ok = server.mock(|when, then| {
        when.method(GET).path("/ok");
        then.status(200).body(r#"{"value": 7}"#);
    });
    let _bad = server.mock(|when, then| {
        when.method(GET).path("/bad");
        then.status(200).body("<html>not json</html>");
    });
    let _gone = server.mock(|when, then| {
        when.method(GET).path("/gone");
        then.status(410).body(r#"{"value": 1}"#);
    });

    let transport = Transport::default();
    let p: Payload = transport
        .get_json(&common::url(&server, "/ok"), None)
        .await
        .unwrap();
    assert_eq!(p.value, 7);

    let err = transport
        .get_json::<Payload>(&common::url(&server, "/bad"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, YfError::Json(_)), "got {err:?}");
    assert_eq!(err.kind(), ErrorKind::InvalidResponse);

    let err = transport
        .get_json::<Payload>(&common::url(&server, "/gone"), None)
        .await
        .unwrap_err();
    match err {
        YfError::Status { status, url } => {
            assert_eq!(status, 410);
            assert!(url.ends_with("/gone"));
        }
        other => panic!("expected Status, got {other:?}"),
    }
}

#[tokio::test]
async fn error_statuses_are_returned_not_raised() {
    let server = common::setup_server();
    let _m = server.mock(|when, then| {
        when.method(GET).path("/limited");
        then.status(429).body("Too Many Requests");
    });

    let transport = Transport::default();
    let resp = transport
        .get(&common::url(&server, "/limited"), None)
        .await
        .unwrap();
    assert_eq!(resp.status(), 429);
    assert_eq!(resp.text(), "Too Many Requests");

    let err = resp.error_for_status().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RateLimit);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_requests_share_one_engine() {
    let server = common::setup_server();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/ping");
        then.status(200).body("pong");
    });

    let transport = Arc::new(Transport::default());
    let url = common::url(&server, "/ping");
    let tasks = (0..12).map(|_| {
        let t = Arc::clone(&transport);
        let u = url.clone();
        tokio::spawn(async move { t.get(&u, None).await.map(|r| r.into_text()) })
    });
    for r in join_all(tasks).await {
        assert_eq!(r.unwrap().unwrap(), "pong");
    }
    mock.assert_calls(12);
    assert!(transport.is_initialized());
}

#[tokio::test]
async fn custom_user_agent_overrides_profile() {
    let server = common::setup_server();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/ua").header("user-agent", "custom-agent/1.0");
        then.status(200);
    });

    let transport = Transport::builder()
        .profile(BrowserProfile::Firefox121)
        .user_agent("custom-agent/1.0")
        .build();
    transport.get(&common::url(&server, "/ua"), None).await.unwrap();
    mock.assert();
}
