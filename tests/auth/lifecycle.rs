use crate::common;
use std::sync::Arc;
use yfinance_session::{CredentialService, SessionManager, Strategy, Transport};

#[tokio::test]
async fn switch_strategy_toggles_and_clears() {
    let server = common::setup_server();
    let _m = common::mock_cookie_crumb(&server);
    let session = common::session_for(&server);

    session.get_token().await.unwrap();
    assert!(session.cookie().await.is_some());

    session.switch_strategy().await;
    assert_eq!(session.strategy().await, Strategy::Csrf);
    assert_eq!(session.cookie().await, None);
    assert_eq!(session.expires_at().await, None);
    assert_eq!(session.transport().cookie(), None);

    session.switch_strategy().await;
    assert_eq!(session.strategy().await, Strategy::Basic);
}

#[tokio::test]
async fn reset_clears_credentials_but_keeps_strategy() {
    let server = common::setup_server();
    let (cookie, crumb) = common::mock_cookie_crumb(&server);
    let session = common::session_for(&server).with_strategy(Strategy::Basic);

    session.get_token().await.unwrap();
    session.reset().await;
    assert_eq!(session.strategy().await, Strategy::Basic);
    assert_eq!(session.cookie().await, None);
    assert_eq!(session.expires_at().await, None);

    // Re-acquired on the next call.
    assert_eq!(session.get_token().await.unwrap(), "crumb-value");
    cookie.assert_calls(2);
    crumb.assert_calls(2);
}

#[tokio::test]
async fn reset_keeps_a_switched_strategy() {
    let server = common::setup_server();
    let session = common::session_for(&server);
    session.switch_strategy().await;
    session.reset().await;
    assert_eq!(session.strategy().await, Strategy::Csrf);
}

#[tokio::test]
async fn preset_credentials_skip_the_network() {
    let server = common::setup_server();
    let (cookie, crumb) = common::mock_cookie_crumb(&server);

    let session = SessionManager::new(Arc::new(Transport::default()), common::endpoints(&server))
        .with_credentials("X=Y", "preset");
    assert_eq!(session.get_token().await.unwrap(), "preset");
    assert_eq!(session.transport().cookie().as_deref(), Some("X=Y"));
    assert_eq!(cookie.hits(), 0);
    assert_eq!(crumb.hits(), 0);
}

#[tokio::test]
async fn credential_service_invalidate_switches_strategy() {
    let server = common::setup_server();
    let _m = common::mock_cookie_crumb(&server);
    let session = common::session_for(&server);

    let svc: &dyn CredentialService = &session;
    assert_eq!(svc.crumb().await.unwrap(), "crumb-value");
    svc.invalidate().await;
    assert_eq!(session.strategy().await, Strategy::Csrf);
    assert_eq!(session.expires_at().await, None);
}
