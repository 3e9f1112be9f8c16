//! Auth handshake and failure-surface scenarios.

use crate::{TestEnv, create_name};
use reqwest::StatusCode;
use swift_conformance::Error;
use swift_conformance::client::{Account, Connection};

/// Bad credentials fail the handshake with an auth error, not a
/// generic response error.
#[tokio::test]
async fn bad_credentials_are_rejected_at_the_handshake() {
    let env = TestEnv::new().await;
    let auth_url = env.config.auth_url.clone().expect("auth URL");

    let mut conn = Connection::new(auth_url, env.config.username.clone(), "wrong-key");
    match conn.authenticate().await {
        Err(Error::Auth) => {}
        other => panic!("expected auth rejection, got {other:?}"),
    }
}

/// A storage request before `authenticate()` fails without touching
/// the network.
#[tokio::test]
async fn requests_before_authentication_fail() {
    let conn = Connection::new("http://127.0.0.1:1/auth/v1.0", "test:tester", "testing");
    match Account::new(&conn).containers().await {
        Err(Error::Unauthenticated) => {}
        other => panic!("expected unauthenticated error, got {other:?}"),
    }
}

/// Any unexpected status surfaces as a response error carrying the
/// status code; reading a missing object is a 404.
#[tokio::test]
async fn missing_object_read_carries_the_status() {
    let env = TestEnv::new().await;
    let container = env.container(&create_name()).await;

    match container.object(create_name()).read().await {
        Err(Error::Response { status, .. }) => assert_eq!(status, StatusCode::NOT_FOUND),
        other => panic!("expected response error, got {other:?}"),
    }
}
