//! Shared helpers for the wiremock integration tests

use std::sync::Arc;

use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zscaler_common::testing::{MockClock, RecordingSleeper};
use zscaler_domain::ClientConfig;
use zscaler_infra::Executor;

pub const TOKEN_PATH: &str = "/oauth2/v1/token";

/// OneAPI client-secret configuration pointed at the mock server
pub fn oneapi_config(server: &MockServer) -> ClientConfig {
    ClientConfig {
        client_id: Some("client-id".into()),
        client_secret: Some("client-secret".into()),
        token_url: Some(format!("{}{TOKEN_PATH}", server.uri())),
        override_url: Some(server.uri()),
        ..ClientConfig::default()
    }
}

/// Answer token requests with `token`
pub async fn mount_token(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": token, "token_type": "Bearer", "expires_in": 3600})),
        )
        .mount(server)
        .await;
}

/// Executor whose back-off sleeps are recorded instead of awaited
pub fn executor(config: ClientConfig) -> (Executor, RecordingSleeper) {
    let clock = MockClock::new();
    let sleeper = RecordingSleeper::with_clock(clock.clone());
    let executor = Executor::builder(config)
        .sleeper(Arc::new(sleeper.clone()))
        .clock(Arc::new(clock))
        .build()
        .expect("executor should build");
    (executor, sleeper)
}

/// Number of requests the server saw for `request_path`
pub async fn hits(server: &MockServer, request_path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == request_path)
        .count()
}

/// `count` items numbered from `first`
pub fn items(first: u64, count: u64) -> Vec<Value> {
    (first..first + count).map(|id| json!({"id": id, "displayName": format!("item-{id}")})).collect()
}
