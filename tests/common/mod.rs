#![allow(dead_code)]

use axum_test::TestServer;
use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use shortlink::application::services::{CodeStrategy, LinkService};
use shortlink::domain::entities::NewLink;
use shortlink::domain::repositories::LinkRepository;
use shortlink::infrastructure::persistence::MemoryLinkRepository;
use shortlink::routes::app_router;
use shortlink::state::AppState;
use std::sync::Arc;
use std::time::Duration;

pub const BASE_URL: &str = "http://sho.rt";

pub fn create_test_state(repository: Arc<MemoryLinkRepository>) -> AppState {
    create_test_state_with_strategy(repository, CodeStrategy::Random)
}

pub fn create_test_state_with_strategy(
    repository: Arc<MemoryLinkRepository>,
    strategy: CodeStrategy,
) -> AppState {
    let link_service = LinkService::new(repository, BASE_URL).with_code_strategy(strategy, 8);
    AppState::new(Arc::new(link_service))
}

/// Full application router over a fresh in-memory repository.
pub fn create_test_server() -> (TestServer, Arc<MemoryLinkRepository>) {
    let repository = Arc::new(MemoryLinkRepository::new());
    let state = create_test_state(repository.clone());
    let server = TestServer::new(app_router(state)).unwrap();
    (server, repository)
}

pub async fn create_test_link(
    repository: &MemoryLinkRepository,
    code: &str,
    url: &str,
    expire_at: Option<DateTime<Utc>>,
) {
    repository
        .create(NewLink {
            id: None,
            code: code.to_string(),
            long_url: url.to_string(),
            created_at: Utc::now(),
            expire_at,
        })
        .await
        .unwrap();
}

/// Creates a link through the API and returns the response body.
pub async fn shorten(server: &TestServer, body: Value) -> Value {
    let response = server.post("/api/v1/shorten").json(&body).await;
    response.assert_status_ok();
    response.json::<Value>()
}

pub async fn shorten_url(server: &TestServer, url: &str) -> String {
    let body = shorten(server, json!({ "url": url })).await;
    body["code"].as_str().unwrap().to_string()
}

/// Polls the link info endpoint until `click_count` reaches `expected`.
///
/// Click updates run detached from the redirect, so they land shortly after
/// the response.
pub async fn wait_for_clicks(server: &TestServer, code: &str, expected: i64) -> Value {
    let path = format!("/api/v1/links/{}", code);
    let mut body = Value::Null;

    for _ in 0..100 {
        body = server.get(&path).await.json::<Value>();
        if body["click_count"] == expected {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    panic!("click_count never reached {expected}, last body: {body}");
}

pub fn is_valid_code(code: &str) -> bool {
    (6..=32).contains(&code.len())
        && code.chars().all(|c| c.is_ascii_alphanumeric())
        && !code.chars().all(|c| c.is_ascii_digit())
}
