// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{closed_port_url, spawn_app};
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

async fn target_site() -> MockServer {
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<h1>Hello</h1>", "text/html"))
        .mount(&site)
        .await;
    site
}

/// 轮询直到收到回调请求
async fn wait_for_delivery(hook: &MockServer) -> Option<Request> {
    for _ in 0..50 {
        let received = hook.received_requests().await.unwrap_or_default();
        if let Some(request) = received.into_iter().find(|r| r.method.to_string() == "POST") {
            return Some(request);
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    None
}

#[tokio::test]
async fn test_webhook_failure_does_not_affect_run() {
    let site = target_site().await;
    let hook = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&hook)
        .await;

    let app = spawn_app().await;
    let user = app.register("hook@example.com").await;
    let scraper = app
        .create_scraper(
            &user,
            json!({
                "name": "Notifying",
                "targetUrl": site.uri(),
                "selectors": [{"name": "title", "selector": "h1"}],
                "webhook": {"active": true, "url": format!("{}/hook", hook.uri())}
            }),
        )
        .await;
    let scraper_id = scraper["id"].as_str().unwrap();

    let (status, body) = app.run(&user, scraper_id).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["status"], "success");

    let delivery = wait_for_delivery(&hook)
        .await
        .expect("webhook was never delivered");
    let has_header = |name: &str| {
        delivery
            .headers
            .keys()
            .any(|key| key.as_str().eq_ignore_ascii_case(name))
    };
    assert!(has_header("x-scrapeflow-signature"));
    assert!(has_header("x-scrapeflow-timestamp"));

    let payload: Value = serde_json::from_slice(&delivery.body).unwrap();
    assert_eq!(payload["scraperId"], scraper_id);
    assert_eq!(payload["data"], json!({"title": "Hello"}));
    assert!(payload["timestamp"].is_string());
}

#[tokio::test]
async fn test_inactive_webhook_is_not_called() {
    let site = target_site().await;
    let hook = MockServer::start().await;

    let app = spawn_app().await;
    let user = app.register("quiet@example.com").await;
    let scraper = app
        .create_scraper(
            &user,
            json!({
                "name": "Quiet",
                "targetUrl": site.uri(),
                "selectors": [{"name": "title", "selector": "h1"}],
                "webhook": {"active": false, "url": format!("{}/hook", hook.uri())}
            }),
        )
        .await;

    let (status, _) = app.run(&user, scraper["id"].as_str().unwrap()).await;
    assert_eq!(status, 200);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(hook.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_failed_run_sends_no_webhook() {
    let hook = MockServer::start().await;

    let app = spawn_app().await;
    let user = app.register("nohook@example.com").await;
    let scraper = app
        .create_scraper(
            &user,
            json!({
                "name": "Broken",
                "targetUrl": closed_port_url(),
                "selectors": [{"name": "title", "selector": "h1"}],
                "webhook": {"active": true, "url": hook.uri()}
            }),
        )
        .await;

    let (status, _) = app.run(&user, scraper["id"].as_str().unwrap()).await;
    assert_eq!(status, 500);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(hook.received_requests().await.unwrap_or_default().is_empty());
}
