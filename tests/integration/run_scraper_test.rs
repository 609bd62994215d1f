// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{
    bearer, closed_port_url, scraper_body, spawn_app, spawn_app_with_driver, BrokenDriver,
    StuckCloseDriver, UnreachableDriver,
};
use scrapeflow::domain::repositories::scraper_repository::ScraperRepository;
use scrapeflow::domain::repositories::user_repository::UserRepository;
use serde_json::{json, Value};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><body>{}</body></html>", body),
        "text/html",
    )
}

async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .mount(server)
        .await;
}

fn paginated(target: &str, max_pages: i64) -> Value {
    json!({
        "name": "Catalog",
        "targetUrl": target,
        "selectors": [
            {"name": "title", "selector": "h1"},
            {"name": "price", "selector": ".price"}
        ],
        "options": {
            "pagination": {"enabled": true, "nextSelector": "a.next", "maxPages": max_pages}
        }
    })
}

#[tokio::test]
async fn test_run_extracts_single_record() {
    let site = MockServer::start().await;
    mount_page(&site, "/", "<h1>Hello</h1>").await;

    let app = spawn_app().await;
    let user = app.register("run@example.com").await;
    let scraper = app
        .create_scraper(
            &user,
            scraper_body(
                &site.uri(),
                json!([
                    {"name": "title", "selector": "h1", "type": "text"},
                    {"name": "missing", "selector": ".nothing-here"}
                ]),
            ),
        )
        .await;
    let scraper_id = scraper["id"].as_str().unwrap();

    let (status, body) = app.run(&user, scraper_id).await;
    assert_eq!(status, 200, "{}", body);
    assert_eq!(body["success"], true);

    let record = &body["data"];
    assert_eq!(record["status"], "success");
    assert_eq!(record["data"], json!({"title": "Hello", "missing": null}));
    assert_eq!(record["scraperId"], scraper_id);
    assert!(record.get("error").is_none());
    assert!(record["executionTimeMs"].as_i64().unwrap() >= 0);

    let owner = app.users.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(owner.usage_count, 1);

    let id: Uuid = scraper_id.parse().unwrap();
    let stored = app.scrapers.find_owned(id, user.id).await.unwrap().unwrap();
    assert!(stored.schedule.last_run.is_some());
}

#[tokio::test]
async fn test_extracts_html_and_attributes() {
    let site = MockServer::start().await;
    mount_page(
        &site,
        "/item",
        r#"<div class="desc"> <b>Bold</b> </div><a class="more" href="/details">More</a>"#,
    )
    .await;

    let app = spawn_app().await;
    let user = app.register("kinds@example.com").await;
    let scraper = app
        .create_scraper(
            &user,
            scraper_body(
                &format!("{}/item", site.uri()),
                json!([
                    {"name": "desc", "selector": ".desc", "type": "html"},
                    {"name": "link", "selector": "a.more", "type": "attribute", "attribute": "href"},
                    {"name": "noattr", "selector": "a.more", "type": "attribute"}
                ]),
            ),
        )
        .await;

    let (status, body) = app.run(&user, scraper["id"].as_str().unwrap()).await;
    assert_eq!(status, 200);
    assert_eq!(
        body["data"]["data"],
        json!({"desc": "<b>Bold</b>", "link": "/details", "noattr": null})
    );
}

#[tokio::test]
async fn test_pagination_bounded_by_max_pages() {
    let site = MockServer::start().await;
    // The next control links back to the same page forever
    mount_page(
        &site,
        "/list",
        r#"<h1>Page</h1><span class="price">9</span><a class="next" href="/list">Next</a>"#,
    )
    .await;

    let app = spawn_app().await;
    let user = app.register("pages@example.com").await;
    let scraper = app
        .create_scraper(&user, paginated(&format!("{}/list", site.uri()), 3))
        .await;

    let (status, body) = app.run(&user, scraper["id"].as_str().unwrap()).await;
    assert_eq!(status, 200);
    let pages = body["data"]["data"].as_array().unwrap();
    assert_eq!(pages.len(), 3);
    assert!(pages.iter().all(|p| p["title"] == "Page" && p["price"] == "9"));
}

#[tokio::test]
async fn test_pagination_stops_when_next_disappears() {
    let site = MockServer::start().await;
    mount_page(&site, "/p1", r#"<h1>First</h1><a class="next" href="/p2">Next</a>"#).await;
    mount_page(&site, "/p2", "<h1>Second</h1>").await;

    let app = spawn_app().await;
    let user = app.register("stop@example.com").await;
    let scraper = app
        .create_scraper(&user, paginated(&format!("{}/p1", site.uri()), 10))
        .await;

    let (status, body) = app.run(&user, scraper["id"].as_str().unwrap()).await;
    assert_eq!(status, 200);
    assert_eq!(
        body["data"]["data"],
        json!([
            {"title": "First", "price": null},
            {"title": "Second", "price": null}
        ])
    );
}

#[tokio::test]
async fn test_pagination_without_next_yields_one_page() {
    let site = MockServer::start().await;
    mount_page(&site, "/only", "<h1>Only</h1>").await;

    let app = spawn_app().await;
    let user = app.register("only@example.com").await;
    let scraper = app
        .create_scraper(&user, paginated(&format!("{}/only", site.uri()), 5))
        .await;

    let (_, body) = app.run(&user, scraper["id"].as_str().unwrap()).await;
    assert_eq!(body["data"]["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_error_status_page_is_still_extracted() {
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(404).set_body_raw("<h1>Not here</h1>", "text/html"),
        )
        .mount(&site)
        .await;

    let app = spawn_app().await;
    let user = app.register("notfound@example.com").await;
    let scraper = app
        .create_scraper(
            &user,
            scraper_body(&site.uri(), json!([{"name": "title", "selector": "h1"}])),
        )
        .await;

    let (status, body) = app.run(&user, scraper["id"].as_str().unwrap()).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["status"], "success");
    assert_eq!(body["data"]["data"], json!({"title": "Not here"}));
}

#[tokio::test]
async fn test_navigation_failure_persists_failed_record() {
    let app = spawn_app().await;
    let user = app.register("fail@example.com").await;
    let scraper = app
        .create_scraper(
            &user,
            scraper_body(&closed_port_url(), json!([{"name": "title", "selector": "h1"}])),
        )
        .await;
    let scraper_id = scraper["id"].as_str().unwrap();

    let (status, body) = app.run(&user, scraper_id).await;
    assert_eq!(status, 500);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Scraping failed");
    assert!(!body["error"].as_str().unwrap().is_empty());
    assert_eq!(body["data"]["status"], "failed");
    assert_eq!(body["data"]["data"], json!({}));

    let owner = app.users.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(owner.usage_count, 1);

    let id: Uuid = scraper_id.parse().unwrap();
    let stored = app.scrapers.find_owned(id, user.id).await.unwrap().unwrap();
    assert!(stored.schedule.last_run.is_none());

    // The failed record is listed with the scraper's data
    let listed: Value = bearer(
        app.server.get(&format!("/api/scrapers/{}/data", scraper_id)),
        &user.token,
    )
    .await
    .json();
    assert_eq!(listed["count"], 1);
    assert_eq!(listed["data"][0]["status"], "failed");
}

#[tokio::test]
async fn test_missing_wait_selector_fails_run() {
    let site = MockServer::start().await;
    mount_page(&site, "/", "<h1>Hello</h1>").await;

    let app = spawn_app().await;
    let user = app.register("wait@example.com").await;
    let scraper = app
        .create_scraper(
            &user,
            json!({
                "name": "Waits",
                "targetUrl": site.uri(),
                "selectors": [{"name": "title", "selector": "h1"}],
                "options": {"waitForSelector": "#app-ready", "timeout": 500}
            }),
        )
        .await;

    let (status, body) = app.run(&user, scraper["id"].as_str().unwrap()).await;
    assert_eq!(status, 500);
    assert_eq!(body["data"]["status"], "failed");
}

#[tokio::test]
async fn test_unreachable_target_and_launch_failure() {
    for driver in [
        Arc::new(UnreachableDriver) as Arc<dyn scrapeflow::engines::traits::BrowserDriver>,
        Arc::new(BrokenDriver),
    ] {
        let app = spawn_app_with_driver(driver).await;
        let user = app.register("driver@example.com").await;
        let scraper = app
            .create_scraper(
                &user,
                scraper_body("https://unreachable.invalid", json!([{"name": "t", "selector": "h1"}])),
            )
            .await;

        let (status, body) = app.run(&user, scraper["id"].as_str().unwrap()).await;
        assert_eq!(status, 500);
        assert_eq!(body["data"]["data"], json!({}));
        assert_eq!(
            app.users.find_by_id(user.id).await.unwrap().unwrap().usage_count,
            1
        );
    }
}

#[tokio::test]
async fn test_run_of_foreign_scraper_is_not_found() {
    let app = spawn_app().await;
    let owner = app.register("mine@example.com").await;
    let other = app.register("theirs@example.com").await;
    let scraper = app
        .create_scraper(
            &owner,
            scraper_body("https://example.com", json!([{"name": "t", "selector": "h1"}])),
        )
        .await;

    let (status, _) = app.run(&other, scraper["id"].as_str().unwrap()).await;
    assert_eq!(status, 404);
    let other_user = app.users.find_by_id(other.id).await.unwrap().unwrap();
    assert_eq!(other_user.usage_count, 0);
}

#[tokio::test]
async fn test_scraped_data_is_paginated_newest_first() {
    let site = MockServer::start().await;
    mount_page(&site, "/", "<h1>Hello</h1>").await;

    let app = spawn_app().await;
    let user = app.register("history@example.com").await;
    let scraper = app
        .create_scraper(
            &user,
            scraper_body(&site.uri(), json!([{"name": "title", "selector": "h1"}])),
        )
        .await;
    let scraper_id = scraper["id"].as_str().unwrap();

    let mut ids = Vec::new();
    for _ in 0..3 {
        let (_, body) = app.run(&user, scraper_id).await;
        ids.push(body["data"]["id"].clone());
    }

    let page: Value = bearer(
        app.server
            .get(&format!("/api/scrapers/{}/data?page=1&limit=2", scraper_id)),
        &user.token,
    )
    .await
    .json();
    assert_eq!(page["count"], 3);
    assert_eq!(page["totalPages"], 2);
    assert_eq!(page["currentPage"], 1);
    assert_eq!(page["data"].as_array().unwrap().len(), 2);
    assert_eq!(page["data"][0]["id"], ids[2]);

    let last: Value = bearer(
        app.server
            .get(&format!("/api/scrapers/{}/data?page=2&limit=2", scraper_id)),
        &user.token,
    )
    .await
    .json();
    assert_eq!(last["data"].as_array().unwrap().len(), 1);
    assert_eq!(last["data"][0]["id"], ids[0]);
}

#[tokio::test]
async fn test_close_failure_keeps_run_result() {
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<h1>Hello</h1>", "text/html"))
        .mount(&site)
        .await;

    let driver = Arc::new(StuckCloseDriver::new());
    let app = spawn_app_with_driver(driver.clone()).await;
    let user = app.register("stuck@example.com").await;
    let scraper = app
        .create_scraper(
            &user,
            scraper_body(&site.uri(), json!([{"name": "title", "selector": "h1"}])),
        )
        .await;
    let scraper_id = scraper["id"].as_str().unwrap();

    let (status, body) = app.run(&user, scraper_id).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["status"], "success");
    assert_eq!(body["data"]["data"], json!({"title": "Hello"}));

    // Failed extraction plus failed close still reports the extraction error
    let update = bearer(app.server.put(&format!("/api/scrapers/{}", scraper_id)), &user.token)
        .json(&json!({
            "name": "Test scraper",
            "targetUrl": site.uri(),
            "selectors": [{"name": "title", "selector": "h1"}],
            "options": {"waitForSelector": ".missing", "timeout": 500}
        }))
        .await;
    assert_eq!(update.status_code(), 200);
    let (status, body) = app.run(&user, scraper_id).await;
    assert_eq!(status, 500);
    assert_eq!(body["message"], "Scraping failed");
    assert!(body["error"].as_str().unwrap().contains(".missing"));

    assert_eq!(driver.close_attempts.load(Ordering::SeqCst), 2);
    assert_eq!(app.sessions.available(), 2);
}

#[tokio::test]
async fn test_session_slots_return_after_every_run() {
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<h1>Hello</h1>", "text/html"))
        .mount(&site)
        .await;

    let app = spawn_app().await;
    let user = app.register("slots@example.com").await;
    let ok = app
        .create_scraper(
            &user,
            scraper_body(&site.uri(), json!([{"name": "title", "selector": "h1"}])),
        )
        .await;
    let down = app
        .create_scraper(
            &user,
            scraper_body(&closed_port_url(), json!([{"name": "title", "selector": "h1"}])),
        )
        .await;
    assert_eq!(app.sessions.available(), 2);

    for _ in 0..3 {
        assert_eq!(app.run(&user, ok["id"].as_str().unwrap()).await.0, 200);
        assert_eq!(app.sessions.available(), 2);
        assert_eq!(app.run(&user, down["id"].as_str().unwrap()).await.0, 500);
        assert_eq!(app.sessions.available(), 2);
    }

    let broken = spawn_app_with_driver(Arc::new(BrokenDriver)).await;
    let user = broken.register("slots-broken@example.com").await;
    let scraper = broken
        .create_scraper(
            &user,
            scraper_body(&site.uri(), json!([{"name": "title", "selector": "h1"}])),
        )
        .await;
    for _ in 0..3 {
        assert_eq!(broken.run(&user, scraper["id"].as_str().unwrap()).await.0, 500);
    }
    assert_eq!(broken.sessions.available(), 2);
}
