// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{bearer, scraper_body, spawn_app};
use axum::body::Bytes;
use scrapeflow::domain::models::scrape_record::{Extraction, Record, ScrapeRecord};
use scrapeflow::domain::repositories::scrape_record_repository::ScrapeRecordRepository;
use serde_json::{json, Value};
use uuid::Uuid;

#[tokio::test]
async fn test_create_applies_defaults() {
    let app = spawn_app().await;
    let user = app.register("crud@example.com").await;

    let scraper = app
        .create_scraper(
            &user,
            scraper_body("https://example.com", json!([{"name": "title", "selector": "h1"}])),
        )
        .await;

    assert_eq!(scraper["name"], "Test scraper");
    assert_eq!(scraper["selectors"][0]["type"], "text");
    assert_eq!(scraper["options"]["timeout"], 30000);
    assert_eq!(scraper["options"]["pagination"]["enabled"], false);
    assert_eq!(scraper["options"]["pagination"]["maxPages"], 1);
    assert_eq!(scraper["webhook"]["active"], false);
    assert_eq!(scraper["schedule"]["frequency"], "once");
    assert_eq!(scraper["userId"], user.id.to_string());
}

#[tokio::test]
async fn test_create_rejects_invalid_config() {
    let app = spawn_app().await;
    let user = app.register("invalid@example.com").await;

    let response = bearer(app.server.post("/api/scrapers"), &user.token)
        .json(&json!({"name": "x", "targetUrl": "ftp://example.com", "selectors": []}))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    let errors = body["errors"].as_array().unwrap();
    assert!(errors.iter().any(|e| e["field"] == "targetUrl"
        && e["message"] == "Valid target URL is required"));
    assert!(errors.iter().any(|e| e["field"] == "selectors"
        && e["message"] == "At least one selector is required"));

    let list: Value = bearer(app.server.get("/api/scrapers"), &user.token)
        .await
        .json();
    assert_eq!(list["count"], 0);
}

#[tokio::test]
async fn test_create_rejects_blank_name() {
    let app = spawn_app().await;
    let user = app.register("blank@example.com").await;

    let mut body = scraper_body("https://example.com", json!([{"name": "t", "selector": "h1"}]));
    body["name"] = json!("   ");
    let response = bearer(app.server.post("/api/scrapers"), &user.token)
        .json(&body)
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(
        body["errors"],
        json!([{"field": "name", "message": "Name is required"}])
    );
}

#[tokio::test]
async fn test_undecodable_body_uses_error_envelope() {
    let app = spawn_app().await;
    let user = app.register("decode@example.com").await;

    let unknown_kind = bearer(app.server.post("/api/scrapers"), &user.token)
        .json(&scraper_body(
            "https://example.com",
            json!([{"name": "t", "selector": "//h1", "type": "xpath"}]),
        ))
        .await;
    assert_eq!(unknown_kind.status_code(), 400);
    let body: Value = unknown_kind.json();
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("xpath"));

    let malformed = bearer(app.server.post("/api/scrapers"), &user.token)
        .bytes(Bytes::from_static(b"{\"name\": "))
        .content_type("application/json")
        .await;
    assert_eq!(malformed.status_code(), 400);
    assert_eq!(malformed.json::<Value>()["success"], false);

    let login = app
        .server
        .post("/api/auth/login")
        .bytes(Bytes::from_static(b"not json"))
        .content_type("application/json")
        .await;
    assert_eq!(login.status_code(), 400);
    assert_eq!(login.json::<Value>()["success"], false);

    let list: Value = bearer(app.server.get("/api/scrapers"), &user.token)
        .await
        .json();
    assert_eq!(list["count"], 0);
}

#[tokio::test]
async fn test_list_is_newest_first_and_scoped_to_owner() {
    let app = spawn_app().await;
    let owner = app.register("owner@example.com").await;
    let other = app.register("other@example.com").await;

    let selectors = json!([{"name": "title", "selector": "h1"}]);
    let first = app
        .create_scraper(&owner, scraper_body("https://a.example.com", selectors.clone()))
        .await;
    let second = app
        .create_scraper(&owner, scraper_body("https://b.example.com", selectors))
        .await;

    let list: Value = bearer(app.server.get("/api/scrapers"), &owner.token)
        .await
        .json();
    assert_eq!(list["count"], 2);
    assert_eq!(list["data"][0]["id"], second["id"]);
    assert_eq!(list["data"][1]["id"], first["id"]);

    let foreign: Value = bearer(app.server.get("/api/scrapers"), &other.token)
        .await
        .json();
    assert_eq!(foreign["count"], 0);

    let path = format!("/api/scrapers/{}", first["id"].as_str().unwrap());
    let response = bearer(app.server.get(&path), &other.token).await;
    assert_eq!(response.status_code(), 404);
    assert_eq!(response.json::<Value>()["message"], "Scraper not found");
}

#[tokio::test]
async fn test_update_replaces_editable_fields() {
    let app = spawn_app().await;
    let user = app.register("update@example.com").await;
    let scraper = app
        .create_scraper(
            &user,
            scraper_body("https://example.com", json!([{"name": "title", "selector": "h1"}])),
        )
        .await;
    let path = format!("/api/scrapers/{}", scraper["id"].as_str().unwrap());

    let response = bearer(app.server.put(&path), &user.token)
        .json(&json!({
            "name": "Renamed",
            "targetUrl": "https://example.org/list",
            "selectors": [
                {"name": "link", "selector": "a", "type": "attribute", "attribute": "href"}
            ],
            "schedule": {"active": true, "frequency": "hourly"}
        }))
        .await;
    assert_eq!(response.status_code(), 200);

    let fetched: Value = bearer(app.server.get(&path), &user.token).await.json();
    let data = &fetched["data"];
    assert_eq!(data["name"], "Renamed");
    assert_eq!(data["targetUrl"], "https://example.org/list");
    assert_eq!(data["selectors"].as_array().unwrap().len(), 1);
    assert_eq!(data["selectors"][0]["attribute"], "href");
    assert_eq!(data["schedule"]["active"], true);
    assert_eq!(data["schedule"]["frequency"], "hourly");
    assert_eq!(data["createdAt"], scraper["createdAt"]);

    let invalid = bearer(app.server.put(&path), &user.token)
        .json(&json!({"name": "  ", "targetUrl": "https://example.org", "selectors": [{"name": "a", "selector": "a"}]}))
        .await;
    assert_eq!(invalid.status_code(), 400);
}

#[tokio::test]
async fn test_update_and_delete_of_missing_scraper() {
    let app = spawn_app().await;
    let user = app.register("missing@example.com").await;
    let path = format!("/api/scrapers/{}", Uuid::new_v4());

    let update = bearer(app.server.put(&path), &user.token)
        .json(&scraper_body("https://example.com", json!([{"name": "t", "selector": "h1"}])))
        .await;
    assert_eq!(update.status_code(), 404);

    let delete = bearer(app.server.delete(&path), &user.token).await;
    assert_eq!(delete.status_code(), 404);
}

#[tokio::test]
async fn test_delete_cascades_to_records() {
    let app = spawn_app().await;
    let user = app.register("cascade@example.com").await;
    let scraper = app
        .create_scraper(
            &user,
            scraper_body("https://example.com", json!([{"name": "title", "selector": "h1"}])),
        )
        .await;
    let scraper_id: Uuid = scraper["id"].as_str().unwrap().parse().unwrap();

    let mut ids = Vec::new();
    for title in ["one", "two", "three"] {
        let mut row = Record::new();
        row.insert("title".into(), json!(title));
        let record = ScrapeRecord::success(
            scraper_id,
            user.id,
            "https://example.com",
            Extraction::Single(row),
            12,
        );
        ids.push(app.records.save(&record).await.unwrap().id);
    }
    let (_, total) = app.records.list_by_scraper(scraper_id, 1, 10).await.unwrap();
    assert_eq!(total, 3);

    let path = format!("/api/scrapers/{}", scraper_id);
    let response = bearer(app.server.delete(&path), &user.token).await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.json::<Value>()["data"], json!({}));

    let (records, total) = app.records.list_by_scraper(scraper_id, 1, 10).await.unwrap();
    assert!(records.is_empty());
    assert_eq!(total, 0);
    for id in ids {
        assert!(app.records.find_owned(id, user.id).await.unwrap().is_none());
    }

    let gone = bearer(app.server.get(&path), &user.token).await;
    assert_eq!(gone.status_code(), 404);
}
