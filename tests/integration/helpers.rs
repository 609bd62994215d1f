// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use axum::http::{HeaderName, HeaderValue};
use axum_test::{TestRequest, TestServer};
use migration::{Migrator, MigratorTrait};
use scrapeflow::application::use_cases::run_scraper::RunScraperUseCase;
use scrapeflow::config::settings::DatabaseSettings;
use scrapeflow::domain::services::auth_service::AuthService;
use scrapeflow::domain::services::webhook_service::WebhookService;
use scrapeflow::engines::http_driver::HttpDriver;
use scrapeflow::engines::session_pool::SessionPool;
use scrapeflow::engines::traits::{
    BrowserDriver, BrowserSession, DriverError, ElementProbe, SessionOptions,
};
use scrapeflow::infrastructure::database::connection;
use scrapeflow::infrastructure::database::entities::users as user_entity;
use scrapeflow::infrastructure::repositories::scrape_record_repo_impl::ScrapeRecordRepositoryImpl;
use scrapeflow::infrastructure::repositories::scraper_repo_impl::ScraperRepositoryImpl;
use scrapeflow::infrastructure::repositories::user_repo_impl::UserRepositoryImpl;
use scrapeflow::infrastructure::services::webhook_service_impl::WebhookServiceImpl;
use scrapeflow::presentation::routes::{self, ApiContext, ScrapeRunner};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

#[allow(dead_code)]
pub struct TestApp {
    pub server: TestServer,
    pub db: Arc<DatabaseConnection>,
    pub users: Arc<UserRepositoryImpl>,
    pub scrapers: Arc<ScraperRepositoryImpl>,
    pub records: Arc<ScrapeRecordRepositoryImpl>,
    pub runner: Arc<ScrapeRunner>,
    pub sessions: SessionPool,
    pub auth: AuthService,
}

/// 已注册的测试用户
#[allow(dead_code)]
pub struct TestUser {
    pub id: Uuid,
    pub token: String,
    pub api_key: String,
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with_driver(Arc::new(HttpDriver)).await
}

pub async fn spawn_app_with_driver(driver: Arc<dyn BrowserDriver>) -> TestApp {
    let settings = DatabaseSettings {
        url: "sqlite::memory:".to_string(),
        max_connections: None,
        min_connections: None,
        connect_timeout: Some(5),
        idle_timeout: None,
    };
    let db = Arc::new(connection::create_pool(&settings).await.unwrap());
    Migrator::up(db.as_ref(), None).await.unwrap();

    let users = Arc::new(UserRepositoryImpl::new(db.clone()));
    let scrapers = Arc::new(ScraperRepositoryImpl::new(db.clone()));
    let records = Arc::new(ScrapeRecordRepositoryImpl::new(db.clone()));
    let auth = AuthService::new("test-token-secret", 3600, 100).with_password_iterations(1_000);
    let notifier: Arc<dyn WebhookService> = Arc::new(WebhookServiceImpl::new(
        "test-webhook-secret".to_string(),
        Duration::from_secs(2),
    ));

    let sessions = SessionPool::new(driver, 2);
    let runner = Arc::new(RunScraperUseCase::new(
        users.clone(),
        scrapers.clone(),
        records.clone(),
        sessions.clone(),
        notifier,
    ));

    let app = routes::routes(ApiContext {
        users: users.clone(),
        scrapers: scrapers.clone(),
        records: records.clone(),
        runner: runner.clone(),
        auth: auth.clone(),
    });

    TestApp {
        server: TestServer::new(app).unwrap(),
        db,
        users,
        scrapers,
        records,
        runner,
        sessions,
        auth,
    }
}

pub fn bearer(request: TestRequest, token: &str) -> TestRequest {
    request.add_header(
        HeaderName::from_static("authorization"),
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    )
}

pub fn api_key(request: TestRequest, key: &str) -> TestRequest {
    request.add_header(
        HeaderName::from_static("x-api-key"),
        HeaderValue::from_str(key).unwrap(),
    )
}

impl TestApp {
    pub async fn register(&self, email: &str) -> TestUser {
        let response = self
            .server
            .post("/api/auth/register")
            .json(&json!({
                "name": "Test User",
                "email": email,
                "password": "password123"
            }))
            .await;
        assert_eq!(response.status_code(), 201, "{}", response.text());

        let body: Value = response.json();
        TestUser {
            id: body["user"]["id"].as_str().unwrap().parse().unwrap(),
            token: body["token"].as_str().unwrap().to_string(),
            api_key: body["user"]["apiKey"].as_str().unwrap().to_string(),
        }
    }

    /// 创建抓取器并返回响应中的 `data`
    pub async fn create_scraper(&self, user: &TestUser, body: Value) -> Value {
        let response = bearer(self.server.post("/api/scrapers"), &user.token)
            .json(&body)
            .await;
        assert_eq!(response.status_code(), 201, "{}", response.text());
        response.json::<Value>()["data"].clone()
    }

    pub async fn run(&self, user: &TestUser, scraper_id: &str) -> (u16, Value) {
        let response = bearer(
            self.server
                .post(&format!("/api/scrapers/{}/run", scraper_id)),
            &user.token,
        )
        .await;
        (response.status_code().as_u16(), response.json())
    }

    pub async fn set_usage(&self, user_id: Uuid, count: i64, limit: i64) {
        user_entity::Entity::update_many()
            .col_expr(user_entity::Column::UsageCount, Expr::value(count))
            .col_expr(user_entity::Column::UsageLimit, Expr::value(limit))
            .filter(user_entity::Column::Id.eq(user_id))
            .exec(self.db.as_ref())
            .await
            .unwrap();
    }
}

/// 返回一个没有任何进程监听的本地地址
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/", listener.local_addr().unwrap());
    drop(listener);
    url
}

pub fn scraper_body(target_url: &str, selectors: Value) -> Value {
    json!({
        "name": "Test scraper",
        "targetUrl": target_url,
        "selectors": selectors,
    })
}

/// 统计启动次数的 HTTP 驱动
pub struct CountingDriver {
    inner: HttpDriver,
    pub launches: Arc<AtomicUsize>,
}

impl CountingDriver {
    pub fn new() -> Self {
        Self {
            inner: HttpDriver,
            launches: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl BrowserDriver for CountingDriver {
    async fn launch(
        &self,
        options: &SessionOptions,
    ) -> Result<Box<dyn BrowserSession>, DriverError> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        self.inner.launch(options).await
    }

    fn name(&self) -> &'static str {
        "counting"
    }
}

/// 无法导航的驱动
pub struct UnreachableDriver;

struct UnreachableSession;

#[async_trait]
impl BrowserDriver for UnreachableDriver {
    async fn launch(
        &self,
        _options: &SessionOptions,
    ) -> Result<Box<dyn BrowserSession>, DriverError> {
        Ok(Box::new(UnreachableSession))
    }

    fn name(&self) -> &'static str {
        "unreachable"
    }
}

#[async_trait]
impl BrowserSession for UnreachableSession {
    async fn goto(&mut self, url: &str) -> Result<(), DriverError> {
        Err(DriverError::Navigation(format!(
            "net::ERR_NAME_NOT_RESOLVED at {}",
            url
        )))
    }

    async fn wait_for_selector(&mut self, selector: &str) -> Result<(), DriverError> {
        Err(DriverError::ElementNotFound(selector.to_string()))
    }

    async fn query(
        &mut self,
        _selector: &str,
        _probe: &ElementProbe,
    ) -> Result<Option<String>, DriverError> {
        Ok(None)
    }

    async fn exists(&mut self, _selector: &str) -> Result<bool, DriverError> {
        Ok(false)
    }

    async fn click_and_wait(&mut self, selector: &str) -> Result<(), DriverError> {
        Err(DriverError::ElementNotFound(selector.to_string()))
    }

    fn current_url(&self) -> Option<String> {
        None
    }

    async fn close(self: Box<Self>) -> Result<(), DriverError> {
        Ok(())
    }
}

/// 启动即失败的驱动
pub struct BrokenDriver;

#[async_trait]
impl BrowserDriver for BrokenDriver {
    async fn launch(
        &self,
        _options: &SessionOptions,
    ) -> Result<Box<dyn BrowserSession>, DriverError> {
        Err(DriverError::Launch("browser binary not found".to_string()))
    }

    fn name(&self) -> &'static str {
        "broken"
    }
}

/// 会话关闭总是失败的 HTTP 驱动
pub struct StuckCloseDriver {
    inner: HttpDriver,
    pub close_attempts: Arc<AtomicUsize>,
}

impl StuckCloseDriver {
    pub fn new() -> Self {
        Self {
            inner: HttpDriver,
            close_attempts: Arc::new(AtomicUsize::new(0)),
        }
    }
}

struct StuckCloseSession {
    inner: Box<dyn BrowserSession>,
    close_attempts: Arc<AtomicUsize>,
}

#[async_trait]
impl BrowserDriver for StuckCloseDriver {
    async fn launch(
        &self,
        options: &SessionOptions,
    ) -> Result<Box<dyn BrowserSession>, DriverError> {
        let inner = self.inner.launch(options).await?;
        Ok(Box::new(StuckCloseSession {
            inner,
            close_attempts: self.close_attempts.clone(),
        }))
    }

    fn name(&self) -> &'static str {
        "stuck-close"
    }
}

#[async_trait]
impl BrowserSession for StuckCloseSession {
    async fn goto(&mut self, url: &str) -> Result<(), DriverError> {
        self.inner.goto(url).await
    }

    async fn wait_for_selector(&mut self, selector: &str) -> Result<(), DriverError> {
        self.inner.wait_for_selector(selector).await
    }

    async fn query(
        &mut self,
        selector: &str,
        probe: &ElementProbe,
    ) -> Result<Option<String>, DriverError> {
        self.inner.query(selector, probe).await
    }

    async fn exists(&mut self, selector: &str) -> Result<bool, DriverError> {
        self.inner.exists(selector).await
    }

    async fn click_and_wait(&mut self, selector: &str) -> Result<(), DriverError> {
        self.inner.click_and_wait(selector).await
    }

    fn current_url(&self) -> Option<String> {
        self.inner.current_url()
    }

    async fn close(self: Box<Self>) -> Result<(), DriverError> {
        self.close_attempts.fetch_add(1, Ordering::SeqCst);
        Err(DriverError::Other("browser process did not exit".to_string()))
    }
}
