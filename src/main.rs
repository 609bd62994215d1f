// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use scrapeflow::application::use_cases::run_scraper::RunScraperUseCase;
use scrapeflow::config::settings::{DriverKind, Settings};
use scrapeflow::domain::services::auth_service::AuthService;
use scrapeflow::domain::services::webhook_service::WebhookService;
use scrapeflow::engines::chromium_driver::ChromiumDriver;
use scrapeflow::engines::http_driver::HttpDriver;
use scrapeflow::engines::session_pool::SessionPool;
use scrapeflow::engines::traits::BrowserDriver;
use scrapeflow::infrastructure::database::connection;
use scrapeflow::infrastructure::repositories::scrape_record_repo_impl::ScrapeRecordRepositoryImpl;
use scrapeflow::infrastructure::repositories::scraper_repo_impl::ScraperRepositoryImpl;
use scrapeflow::infrastructure::repositories::user_repo_impl::UserRepositoryImpl;
use scrapeflow::infrastructure::services::webhook_service_impl::WebhookServiceImpl;
use scrapeflow::presentation::routes::{self, ApiContext};
use scrapeflow::workers::schedule_worker::ScheduleWorker;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;

use migration::{Migrator, MigratorTrait};
use scrapeflow::utils::telemetry;

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting scrapeflow...");

    // 2. Load configuration
    let settings = Arc::new(Settings::new()?);
    info!("Configuration loaded");

    scrapeflow::infrastructure::metrics::init_metrics(&settings.metrics);

    // 3. Connect to database
    let db = connection::create_pool(&settings.database).await?;
    let db = Arc::new(db);
    info!("Database connection established");

    info!("Running database migrations...");
    Migrator::up(db.as_ref(), None).await?;
    info!("Database migrations applied");

    // 4. Repositories and services
    let users = Arc::new(UserRepositoryImpl::new(db.clone()));
    let scrapers = Arc::new(ScraperRepositoryImpl::new(db.clone()));
    let records = Arc::new(ScrapeRecordRepositoryImpl::new(db.clone()));

    let auth = AuthService::new(
        settings.auth.token_secret.clone(),
        settings.auth.token_ttl_secs,
        settings.auth.default_usage_limit,
    )
    .with_password_iterations(settings.auth.password_iterations);
    let notifier: Arc<dyn WebhookService> = Arc::new(WebhookServiceImpl::new(
        settings.webhook.secret.clone(),
        Duration::from_secs(settings.webhook.timeout_secs),
    ));

    // 5. Browser driver
    let driver: Arc<dyn BrowserDriver> = match settings.browser.driver {
        DriverKind::Chromium => Arc::new(ChromiumDriver::new(
            settings.browser.headless,
            settings.browser.remote_debugging_url.clone(),
        )),
        DriverKind::Http => Arc::new(HttpDriver),
    };
    let sessions = SessionPool::new(driver, settings.browser.max_concurrent_sessions);
    info!(
        "Browser driver {} ready ({} concurrent sessions)",
        sessions.driver_name(),
        sessions.available()
    );

    let runner = Arc::new(
        RunScraperUseCase::new(
            users.clone(),
            scrapers.clone(),
            records.clone(),
            sessions,
            notifier,
        )
        .with_user_agent(settings.browser.user_agent.clone()),
    );

    // 6. Start workers
    let scheduler = if settings.scheduler.enabled {
        let worker = ScheduleWorker::new(
            runner.clone(),
            users.clone(),
            scrapers.clone(),
            Duration::from_secs(settings.scheduler.tick_secs),
        );
        Some(worker.start())
    } else {
        info!("Schedule worker disabled");
        None
    };

    // 7. Start HTTP server
    let app = routes::routes(ApiContext {
        users,
        scrapers,
        records,
        runner,
        auth,
    });

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = scheduler {
        handle.abort();
    }
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
