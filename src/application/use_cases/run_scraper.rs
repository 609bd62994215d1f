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

use crate::{
    domain::{
        models::{
            scrape_record::{Extraction, ScrapeRecord},
            scraper::{InvalidScraper, Scraper},
            webhook::{WebhookDelivery, WebhookPayload},
        },
        repositories::{
            scrape_record_repository::ScrapeRecordRepository,
            scraper_repository::ScraperRepository, user_repository::UserRepository,
            RepositoryError,
        },
        services::{extraction_service::ExtractionService, webhook_service::WebhookService},
    },
    engines::{
        session_pool::SessionPool,
        traits::{BrowserSession, DriverError, SessionOptions},
    },
};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunScraperError {
    #[error("{0}")]
    Invalid(#[from] InvalidScraper),
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// 一次运行的结果
///
/// 两种结果都已持久化
#[derive(Debug, Clone)]
pub enum RunOutcome {
    Succeeded(ScrapeRecord),
    Failed(ScrapeRecord),
}

impl RunOutcome {
    pub fn record(&self) -> &ScrapeRecord {
        match self {
            RunOutcome::Succeeded(record) | RunOutcome::Failed(record) => record,
        }
    }

    pub fn into_record(self) -> ScrapeRecord {
        match self {
            RunOutcome::Succeeded(record) | RunOutcome::Failed(record) => record,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Succeeded(_))
    }
}

/// 抓取任务执行用例
///
/// 状态流转：Idle → Launching → Navigating → Waiting → Extracting →
/// Persisting → Notifying → Done；Launching 到 Extracting 之间的任何失败
/// 都进入 Failed 并持久化一条失败记录，不重试
pub struct RunScraperUseCase<U, S, R> {
    users: Arc<U>,
    scrapers: Arc<S>,
    records: Arc<R>,
    sessions: SessionPool,
    notifier: Arc<dyn WebhookService>,
    user_agent: Option<String>,
}

impl<U, S, R> RunScraperUseCase<U, S, R>
where
    U: UserRepository + 'static,
    S: ScraperRepository + 'static,
    R: ScrapeRecordRepository + 'static,
{
    pub fn new(
        users: Arc<U>,
        scrapers: Arc<S>,
        records: Arc<R>,
        sessions: SessionPool,
        notifier: Arc<dyn WebhookService>,
    ) -> Self {
        Self {
            users,
            scrapers,
            records,
            sessions,
            notifier,
            user_agent: None,
        }
    }

    pub fn with_user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent;
        self
    }

    /// 执行一次抓取
    ///
    /// # 参数
    ///
    /// * `scraper` - 调用方拥有的抓取器配置
    ///
    /// # 返回值
    ///
    /// * `Ok(RunOutcome)` - 已持久化的成功或失败记录
    /// * `Err(RunScraperError::Invalid)` - 配置不合法，未产生任何副作用
    /// * `Err(RunScraperError::Repository)` - 计数或持久化失败
    pub async fn execute(&self, scraper: &Scraper) -> Result<RunOutcome, RunScraperError> {
        scraper.validate()?;

        // Counted once per invocation regardless of outcome
        self.users.increment_usage(scraper.user_id).await?;

        let started = Instant::now();
        tracing::debug!(scraper_id = %scraper.id, "Idle -> Launching");
        let options = SessionOptions {
            timeout: scraper.options.call_timeout(),
            user_agent: self.user_agent.clone(),
        };

        let result = match self.sessions.acquire(&options).await {
            Ok(mut session) => {
                let result = Self::navigate_and_extract(session.page(), scraper).await;
                let elapsed = started.elapsed();
                if let Err(e) = session.release().await {
                    tracing::warn!(scraper_id = %scraper.id, "Failed to release session: {}", e);
                }
                result.map(|extraction| (extraction, elapsed))
            }
            Err(e) => Err(e),
        };

        let elapsed_ms = |d: std::time::Duration| i64::try_from(d.as_millis()).unwrap_or(i64::MAX);

        let record = match result {
            Ok((extraction, elapsed)) => ScrapeRecord::success(
                scraper.id,
                scraper.user_id,
                scraper.target_url.clone(),
                extraction,
                elapsed_ms(elapsed),
            ),
            Err(e) => {
                tracing::warn!(scraper_id = %scraper.id, "Scrape failed: {}", e);
                ScrapeRecord::failure(
                    scraper.id,
                    scraper.user_id,
                    scraper.target_url.clone(),
                    e.to_string(),
                    elapsed_ms(started.elapsed()),
                )
            }
        };

        tracing::debug!(scraper_id = %scraper.id, "-> Persisting");
        let saved = self.records.save(&record).await?;
        self.observe(&saved);

        if !saved.is_success() {
            return Ok(RunOutcome::Failed(saved));
        }

        if let Err(e) = self.scrapers.touch_last_run(scraper.id, Utc::now()).await {
            tracing::warn!(scraper_id = %scraper.id, "Failed to update last run: {}", e);
        }
        self.notify(scraper, &saved);

        tracing::debug!(scraper_id = %scraper.id, "-> Done");
        Ok(RunOutcome::Succeeded(saved))
    }

    async fn navigate_and_extract(
        page: &mut dyn BrowserSession,
        scraper: &Scraper,
    ) -> Result<Extraction, DriverError> {
        tracing::debug!(scraper_id = %scraper.id, "Launching -> Navigating {}", scraper.target_url);
        page.goto(&scraper.target_url).await?;

        if let Some(selector) = scraper.options.wait_selector() {
            tracing::debug!(scraper_id = %scraper.id, "Navigating -> Waiting for {}", selector);
            page.wait_for_selector(selector).await?;
        }

        tracing::debug!(scraper_id = %scraper.id, "-> Extracting");
        Ok(ExtractionService::extract(page, &scraper.selectors, &scraper.options.pagination).await)
    }

    /// 成功后异步投递 Webhook，失败只记录日志
    fn notify(&self, scraper: &Scraper, record: &ScrapeRecord) {
        let Some(url) = scraper.webhook.target() else {
            return;
        };
        tracing::debug!(scraper_id = %scraper.id, "-> Notifying {}", url);

        let delivery = WebhookDelivery {
            url: url.to_string(),
            payload: WebhookPayload::for_record(record),
        };
        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.send_webhook(&delivery).await {
                tracing::warn!("Webhook delivery to {} failed: {}", delivery.url, e);
            }
        });
    }

    fn observe(&self, record: &ScrapeRecord) {
        metrics::counter!("scrape_jobs_total", "status" => record.status.to_string()).increment(1);
        metrics::histogram!("scrape_job_duration_seconds")
            .record(record.execution_time_ms as f64 / 1000.0);
        if record.is_success() {
            metrics::counter!("scrape_pages_total").increment(record.payload.page_count() as u64);
        }
    }
}
