// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::use_cases::run_scraper::RunScraperUseCase;
use crate::domain::repositories::{
    scrape_record_repository::ScrapeRecordRepository, scraper_repository::ScraperRepository,
    user_repository::UserRepository,
};
use crate::utils::errors::WorkerError;
use crate::workers::worker::Worker;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

/// 定时调度工作器
///
/// 每个周期加载启用了调度的抓取器，按频率判断是否到期，
/// 到期且所有者仍有额度时通过同一个运行用例执行
pub struct ScheduleWorker<U, S, R>
where
    U: UserRepository + 'static,
    S: ScraperRepository + 'static,
    R: ScrapeRecordRepository + 'static,
{
    runner: Arc<RunScraperUseCase<U, S, R>>,
    users: Arc<U>,
    scrapers: Arc<S>,
    interval: Duration,
}

impl<U, S, R> ScheduleWorker<U, S, R>
where
    U: UserRepository + 'static,
    S: ScraperRepository + 'static,
    R: ScrapeRecordRepository + 'static,
{
    /// 创建调度工作器
    ///
    /// # 参数
    ///
    /// * `runner` - 抓取运行用例
    /// * `users` - 用户仓库，用于额度检查
    /// * `scrapers` - 抓取器仓库
    /// * `interval` - 扫描间隔
    pub fn new(
        runner: Arc<RunScraperUseCase<U, S, R>>,
        users: Arc<U>,
        scrapers: Arc<S>,
        interval: Duration,
    ) -> Self {
        Self {
            runner,
            users,
            scrapers,
            interval: interval.max(Duration::from_secs(1)),
        }
    }

    /// 执行一轮调度
    ///
    /// # 参数
    ///
    /// * `now` - 判断到期所用的时间
    ///
    /// # 返回值
    ///
    /// * `Ok(usize)` - 本轮触发的运行次数（含失败的运行）
    /// * `Err(WorkerError)` - 加载调度列表失败
    pub async fn run_due(&self, now: DateTime<Utc>) -> Result<usize, WorkerError> {
        let scheduled = self.scrapers.find_scheduled().await?;
        let mut triggered = 0;

        for scraper in scheduled.iter().filter(|s| s.schedule.is_due(now)) {
            let owner = match self.users.find_by_id(scraper.user_id).await {
                Ok(Some(owner)) => owner,
                Ok(None) => {
                    warn!(scraper_id = %scraper.id, "Owner of scheduled scraper not found");
                    continue;
                }
                Err(e) => {
                    error!(scraper_id = %scraper.id, "Failed to load owner: {}", e);
                    continue;
                }
            };

            if !owner.has_quota() {
                warn!(
                    scraper_id = %scraper.id,
                    "Skipping scheduled run: usage limit {} reached",
                    owner.usage_limit
                );
                continue;
            }

            triggered += 1;
            match self.runner.execute(scraper).await {
                Ok(outcome) if outcome.is_success() => {
                    info!(scraper_id = %scraper.id, "Scheduled run succeeded");
                }
                Ok(outcome) => {
                    warn!(
                        scraper_id = %scraper.id,
                        "Scheduled run failed: {}",
                        outcome.record().error.as_deref().unwrap_or("unknown error")
                    );
                }
                Err(e) => {
                    error!(scraper_id = %scraper.id, "Scheduled run aborted: {}", e);
                }
            }
        }

        Ok(triggered)
    }

    /// 启动后台运行
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            if let Err(e) = Worker::run(&self).await {
                error!("{} stopped: {}", self.name(), e);
            }
        })
    }
}

#[async_trait]
impl<U, S, R> Worker for ScheduleWorker<U, S, R>
where
    U: UserRepository + 'static,
    S: ScraperRepository + 'static,
    R: ScrapeRecordRepository + 'static,
{
    async fn run(&self) -> Result<(), WorkerError> {
        info!("Schedule worker started, tick every {:?}", self.interval);

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;

            match self.run_due(Utc::now()).await {
                Ok(count) => {
                    if count > 0 {
                        info!("Triggered {} scheduled runs", count);
                    }
                }
                Err(e) => {
                    error!("Failed to load scheduled scrapers: {}", e);
                }
            }
        }
    }

    fn name(&self) -> &str {
        "schedule_worker"
    }
}
