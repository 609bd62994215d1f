// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::RepositoryError;
use crate::domain::models::scraper::Scraper;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// 抓取器仓库特质
///
/// 所有按用户读取的方法都同时校验归属，不属于该用户的抓取器按不存在处理
#[async_trait]
pub trait ScraperRepository: Send + Sync {
    /// 创建抓取器
    async fn create(&self, scraper: &Scraper) -> Result<Scraper, RepositoryError>;

    /// 查找属于指定用户的抓取器
    ///
    /// # 参数
    ///
    /// * `id` - 抓取器ID
    /// * `user_id` - 调用方用户ID
    ///
    /// # 返回值
    ///
    /// * `Ok(Some(Scraper))` - 存在且归属调用方
    /// * `Ok(None)` - 不存在或属于其他用户
    async fn find_owned(&self, id: Uuid, user_id: Uuid)
        -> Result<Option<Scraper>, RepositoryError>;

    /// 列出用户的全部抓取器，按创建时间倒序
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Scraper>, RepositoryError>;

    /// 全量更新可编辑字段
    async fn update(&self, scraper: &Scraper) -> Result<Scraper, RepositoryError>;

    /// 删除属于指定用户的抓取器及其全部抓取记录
    ///
    /// # 返回值
    ///
    /// * `Ok(true)` - 已删除
    /// * `Ok(false)` - 不存在或属于其他用户
    async fn delete_owned(&self, id: Uuid, user_id: Uuid) -> Result<bool, RepositoryError>;

    /// 记录最近一次成功运行时间
    async fn touch_last_run(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), RepositoryError>;

    /// 列出启用了调度的抓取器
    async fn find_scheduled(&self) -> Result<Vec<Scraper>, RepositoryError>;
}
