// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::RepositoryError;
use crate::domain::models::scrape_record::ScrapeRecord;
use async_trait::async_trait;
use uuid::Uuid;

/// 抓取记录仓库特质
#[async_trait]
pub trait ScrapeRecordRepository: Send + Sync {
    /// 保存一条抓取记录
    async fn save(&self, record: &ScrapeRecord) -> Result<ScrapeRecord, RepositoryError>;

    /// 查找属于指定用户的记录
    async fn find_owned(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ScrapeRecord>, RepositoryError>;

    /// 分页列出抓取器的记录，按创建时间倒序
    ///
    /// # 参数
    ///
    /// * `scraper_id` - 抓取器ID
    /// * `page` - 页码，从 1 开始
    /// * `limit` - 每页条数
    ///
    /// # 返回值
    ///
    /// * `Ok((Vec<ScrapeRecord>, u64))` - 当前页记录与总条数
    async fn list_by_scraper(
        &self,
        scraper_id: Uuid,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<ScrapeRecord>, u64), RepositoryError>;

    /// 列出抓取器的成功记录，按创建时间正序
    async fn successful_by_scraper(
        &self,
        scraper_id: Uuid,
    ) -> Result<Vec<ScrapeRecord>, RepositoryError>;
}
