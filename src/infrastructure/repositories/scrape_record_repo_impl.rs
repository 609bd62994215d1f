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

use crate::domain::models::scrape_record::{RecordStatus, ScrapeRecord};
use crate::domain::repositories::scrape_record_repository::ScrapeRecordRepository;
use crate::domain::repositories::RepositoryError;
use crate::infrastructure::database::entities::scrape_records as record_entity;
use async_trait::async_trait;
use sea_orm::*;
use std::sync::Arc;
use uuid::Uuid;

/// 抓取记录仓库实现
pub struct ScrapeRecordRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl ScrapeRecordRepositoryImpl {
    /// 创建新的抓取记录仓库实例
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    fn to_domain(model: record_entity::Model) -> Result<ScrapeRecord, RepositoryError> {
        Ok(ScrapeRecord {
            id: model.id,
            scraper_id: model.scraper_id,
            user_id: model.user_id,
            url: model.url,
            payload: serde_json::from_value(model.payload)?,
            status: model.status.parse().unwrap_or(RecordStatus::Failed),
            error: model.error,
            execution_time_ms: model.execution_time_ms,
            created_at: model.created_at.into(),
        })
    }
}

#[async_trait]
impl ScrapeRecordRepository for ScrapeRecordRepositoryImpl {
    async fn save(&self, record: &ScrapeRecord) -> Result<ScrapeRecord, RepositoryError> {
        let active_model = record_entity::ActiveModel {
            id: Set(record.id),
            scraper_id: Set(record.scraper_id),
            user_id: Set(record.user_id),
            url: Set(record.url.clone()),
            payload: Set(serde_json::to_value(&record.payload)?),
            status: Set(record.status.to_string()),
            error: Set(record.error.clone()),
            execution_time_ms: Set(record.execution_time_ms),
            created_at: Set(record.created_at.into()),
        };

        let model = active_model.insert(self.db.as_ref()).await?;
        Self::to_domain(model)
    }

    async fn find_owned(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ScrapeRecord>, RepositoryError> {
        record_entity::Entity::find_by_id(id)
            .filter(record_entity::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await?
            .map(Self::to_domain)
            .transpose()
    }

    async fn list_by_scraper(
        &self,
        scraper_id: Uuid,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<ScrapeRecord>, u64), RepositoryError> {
        let paginator = record_entity::Entity::find()
            .filter(record_entity::Column::ScraperId.eq(scraper_id))
            .order_by_desc(record_entity::Column::CreatedAt)
            .paginate(self.db.as_ref(), limit.max(1));

        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page.saturating_sub(1)).await?;

        let records = models
            .into_iter()
            .map(Self::to_domain)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((records, total))
    }

    async fn successful_by_scraper(
        &self,
        scraper_id: Uuid,
    ) -> Result<Vec<ScrapeRecord>, RepositoryError> {
        record_entity::Entity::find()
            .filter(record_entity::Column::ScraperId.eq(scraper_id))
            .filter(record_entity::Column::Status.eq(RecordStatus::Success.to_string()))
            .order_by_asc(record_entity::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(Self::to_domain)
            .collect()
    }
}
