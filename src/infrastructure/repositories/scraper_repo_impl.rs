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

use crate::domain::models::scraper::{Schedule, Scraper};
use crate::domain::repositories::scraper_repository::ScraperRepository;
use crate::domain::repositories::RepositoryError;
use crate::infrastructure::database::entities::{
    scrape_records as record_entity, scrapers as scraper_entity,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::*;
use std::sync::Arc;
use uuid::Uuid;

/// 抓取器仓库实现
///
/// 字段定义、选项、Webhook 与调度以 JSON 列存储
pub struct ScraperRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl ScraperRepositoryImpl {
    /// 创建新的抓取器仓库实例
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    fn to_domain(model: scraper_entity::Model) -> Result<Scraper, RepositoryError> {
        Ok(Scraper {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            target_url: model.target_url,
            selectors: serde_json::from_value(model.selectors)?,
            options: serde_json::from_value(model.options)?,
            webhook: serde_json::from_value(model.webhook)?,
            schedule: serde_json::from_value(model.schedule)?,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        })
    }

    fn to_active_model(scraper: &Scraper) -> Result<scraper_entity::ActiveModel, RepositoryError> {
        Ok(scraper_entity::ActiveModel {
            id: Set(scraper.id),
            user_id: Set(scraper.user_id),
            name: Set(scraper.name.clone()),
            target_url: Set(scraper.target_url.clone()),
            selectors: Set(serde_json::to_value(&scraper.selectors)?),
            options: Set(serde_json::to_value(&scraper.options)?),
            webhook: Set(serde_json::to_value(&scraper.webhook)?),
            schedule: Set(serde_json::to_value(&scraper.schedule)?),
            schedule_active: Set(scraper.schedule.active),
            created_at: Set(scraper.created_at.into()),
            updated_at: Set(scraper.updated_at.into()),
        })
    }
}

#[async_trait]
impl ScraperRepository for ScraperRepositoryImpl {
    async fn create(&self, scraper: &Scraper) -> Result<Scraper, RepositoryError> {
        let model = Self::to_active_model(scraper)?
            .insert(self.db.as_ref())
            .await?;
        Self::to_domain(model)
    }

    async fn find_owned(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Scraper>, RepositoryError> {
        scraper_entity::Entity::find_by_id(id)
            .filter(scraper_entity::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await?
            .map(Self::to_domain)
            .transpose()
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Scraper>, RepositoryError> {
        scraper_entity::Entity::find()
            .filter(scraper_entity::Column::UserId.eq(user_id))
            .order_by_desc(scraper_entity::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(Self::to_domain)
            .collect()
    }

    async fn update(&self, scraper: &Scraper) -> Result<Scraper, RepositoryError> {
        let mut active_model = Self::to_active_model(scraper)?;
        // Ownership and creation time never change
        active_model.user_id = Unchanged(scraper.user_id);
        active_model.created_at = Unchanged(scraper.created_at.into());

        let model = active_model
            .update(self.db.as_ref())
            .await
            .map_err(|e| match e {
                DbErr::RecordNotUpdated => RepositoryError::NotFound,
                other => RepositoryError::Database(other),
            })?;
        Self::to_domain(model)
    }

    async fn delete_owned(&self, id: Uuid, user_id: Uuid) -> Result<bool, RepositoryError> {
        let txn = self.db.begin().await?;

        let owned = scraper_entity::Entity::find_by_id(id)
            .filter(scraper_entity::Column::UserId.eq(user_id))
            .one(&txn)
            .await?;
        if owned.is_none() {
            txn.rollback().await?;
            return Ok(false);
        }

        let records = record_entity::Entity::delete_many()
            .filter(record_entity::Column::ScraperId.eq(id))
            .exec(&txn)
            .await?;
        scraper_entity::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        tracing::debug!(
            "Deleted scraper {} with {} records",
            id,
            records.rows_affected
        );
        Ok(true)
    }

    async fn touch_last_run(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), RepositoryError> {
        let model = scraper_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let mut schedule: Schedule = serde_json::from_value(model.schedule.clone())?;
        schedule.last_run = Some(at);

        let mut active_model: scraper_entity::ActiveModel = model.into();
        active_model.schedule = Set(serde_json::to_value(&schedule)?);
        active_model.update(self.db.as_ref()).await?;
        Ok(())
    }

    async fn find_scheduled(&self) -> Result<Vec<Scraper>, RepositoryError> {
        scraper_entity::Entity::find()
            .filter(scraper_entity::Column::ScheduleActive.eq(true))
            .order_by_asc(scraper_entity::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(Self::to_domain)
            .collect()
    }
}
