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

use crate::domain::models::user::User;
use crate::domain::repositories::user_repository::UserRepository;
use crate::domain::repositories::RepositoryError;
use crate::infrastructure::database::entities::users as user_entity;
use async_trait::async_trait;
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::*;
use std::sync::Arc;
use uuid::Uuid;

/// 用户仓库实现
pub struct UserRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl UserRepositoryImpl {
    /// 创建新的用户仓库实例
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    fn to_domain(model: user_entity::Model) -> User {
        User {
            id: model.id,
            name: model.name,
            email: model.email,
            password_hash: model.password_hash,
            api_key: model.api_key,
            role: model.role.parse().unwrap_or_default(),
            webhook_url: model.webhook_url,
            usage_limit: model.usage_limit,
            usage_count: model.usage_count,
            created_at: model.created_at.into(),
        }
    }

    async fn update_column(
        &self,
        id: Uuid,
        column: user_entity::Column,
        value: SimpleExpr,
    ) -> Result<(), RepositoryError> {
        let result = user_entity::Entity::update_many()
            .col_expr(column, value)
            .filter(user_entity::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for UserRepositoryImpl {
    async fn create(&self, user: &User) -> Result<User, RepositoryError> {
        let email = user.email.to_lowercase();
        if self.find_by_email(&email).await?.is_some() {
            return Err(RepositoryError::Conflict("User already exists".to_string()));
        }

        let active_model = user_entity::ActiveModel {
            id: Set(user.id),
            name: Set(user.name.clone()),
            email: Set(email),
            password_hash: Set(user.password_hash.clone()),
            api_key: Set(user.api_key.clone()),
            role: Set(user.role.to_string()),
            webhook_url: Set(user.webhook_url.clone()),
            usage_limit: Set(user.usage_limit),
            usage_count: Set(user.usage_count),
            created_at: Set(user.created_at.into()),
        };

        // The pre-check can race with a concurrent registration
        let model = active_model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    RepositoryError::Conflict("User already exists".to_string())
                }
                _ => RepositoryError::Database(e),
            })?;

        Ok(Self::to_domain(model))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        let model = user_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Self::to_domain))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let model = user_entity::Entity::find()
            .filter(user_entity::Column::Email.eq(email.to_lowercase()))
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Self::to_domain))
    }

    async fn find_by_api_key(&self, api_key: &str) -> Result<Option<User>, RepositoryError> {
        let model = user_entity::Entity::find()
            .filter(user_entity::Column::ApiKey.eq(api_key))
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Self::to_domain))
    }

    async fn update_api_key(&self, id: Uuid, api_key: &str) -> Result<(), RepositoryError> {
        self.update_column(id, user_entity::Column::ApiKey, Expr::value(api_key))
            .await
    }

    async fn update_webhook_url(&self, id: Uuid, url: &str) -> Result<(), RepositoryError> {
        self.update_column(id, user_entity::Column::WebhookUrl, Expr::value(url))
            .await
    }

    async fn increment_usage(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = user_entity::Entity::update_many()
            .col_expr(
                user_entity::Column::UsageCount,
                Expr::col(user_entity::Column::UsageCount).add(1),
            )
            .filter(user_entity::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
