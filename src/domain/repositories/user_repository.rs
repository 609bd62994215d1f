// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::RepositoryError;
use crate::domain::models::user::User;
use async_trait::async_trait;
use uuid::Uuid;

/// 用户仓库特质
///
/// 定义用户账户的数据访问接口，包括 API 密钥轮换与调用计数
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 创建用户
    ///
    /// # 参数
    ///
    /// * `user` - 要创建的用户实体
    ///
    /// # 返回值
    ///
    /// * `Ok(User)` - 成功创建后返回用户
    /// * `Err(RepositoryError::Conflict)` - 邮箱已被注册
    async fn create(&self, user: &User) -> Result<User, RepositoryError>;

    /// 根据ID查找用户
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError>;

    /// 根据邮箱查找用户（大小写不敏感）
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;

    /// 根据 API 密钥查找用户
    async fn find_by_api_key(&self, api_key: &str) -> Result<Option<User>, RepositoryError>;

    /// 替换用户的 API 密钥
    ///
    /// # 参数
    ///
    /// * `id` - 用户ID
    /// * `api_key` - 新密钥
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 替换成功
    /// * `Err(RepositoryError::NotFound)` - 用户不存在
    async fn update_api_key(&self, id: Uuid, api_key: &str) -> Result<(), RepositoryError>;

    /// 设置账户级 Webhook 地址
    async fn update_webhook_url(&self, id: Uuid, url: &str) -> Result<(), RepositoryError>;

    /// 原子地将调用计数加一
    ///
    /// 单条 `usage_count = usage_count + 1` 语句，并发调用不会丢失计数
    async fn increment_usage(&self, id: Uuid) -> Result<(), RepositoryError>;
}
