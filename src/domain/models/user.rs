// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 用户实体
///
/// 系统中的租户。持有 API 密钥、调用额度与默认 Webhook 地址
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// 用户唯一标识符
    pub id: Uuid,
    /// 显示名称
    pub name: String,
    /// 邮箱（小写存储，唯一）
    pub email: String,
    /// 密码哈希，永不序列化
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// API 密钥
    pub api_key: String,
    /// 角色
    pub role: Role,
    /// 账户级 Webhook 地址
    pub webhook_url: Option<String>,
    /// 调用额度上限
    pub usage_limit: i64,
    /// 已使用次数
    pub usage_count: i64,
    /// 创建时间
    pub created_at: DateTime<Utc>,
}

impl User {
    /// 是否仍有剩余额度
    pub fn has_quota(&self) -> bool {
        self.usage_count < self.usage_limit
    }
}

/// 新用户
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub api_key: String,
    pub role: Role,
    pub usage_limit: i64,
}

impl NewUser {
    /// 转换为完整用户实体
    pub fn into_user(self) -> User {
        User {
            id: Uuid::new_v4(),
            name: self.name,
            email: self.email.to_lowercase(),
            password_hash: self.password_hash,
            api_key: self.api_key,
            role: self.role,
            webhook_url: None,
            usage_limit: self.usage_limit,
            usage_count: 0,
            created_at: Utc::now(),
        }
    }
}

/// 用户角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(()),
        }
    }
}
