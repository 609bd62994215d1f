// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::DbErr;
use thiserror::Error;

/// 仓库接口模块
///
/// 该模块定义了领域层的仓库接口，具体实现由基础设施层提供。
///
/// 包含的仓库接口：
/// - 用户仓库（user_repository）：账户、API 密钥与调用额度
/// - 抓取器仓库（scraper_repository）：抓取器配置的持久化与调度查询
/// - 抓取记录仓库（scrape_record_repository）：运行结果的存储与分页查询
pub mod scrape_record_repository;
pub mod scraper_repository;
pub mod user_repository;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// 记录未找到
    #[error("Record not found")]
    NotFound,
    /// 唯一约束冲突
    #[error("Conflict: {0}")]
    Conflict(String),
    /// JSON 列编解码失败
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
