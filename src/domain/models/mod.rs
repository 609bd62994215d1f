// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 抓取器（scraper）：用户定义的抓取配置与调度
/// - 抓取记录（scrape_record）：每次运行持久化的结果
/// - 用户（user）：租户、API 密钥与调用额度
/// - 网络钩子（webhook）：成功运行后的通知负载
pub mod scrape_record;
pub mod scraper;
pub mod user;
pub mod webhook;
