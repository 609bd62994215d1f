// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 该模块包含系统的技术实现细节，负责与数据库、指标导出和外部 HTTP 服务的交互。
///
/// 包含的子模块：
/// - 数据库（database）：提供数据库连接和实体映射
/// - 指标（metrics）：Prometheus 导出器
/// - 仓库实现（repositories）：提供领域仓库接口的具体实现
/// - 服务实现（services）：Webhook 投递
pub mod database;
pub mod metrics;
pub mod repositories;
pub mod services;
