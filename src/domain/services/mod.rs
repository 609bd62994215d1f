// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 包含的服务：
/// - 认证服务（auth_service）：令牌签发、密码哈希与 API 密钥生成
/// - 导出服务（export_service）：将抓取结果转换为 CSV 与 JSON
/// - 提取服务（extraction_service）：按字段定义提取页面内容并跨页收集
/// - 可视化服务（visualization_service）：由历史记录构建图表序列
/// - Webhook服务（webhook_service）：成功运行后的通知投递接口
pub mod auth_service;
pub mod export_service;
pub mod extraction_service;
pub mod visualization_service;
pub mod webhook_service;
