// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 中间件模块
///
/// 提供令牌认证、API 密钥认证与额度检查
pub mod auth_middleware;
