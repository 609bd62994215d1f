// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 请求提取器模块
///
/// 将请求体解析失败统一渲染为 `{success:false, message}` 的 400 响应
pub mod api_json;
