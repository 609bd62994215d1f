// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::webhook::WebhookDelivery;
use anyhow::Result;
use async_trait::async_trait;

/// Webhook服务特质
///
/// 定义Webhook发送的核心逻辑。投递是尽力而为的，调用方只记录失败，不重试
#[async_trait]
pub trait WebhookService: Send + Sync {
    /// 发送一次Webhook
    ///
    /// # 参数
    ///
    /// * `delivery` - 回调地址与负载
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 对端返回 2xx
    /// * `Err(anyhow::Error)` - 网络错误或非 2xx 响应
    async fn send_webhook(&self, delivery: &WebhookDelivery) -> Result<()>;
}
