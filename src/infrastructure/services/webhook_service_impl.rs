// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::webhook::WebhookDelivery;
use crate::domain::services::webhook_service::WebhookService;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::Duration;

type HmacSha256 = Hmac<Sha256>;

/// 签名请求头
pub const SIGNATURE_HEADER: &str = "X-Scrapeflow-Signature";
/// 时间戳请求头
pub const TIMESTAMP_HEADER: &str = "X-Scrapeflow-Timestamp";

/// Webhook服务实现
///
/// 以 `timestamp.body` 的 HMAC-SHA256 对负载签名后 POST 到回调地址
pub struct WebhookServiceImpl {
    /// HTTP 客户端
    client: reqwest::Client,
    /// 签名密钥
    secret: String,
}

impl WebhookServiceImpl {
    /// 创建新的 Webhook 服务实现
    ///
    /// # 参数
    ///
    /// * `secret` - 签名密钥
    /// * `timeout` - 单次投递超时
    pub fn new(secret: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self { client, secret }
    }

    /// 为负载生成签名
    pub fn generate_signature(&self, payload: &str, timestamp: i64) -> Result<String> {
        let message = format!("{}.{}", timestamp, payload);
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| anyhow!("invalid webhook secret: {}", e))?;
        mac.update(message.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

#[async_trait]
impl WebhookService for WebhookServiceImpl {
    async fn send_webhook(&self, delivery: &WebhookDelivery) -> Result<()> {
        let timestamp = chrono::Utc::now().timestamp();
        let body = serde_json::to_string(&delivery.payload)?;
        let signature = self.generate_signature(&body, timestamp)?;

        metrics::counter!("webhook_delivery_attempts_total").increment(1);
        let response = self
            .client
            .post(&delivery.url)
            .header("Content-Type", "application/json")
            .header(SIGNATURE_HEADER, signature)
            .header(TIMESTAMP_HEADER, timestamp.to_string())
            .body(body)
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                metrics::counter!("webhook_delivery_failed_total").increment(1);
                return Err(e.into());
            }
        };

        if response.status().is_success() {
            Ok(())
        } else {
            metrics::counter!("webhook_delivery_failed_total").increment(1);
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(anyhow!(
                "Webhook delivery failed with status {}: {}",
                status,
                body
            ))
        }
    }
}
