// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::scrape_record::{Extraction, ScrapeRecord};

/// Webhook 通知负载
///
/// 成功运行后推送到抓取器配置的回调地址
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    /// 抓取器ID
    pub scraper_id: Uuid,
    /// 提取结果
    pub data: Extraction,
    /// 发送时间
    pub timestamp: DateTime<Utc>,
}

impl WebhookPayload {
    pub fn for_record(record: &ScrapeRecord) -> Self {
        Self {
            scraper_id: record.scraper_id,
            data: record.payload.clone(),
            timestamp: Utc::now(),
        }
    }
}

/// 一次待投递的 Webhook
#[derive(Debug, Clone)]
pub struct WebhookDelivery {
    /// 回调地址
    pub url: String,
    /// 负载
    pub payload: WebhookPayload,
}
