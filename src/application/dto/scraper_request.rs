// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::scraper::{
    validate_selectors, validate_target_url, FieldDefinition, Frequency, Schedule, ScraperDraft,
    ScraperOptions, WebhookConfig,
};
use serde::Deserialize;
use std::borrow::Cow;
use validator::{Validate, ValidationError};

/// 创建/更新抓取器请求
///
/// 更新是对可编辑字段的全量替换，未提供的可选块回到默认值
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ScraperRequestDto {
    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    #[validate(custom(function = "http_url", message = "Valid target URL is required"))]
    pub target_url: String,
    #[serde(default)]
    #[validate(
        length(min = 1, message = "At least one selector is required"),
        custom(function = "complete_selectors")
    )]
    pub selectors: Vec<FieldDefinition>,
    #[serde(default)]
    pub options: ScraperOptions,
    #[serde(default)]
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub schedule: ScheduleDto,
}

/// 调度设置请求体，`lastRun` 由服务端维护
#[derive(Debug, Default, Deserialize)]
pub struct ScheduleDto {
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub frequency: Frequency,
}

impl ScraperRequestDto {
    /// 转换为领域草稿
    ///
    /// # 参数
    ///
    /// * `last_run` - 需要保留的最近运行时间（更新时传入原值）
    pub fn into_draft(self, last_run: Option<chrono::DateTime<chrono::Utc>>) -> ScraperDraft {
        ScraperDraft {
            name: self.name.trim().to_string(),
            target_url: self.target_url.trim().to_string(),
            selectors: self.selectors,
            options: self.options,
            webhook: self.webhook,
            schedule: Schedule {
                active: self.schedule.active,
                frequency: self.schedule.frequency,
                last_run,
            },
        }
    }
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

fn http_url(value: &str) -> Result<(), ValidationError> {
    validate_target_url(value.trim()).map_err(|_| ValidationError::new("url"))
}

fn complete_selectors(selectors: &[FieldDefinition]) -> Result<(), ValidationError> {
    if selectors.is_empty() {
        // Reported by the length rule
        return Ok(());
    }
    validate_selectors(selectors).map_err(|e| {
        ValidationError::new("selector").with_message(Cow::Owned(e.to_string()))
    })
}
