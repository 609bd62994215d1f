// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::scrape_record::{Extraction, Record};
use crate::domain::models::scraper::{FieldDefinition, PaginationOptions, SelectorKind};
use crate::engines::traits::{BrowserSession, ElementProbe};
use serde_json::Value;

/// 提取服务
///
/// 在已加载的页面上按字段定义提取扁平记录，并在需要时跨页收集。
/// 单次提取与分页提取共用同一个字段提取逻辑
pub struct ExtractionService;

impl ExtractionService {
    /// 提取单个字段
    ///
    /// 无匹配、属性缺失或任何驱动错误都返回 null，不会中断整条记录
    ///
    /// # 参数
    ///
    /// * `page` - 页面句柄
    /// * `field` - 字段定义
    ///
    /// # 返回值
    ///
    /// 字符串值或 `Value::Null`
    pub async fn extract_field(page: &mut dyn BrowserSession, field: &FieldDefinition) -> Value {
        let probe = match field.kind {
            SelectorKind::Text => ElementProbe::Text,
            SelectorKind::Html => ElementProbe::InnerHtml,
            SelectorKind::Attribute => match field.attribute.as_deref() {
                Some(name) if !name.is_empty() => ElementProbe::Attribute(name.to_string()),
                _ => return Value::Null,
            },
        };

        match page.query(&field.selector, &probe).await {
            Ok(Some(value)) => Value::String(value),
            Ok(None) => Value::Null,
            Err(e) => {
                tracing::debug!("Field {} ({}) failed: {}", field.name, field.selector, e);
                Value::Null
            }
        }
    }

    /// 按顺序提取全部字段
    pub async fn extract_record(page: &mut dyn BrowserSession, fields: &[FieldDefinition]) -> Record {
        let mut record = Record::new();
        for field in fields {
            let value = Self::extract_field(page, field).await;
            record.insert(field.name.clone(), value);
        }
        record
    }

    /// 跨页收集记录
    ///
    /// 总是包含当前页的记录；随后在页数未达上限时检查 "下一页" 控件、
    /// 点击并等待导航、提取并追加。任一步失败都静默结束
    ///
    /// # 参数
    ///
    /// * `page` - 已加载首页的页面句柄
    /// * `fields` - 字段定义
    /// * `pagination` - 分页选项
    ///
    /// # 返回值
    ///
    /// 至少 1 条、至多 `page_budget()` 条记录
    pub async fn paginate(
        page: &mut dyn BrowserSession,
        fields: &[FieldDefinition],
        pagination: &PaginationOptions,
    ) -> Vec<Record> {
        let budget = pagination.page_budget();
        let mut records = vec![Self::extract_record(page, fields).await];

        let Some(next) = pagination.next_control() else {
            return records;
        };

        while records.len() < budget {
            match page.exists(next).await {
                Ok(true) => {}
                Ok(false) => {
                    tracing::debug!("No next control after page {}", records.len());
                    break;
                }
                Err(e) => {
                    tracing::debug!("Next control check failed: {}", e);
                    break;
                }
            }

            if let Err(e) = page.click_and_wait(next).await {
                tracing::debug!("Pagination stopped after page {}: {}", records.len(), e);
                break;
            }

            records.push(Self::extract_record(page, fields).await);
        }

        records
    }

    /// 提取入口
    ///
    /// 未启用分页时返回单条记录，否则返回按页排列的记录序列
    pub async fn extract(
        page: &mut dyn BrowserSession,
        fields: &[FieldDefinition],
        pagination: &PaginationOptions,
    ) -> Extraction {
        if pagination.enabled {
            Extraction::Paginated(Self::paginate(page, fields, pagination).await)
        } else {
            Extraction::Single(Self::extract_record(page, fields).await)
        }
    }
}
