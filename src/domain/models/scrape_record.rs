// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 单页提取结果：字段名到字符串或 null 的映射
pub type Record = serde_json::Map<String, serde_json::Value>;

/// 一次运行的提取结果
///
/// 单次提取产生一个扁平记录，分页提取产生按页排列的记录序列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Extraction {
    /// 分页提取，每页一条记录
    Paginated(Vec<Record>),
    /// 单次提取
    Single(Record),
}

impl Extraction {
    /// 空结果，失败记录使用
    pub fn empty() -> Self {
        Extraction::Single(Record::new())
    }

    /// 按行展开，便于导出
    pub fn rows(&self) -> Vec<&Record> {
        match self {
            Extraction::Single(record) => vec![record],
            Extraction::Paginated(records) => records.iter().collect(),
        }
    }

    /// 结果包含的页数
    pub fn page_count(&self) -> usize {
        match self {
            Extraction::Single(_) => 1,
            Extraction::Paginated(records) => records.len(),
        }
    }
}

impl Default for Extraction {
    fn default() -> Self {
        Self::empty()
    }
}

/// 运行结果状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// 提取成功
    Success,
    /// 启动、导航、等待或提取失败
    Failed,
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RecordStatus::Success => write!(f, "success"),
            RecordStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for RecordStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(RecordStatus::Success),
            "failed" => Ok(RecordStatus::Failed),
            _ => Err(()),
        }
    }
}

/// 抓取结果记录
///
/// 每次运行（无论成功与否）持久化一条，创建后不可变
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeRecord {
    /// 记录唯一标识符
    pub id: Uuid,
    /// 所属抓取器ID
    pub scraper_id: Uuid,
    /// 所属用户ID
    pub user_id: Uuid,
    /// 运行时的目标URL
    pub url: String,
    /// 提取结果
    #[serde(rename = "data")]
    pub payload: Extraction,
    /// 运行状态
    pub status: RecordStatus,
    /// 失败原因
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// 从任务开始到提取完成的耗时（毫秒）
    pub execution_time_ms: i64,
    /// 创建时间
    pub created_at: DateTime<Utc>,
}

impl ScrapeRecord {
    /// 构造成功记录
    pub fn success(
        scraper_id: Uuid,
        user_id: Uuid,
        url: impl Into<String>,
        payload: Extraction,
        execution_time_ms: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            scraper_id,
            user_id,
            url: url.into(),
            payload,
            status: RecordStatus::Success,
            error: None,
            execution_time_ms,
            created_at: Utc::now(),
        }
    }

    /// 构造失败记录，结果为空对象
    pub fn failure(
        scraper_id: Uuid,
        user_id: Uuid,
        url: impl Into<String>,
        error: impl Into<String>,
        execution_time_ms: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            scraper_id,
            user_id,
            url: url.into(),
            payload: Extraction::empty(),
            status: RecordStatus::Failed,
            error: Some(error.into()),
            execution_time_ms,
            created_at: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RecordStatus::Success
    }
}
