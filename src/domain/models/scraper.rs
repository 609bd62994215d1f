// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

/// 导航与等待的默认超时（毫秒）
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// 抓取器配置实体
///
/// 描述一个用户定义的抓取任务：目标地址、字段选择器、
/// 浏览器选项、Webhook 通知以及调度设置。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scraper {
    /// 抓取器唯一标识符
    pub id: Uuid,
    /// 所属用户ID
    pub user_id: Uuid,
    /// 抓取器名称
    pub name: String,
    /// 目标URL
    pub target_url: String,
    /// 有序的字段定义列表
    pub selectors: Vec<FieldDefinition>,
    /// 浏览器选项
    pub options: ScraperOptions,
    /// Webhook 配置
    pub webhook: WebhookConfig,
    /// 调度配置
    pub schedule: Schedule,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

/// 抓取器的可编辑字段
///
/// 创建与全量更新共用同一结构
#[derive(Debug, Clone, Default)]
pub struct ScraperDraft {
    pub name: String,
    pub target_url: String,
    pub selectors: Vec<FieldDefinition>,
    pub options: ScraperOptions,
    pub webhook: WebhookConfig,
    pub schedule: Schedule,
}

/// 抓取器配置校验错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidScraper {
    #[error("Name is required")]
    Name,
    #[error("Valid target URL is required")]
    TargetUrl,
    #[error("At least one selector is required")]
    NoSelectors,
    #[error("Selector {0} must have a name and a selector")]
    IncompleteSelector(usize),
}

impl Scraper {
    /// 由草稿创建新的抓取器
    ///
    /// # 参数
    ///
    /// * `user_id` - 所属用户ID
    /// * `draft` - 可编辑字段
    ///
    /// # 返回值
    ///
    /// 返回带有新ID与当前时间戳的抓取器
    pub fn new(user_id: Uuid, draft: ScraperDraft) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            name: draft.name,
            target_url: draft.target_url,
            selectors: draft.selectors,
            options: draft.options,
            webhook: draft.webhook,
            schedule: draft.schedule,
            created_at: now,
            updated_at: now,
        }
    }

    /// 用草稿替换全部可编辑字段
    pub fn apply(&mut self, draft: ScraperDraft) {
        self.name = draft.name;
        self.target_url = draft.target_url;
        self.selectors = draft.selectors;
        self.options = draft.options;
        self.webhook = draft.webhook;
        self.schedule = draft.schedule;
        self.updated_at = Utc::now();
    }

    /// 校验运行前置条件
    ///
    /// 名称非空，目标地址必须是 http(s) URL，选择器列表非空且每项都有名称与选择器
    pub fn validate(&self) -> Result<(), InvalidScraper> {
        if self.name.trim().is_empty() {
            return Err(InvalidScraper::Name);
        }
        validate_target_url(&self.target_url)?;
        validate_selectors(&self.selectors)
    }
}

/// 校验目标地址为合法的 http(s) URL
pub fn validate_target_url(target: &str) -> Result<(), InvalidScraper> {
    match Url::parse(target) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Ok(()),
        _ => Err(InvalidScraper::TargetUrl),
    }
}

/// 校验字段定义列表
pub fn validate_selectors(selectors: &[FieldDefinition]) -> Result<(), InvalidScraper> {
    if selectors.is_empty() {
        return Err(InvalidScraper::NoSelectors);
    }
    match selectors
        .iter()
        .position(|f| f.name.trim().is_empty() || f.selector.trim().is_empty())
    {
        Some(index) => Err(InvalidScraper::IncompleteSelector(index)),
        None => Ok(()),
    }
}

/// 字段提取方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SelectorKind {
    /// 去除首尾空白的文本内容
    #[default]
    Text,
    /// 去除首尾空白的内部 HTML
    Html,
    /// 指定属性的值
    Attribute,
}

impl fmt::Display for SelectorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SelectorKind::Text => write!(f, "text"),
            SelectorKind::Html => write!(f, "html"),
            SelectorKind::Attribute => write!(f, "attribute"),
        }
    }
}

impl FromStr for SelectorKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(SelectorKind::Text),
            "html" => Ok(SelectorKind::Html),
            "attribute" => Ok(SelectorKind::Attribute),
            _ => Err(()),
        }
    }
}

/// 字段定义
///
/// 一个输出字段的名称、CSS 选择器与提取方式
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// 输出字段名称
    pub name: String,
    /// CSS 选择器
    pub selector: String,
    /// 提取方式
    #[serde(rename = "type", default)]
    pub kind: SelectorKind,
    /// 属性名（仅在 `attribute` 方式下使用）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, selector: impl Into<String>, kind: SelectorKind) -> Self {
        Self {
            name: name.into(),
            selector: selector.into(),
            kind,
            attribute: None,
        }
    }

    pub fn attribute(
        name: impl Into<String>,
        selector: impl Into<String>,
        attribute: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            selector: selector.into(),
            kind: SelectorKind::Attribute,
            attribute: Some(attribute.into()),
        }
    }
}

/// 分页选项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationOptions {
    /// 是否启用分页
    #[serde(default)]
    pub enabled: bool,
    /// "下一页" 控件的选择器
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_selector: Option<String>,
    /// 最多抓取的页数
    #[serde(default = "default_max_pages")]
    pub max_pages: i64,
}

fn default_max_pages() -> i64 {
    1
}

impl Default for PaginationOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            next_selector: None,
            max_pages: default_max_pages(),
        }
    }
}

impl PaginationOptions {
    /// 实际页数上限，小于 1 的配置按 1 处理
    pub fn page_budget(&self) -> usize {
        self.max_pages.max(1) as usize
    }

    /// 启用分页且配置了非空的 "下一页" 选择器时返回该选择器
    pub fn next_control(&self) -> Option<&str> {
        if !self.enabled {
            return None;
        }
        self.next_selector
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// 浏览器选项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScraperOptions {
    /// 导航后需要等待出现的选择器
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_for_selector: Option<String>,
    /// 每次导航/等待的超时（毫秒）
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// 分页设置
    #[serde(default)]
    pub pagination: PaginationOptions,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl Default for ScraperOptions {
    fn default() -> Self {
        Self {
            wait_for_selector: None,
            timeout: DEFAULT_TIMEOUT_MS,
            pagination: PaginationOptions::default(),
        }
    }
}

impl ScraperOptions {
    /// 单次调用的超时，0 视为默认值
    pub fn call_timeout(&self) -> std::time::Duration {
        let millis = if self.timeout == 0 {
            DEFAULT_TIMEOUT_MS
        } else {
            self.timeout
        };
        std::time::Duration::from_millis(millis)
    }

    /// 非空的等待选择器
    pub fn wait_selector(&self) -> Option<&str> {
        self.wait_for_selector
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Webhook 配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// 是否启用
    #[serde(default)]
    pub active: bool,
    /// 回调地址
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl WebhookConfig {
    /// 启用且配置了地址时返回回调地址
    pub fn target(&self) -> Option<&str> {
        if !self.active {
            return None;
        }
        self.url.as_deref().filter(|u| !u.trim().is_empty())
    }
}

/// 调度频率
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// 仅运行一次
    #[default]
    Once,
    Hourly,
    Daily,
    Weekly,
}

impl Frequency {
    /// 两次运行之间的最小间隔，`Once` 没有间隔
    pub fn interval(&self) -> Option<Duration> {
        match self {
            Frequency::Once => None,
            Frequency::Hourly => Some(Duration::hours(1)),
            Frequency::Daily => Some(Duration::days(1)),
            Frequency::Weekly => Some(Duration::weeks(1)),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Frequency::Once => write!(f, "once"),
            Frequency::Hourly => write!(f, "hourly"),
            Frequency::Daily => write!(f, "daily"),
            Frequency::Weekly => write!(f, "weekly"),
        }
    }
}

/// 调度配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    /// 是否启用调度
    #[serde(default)]
    pub active: bool,
    /// 运行频率
    #[serde(default)]
    pub frequency: Frequency,
    /// 最近一次成功运行时间
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run: Option<DateTime<Utc>>,
}

impl Schedule {
    /// 判断在 `now` 时刻是否到期
    ///
    /// # 参数
    ///
    /// * `now` - 当前时间
    ///
    /// # 返回值
    ///
    /// 未启用时返回 false；从未成功运行过时返回 true；
    /// 否则按频率间隔判断
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        if !self.active {
            return false;
        }
        match (self.last_run, self.frequency.interval()) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(last), Some(interval)) => now - last >= interval,
        }
    }
}
