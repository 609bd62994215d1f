// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// 应用程序配置设置
///
/// 包含服务器、数据库、认证、浏览器驱动、Webhook、调度器和指标等所有配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 服务器配置
    pub server: ServerSettings,
    /// 数据库配置
    pub database: DatabaseSettings,
    /// 认证配置
    pub auth: AuthSettings,
    /// 浏览器驱动配置
    pub browser: BrowserSettings,
    /// Webhook 配置
    pub webhook: WebhookSettings,
    /// 调度器配置
    pub scheduler: SchedulerSettings,
    /// 指标导出配置
    pub metrics: MetricsSettings,
}

/// 服务器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
}

/// 数据库配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// 数据库连接URL
    pub url: String,
    /// 最大连接数
    pub max_connections: Option<u32>,
    /// 最小连接数
    pub min_connections: Option<u32>,
    /// 连接超时时间（秒）
    pub connect_timeout: Option<u64>,
    /// 空闲连接超时时间（秒）
    pub idle_timeout: Option<u64>,
}

/// 认证配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    /// 令牌签名密钥
    pub token_secret: String,
    /// 令牌有效期（秒）
    pub token_ttl_secs: u64,
    /// 新用户默认调用额度
    pub default_usage_limit: i64,
    /// PBKDF2 迭代次数
    pub password_iterations: u32,
}

/// 浏览器驱动类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    /// 无头 Chromium（DevTools 协议）
    Chromium,
    /// 纯 HTTP 抓取，不执行 JavaScript
    Http,
}

/// 浏览器驱动配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserSettings {
    /// 使用的驱动
    pub driver: DriverKind,
    /// 远程 DevTools 地址，设置后不再本地启动浏览器
    pub remote_debugging_url: Option<String>,
    /// 是否无头运行
    pub headless: bool,
    /// 同时存在的最大会话数
    pub max_concurrent_sessions: usize,
    /// 自定义 User-Agent
    pub user_agent: Option<String>,
}

/// Webhook配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookSettings {
    /// Webhook签名密钥
    pub secret: String,
    /// 单次投递超时（秒）
    pub timeout_secs: u64,
}

/// 调度器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerSettings {
    /// 是否启用定时调度
    pub enabled: bool,
    /// 扫描间隔（秒）
    pub tick_secs: u64,
}

/// 指标配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    /// 是否启用 Prometheus 导出
    pub enabled: bool,
    /// 导出监听地址
    pub listen_addr: String,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次加载代码内默认值、`config/default`、`config/{APP_ENVIRONMENT}` 与
    /// `SCRAPEFLOW__` 前缀的环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        Self::builder()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("SCRAPEFLOW").separator("__"))
            .build()?
            .try_deserialize()
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            // Start with default settings
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("database.url", "sqlite://scrapeflow.db?mode=rwc")?
            .set_default("database.max_connections", 20)?
            .set_default("database.min_connections", 2)?
            .set_default("database.connect_timeout", 10)?
            .set_default("database.idle_timeout", 300)?
            .set_default("auth.token_secret", "change-me-in-production")?
            .set_default("auth.token_ttl_secs", 86_400)?
            .set_default("auth.default_usage_limit", 100)?
            .set_default("auth.password_iterations", 600_000)?
            .set_default("browser.driver", "chromium")?
            .set_default("browser.headless", true)?
            .set_default("browser.max_concurrent_sessions", 4)?
            .set_default("webhook.secret", "change-me-in-production")?
            .set_default("webhook.timeout_secs", 10)?
            .set_default("scheduler.enabled", true)?
            .set_default("scheduler.tick_secs", 60)?
            .set_default("metrics.enabled", true)?
            .set_default("metrics.listen_addr", "0.0.0.0:9000")
    }
}
