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

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// 驱动错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 浏览器启动或连接失败
    #[error("Browser launch failed: {0}")]
    Launch(String),
    /// 导航失败
    #[error("Navigation failed: {0}")]
    Navigation(String),
    /// HTTP 请求失败
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    /// 元素未找到
    #[error("Element not found: {0}")]
    ElementNotFound(String),
    /// 超时
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
    /// 其他错误
    #[error("Other error: {0}")]
    Other(String),
}

/// 会话选项
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// 单次导航/等待的超时
    pub timeout: Duration,
    /// 自定义 User-Agent
    pub user_agent: Option<String>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(crate::domain::models::scraper::DEFAULT_TIMEOUT_MS),
            user_agent: None,
        }
    }
}

/// 对首个匹配元素读取的内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementProbe {
    /// 文本内容
    Text,
    /// 内部 HTML
    InnerHtml,
    /// 指定属性
    Attribute(String),
}

/// 浏览器会话
///
/// 一个已打开的页面句柄。会话内的操作严格顺序执行
#[async_trait]
pub trait BrowserSession: Send {
    /// 导航到指定地址并等待加载完成
    async fn goto(&mut self, url: &str) -> Result<(), DriverError>;

    /// 等待选择器出现
    async fn wait_for_selector(&mut self, selector: &str) -> Result<(), DriverError>;

    /// 读取首个匹配元素的内容
    ///
    /// # 返回值
    ///
    /// * `Ok(Some(String))` - 元素存在且内容可读
    /// * `Ok(None)` - 无匹配元素或属性缺失
    /// * `Err(DriverError)` - 驱动错误
    async fn query(
        &mut self,
        selector: &str,
        probe: &ElementProbe,
    ) -> Result<Option<String>, DriverError>;

    /// 选择器是否有匹配元素
    async fn exists(&mut self, selector: &str) -> Result<bool, DriverError>;

    /// 点击首个匹配元素并等待导航完成
    async fn click_and_wait(&mut self, selector: &str) -> Result<(), DriverError>;

    /// 当前页面地址
    fn current_url(&self) -> Option<String>;

    /// 关闭会话并释放底层资源
    async fn close(self: Box<Self>) -> Result<(), DriverError>;
}

/// 浏览器驱动特质
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// 启动一个新会话
    async fn launch(&self, options: &SessionOptions)
        -> Result<Box<dyn BrowserSession>, DriverError>;

    /// 驱动名称
    fn name(&self) -> &'static str;
}
