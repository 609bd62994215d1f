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

use crate::engines::traits::{
    BrowserDriver, BrowserSession, DriverError, ElementProbe, SessionOptions,
};
use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use uuid::Uuid;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Chromium 驱动
///
/// 基于 chromiumoxide 的 DevTools 驱动。每个会话启动独立的浏览器进程，
/// 配置了远程调试地址时改为连接远程实例并只打开新标签页
pub struct ChromiumDriver {
    headless: bool,
    remote_debugging_url: Option<String>,
}

impl ChromiumDriver {
    pub fn new(headless: bool, remote_debugging_url: Option<String>) -> Self {
        Self {
            headless,
            remote_debugging_url,
        }
    }

    async fn open_browser(
        &self,
        options: &SessionOptions,
    ) -> Result<(Browser, JoinHandle<()>, Option<PathBuf>), DriverError> {
        let (browser, mut handler, profile_dir) = if let Some(ref url) = self.remote_debugging_url
        {
            tracing::debug!("Connecting to remote Chrome instance at: {}", url);
            let (browser, handler) = Browser::connect(url)
                .await
                .map_err(|e| DriverError::Launch(format!("remote Chrome: {}", e)))?;
            (browser, handler, None)
        } else {
            // Concurrent browsers must not share a profile directory
            let profile_dir = std::env::temp_dir().join(format!("scrapeflow-{}", Uuid::new_v4()));
            let mut builder = BrowserConfig::builder()
                .no_sandbox()
                .user_data_dir(&profile_dir)
                .request_timeout(options.timeout)
                .arg("--disable-gpu")
                .arg("--disable-dev-shm-usage");
            if !self.headless {
                builder = builder.with_head();
            }
            let config = builder.build().map_err(DriverError::Launch)?;
            let (browser, handler) = Browser::launch(config)
                .await
                .map_err(|e| DriverError::Launch(e.to_string()))?;
            (browser, handler, Some(profile_dir))
        };

        // Spawn a handler to process browser events
        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        Ok((browser, handle, profile_dir))
    }
}

#[async_trait]
impl BrowserDriver for ChromiumDriver {
    /// 启动浏览器会话
    ///
    /// # 参数
    ///
    /// * `options` - 会话选项
    ///
    /// # 返回值
    ///
    /// * `Ok(Box<dyn BrowserSession>)` - 打开了空白页的会话
    /// * `Err(DriverError)` - 启动或连接失败
    async fn launch(
        &self,
        options: &SessionOptions,
    ) -> Result<Box<dyn BrowserSession>, DriverError> {
        let timeout = options.timeout;
        let (mut browser, handler, profile_dir) =
            within(timeout, self.open_browser(options)).await?;

        let opened = within(timeout, async {
            browser
                .new_page("about:blank")
                .await
                .map_err(|e| DriverError::Launch(e.to_string()))
        })
        .await;
        let page = match opened {
            Ok(page) => page,
            Err(e) => {
                if profile_dir.is_some() {
                    let _ = browser.close().await;
                }
                handler.abort();
                return Err(e);
            }
        };

        if let Some(ref agent) = options.user_agent {
            if let Err(e) = page.set_user_agent(agent.as_str()).await {
                tracing::warn!("Failed to override user agent: {}", e);
            }
        }

        Ok(Box::new(ChromiumSession {
            // A remote browser is shared, only our tab belongs to us
            owns_process: profile_dir.is_some(),
            browser,
            page: Some(page),
            handler,
            profile_dir,
            timeout,
            url: None,
        }))
    }

    fn name(&self) -> &'static str {
        "chromium"
    }
}

/// Chromium 会话
pub struct ChromiumSession {
    browser: Browser,
    owns_process: bool,
    page: Option<Page>,
    handler: JoinHandle<()>,
    profile_dir: Option<PathBuf>,
    timeout: Duration,
    url: Option<String>,
}

impl ChromiumSession {
    fn page(&self) -> Result<&Page, DriverError> {
        self.page
            .as_ref()
            .ok_or_else(|| DriverError::Other("page already closed".to_string()))
    }

    async fn refresh_url(&mut self) {
        if let Some(page) = self.page.as_ref() {
            if let Ok(url) = page.url().await {
                self.url = url;
            }
        }
    }

    async fn evaluate_json(&self, script: String) -> Result<String, DriverError> {
        let page = self.page()?;
        within(self.timeout, async {
            page.evaluate(script)
                .await
                .map_err(|e| DriverError::Other(e.to_string()))?
                .into_value::<String>()
                .map_err(|e| DriverError::Other(e.to_string()))
        })
        .await
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn goto(&mut self, url: &str) -> Result<(), DriverError> {
        let page = self.page()?;
        within(self.timeout, async {
            page.goto(url)
                .await
                .map_err(|e| DriverError::Navigation(e.to_string()))?;
            Ok(())
        })
        .await?;
        self.url = Some(url.to_string());
        Ok(())
    }

    async fn wait_for_selector(&mut self, selector: &str) -> Result<(), DriverError> {
        let deadline = tokio::time::Instant::now() + self.timeout;
        loop {
            if self.exists(selector).await? {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(DriverError::Timeout(self.timeout));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn query(
        &mut self,
        selector: &str,
        probe: &ElementProbe,
    ) -> Result<Option<String>, DriverError> {
        let raw = self.evaluate_json(probe_script(selector, probe)).await?;
        serde_json::from_str::<Option<String>>(&raw).map_err(|e| DriverError::Other(e.to_string()))
    }

    async fn exists(&mut self, selector: &str) -> Result<bool, DriverError> {
        let raw = self.evaluate_json(exists_script(selector)).await?;
        Ok(raw == "true")
    }

    async fn click_and_wait(&mut self, selector: &str) -> Result<(), DriverError> {
        let page = self.page()?;
        within(self.timeout, async {
            page.find_element(selector)
                .await
                .map_err(|e| DriverError::ElementNotFound(format!("{}: {}", selector, e)))?
                .click()
                .await
                .map_err(|e| DriverError::Other(format!("Click failed: {}", e)))?;
            page.wait_for_navigation()
                .await
                .map_err(|e| DriverError::Navigation(e.to_string()))?;
            Ok(())
        })
        .await?;
        self.refresh_url().await;
        Ok(())
    }

    fn current_url(&self) -> Option<String> {
        self.url.clone()
    }

    async fn close(mut self: Box<Self>) -> Result<(), DriverError> {
        let mut result = Ok(());
        if self.owns_process {
            if let Err(e) = self.browser.close().await {
                result = Err(DriverError::Other(format!("Browser close failed: {}", e)));
            }
            let _ = self.browser.wait().await;
        } else if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                result = Err(DriverError::Other(format!("Page close failed: {}", e)));
            }
        }
        self.handler.abort();

        if let Some(dir) = self.profile_dir.take() {
            if let Err(e) = tokio::fs::remove_dir_all(&dir).await {
                tracing::debug!("Failed to remove browser profile {:?}: {}", dir, e);
            }
        }
        result
    }
}

async fn within<T, F>(timeout: Duration, fut: F) -> Result<T, DriverError>
where
    F: Future<Output = Result<T, DriverError>>,
{
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| DriverError::Timeout(timeout))?
}

/// 构造读取首个匹配元素内容的脚本
///
/// 脚本返回 JSON 字符串，避免 `undefined` 无法反序列化
fn probe_script(selector: &str, probe: &ElementProbe) -> String {
    let selector = js_string(selector);
    let read = match probe {
        ElementProbe::Text => "el.textContent == null ? null : el.textContent.trim()".to_string(),
        ElementProbe::InnerHtml => "el.innerHTML.trim()".to_string(),
        ElementProbe::Attribute(name) => format!("el.getAttribute({})", js_string(name)),
    };
    format!(
        "(() => {{ const el = document.querySelector({selector}); \
         if (!el) {{ return JSON.stringify(null); }} \
         const value = {read}; \
         return JSON.stringify(value == null ? null : String(value)); }})()"
    )
}

fn exists_script(selector: &str) -> String {
    format!(
        "(() => JSON.stringify(document.querySelector({}) !== null))()",
        js_string(selector)
    )
}

fn js_string(raw: &str) -> String {
    serde_json::Value::String(raw.to_string()).to_string()
}
