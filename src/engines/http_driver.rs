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
use scraper::{Html, Selector};
use url::Url;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; scrapeflow/0.1)";

/// HTTP 驱动
///
/// 基于 reqwest 与 scraper 的静态页面驱动，不执行 JavaScript。
/// 只有连接或传输错误才算导航失败，非 2xx 响应的页面照常加载。
/// "点击" 通过跟随首个匹配元素的 `href` 实现
#[derive(Debug, Default, Clone)]
pub struct HttpDriver;

#[async_trait]
impl BrowserDriver for HttpDriver {
    /// 创建 HTTP 会话
    ///
    /// 每个会话拥有独立的客户端与 Cookie 存储
    async fn launch(
        &self,
        options: &SessionOptions,
    ) -> Result<Box<dyn BrowserSession>, DriverError> {
        let client = reqwest::Client::builder()
            .user_agent(
                options
                    .user_agent
                    .clone()
                    .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            )
            .timeout(options.timeout)
            .cookie_store(true)
            .build()?;

        Ok(Box::new(HttpSession {
            client,
            url: None,
            document: None,
        }))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// HTTP 会话
pub struct HttpSession {
    client: reqwest::Client,
    url: Option<Url>,
    document: Option<String>,
}

impl HttpSession {
    fn document(&self) -> Result<&str, DriverError> {
        self.document
            .as_deref()
            .ok_or_else(|| DriverError::Navigation("no page loaded".to_string()))
    }
}

#[async_trait]
impl BrowserSession for HttpSession {
    async fn goto(&mut self, url: &str) -> Result<(), DriverError> {
        let target = Url::parse(url).map_err(|e| DriverError::Navigation(e.to_string()))?;
        let response = self.client.get(target).send().await?;
        // Error pages still load and are extracted like a browser would
        let status = response.status();
        let final_url = response.url().clone();
        let body = response.text().await?;

        tracing::debug!("Loaded {} ({}, {} bytes)", final_url, status, body.len());
        self.url = Some(final_url);
        self.document = Some(body);
        Ok(())
    }

    async fn wait_for_selector(&mut self, selector: &str) -> Result<(), DriverError> {
        // Static documents never change after load
        if self.exists(selector).await? {
            Ok(())
        } else {
            Err(DriverError::ElementNotFound(selector.to_string()))
        }
    }

    async fn query(
        &mut self,
        selector: &str,
        probe: &ElementProbe,
    ) -> Result<Option<String>, DriverError> {
        first_match(self.document()?, selector, probe)
    }

    async fn exists(&mut self, selector: &str) -> Result<bool, DriverError> {
        Ok(first_match(self.document()?, selector, &ElementProbe::Text)?.is_some())
    }

    async fn click_and_wait(&mut self, selector: &str) -> Result<(), DriverError> {
        let href = first_match(
            self.document()?,
            selector,
            &ElementProbe::Attribute("href".to_string()),
        )?
        .ok_or_else(|| DriverError::ElementNotFound(format!("{} (with href)", selector)))?;

        let next = resolve_link(self.url.as_ref(), &href)?;
        self.goto(next.as_str()).await
    }

    fn current_url(&self) -> Option<String> {
        self.url.as_ref().map(Url::to_string)
    }

    async fn close(self: Box<Self>) -> Result<(), DriverError> {
        Ok(())
    }
}

/// 在文档中读取首个匹配元素的内容
///
/// `Html` 不是 `Send`，解析只在这个同步函数内进行
fn first_match(
    document: &str,
    selector: &str,
    probe: &ElementProbe,
) -> Result<Option<String>, DriverError> {
    let parsed = Selector::parse(selector)
        .map_err(|e| DriverError::Other(format!("Invalid selector {}: {}", selector, e)))?;
    let html = Html::parse_document(document);
    let Some(element) = html.select(&parsed).next() else {
        return Ok(None);
    };

    Ok(match probe {
        ElementProbe::Text => Some(element.text().collect::<String>().trim().to_string()),
        ElementProbe::InnerHtml => Some(element.inner_html().trim().to_string()),
        ElementProbe::Attribute(name) => element.value().attr(name).map(str::to_string),
    })
}

fn resolve_link(base: Option<&Url>, href: &str) -> Result<Url, DriverError> {
    match base {
        Some(base) => base.join(href),
        None => Url::parse(href),
    }
    .map_err(|e| DriverError::Navigation(format!("Invalid link {}: {}", href, e)))
}
