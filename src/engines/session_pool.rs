// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::traits::{BrowserDriver, BrowserSession, DriverError, SessionOptions};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// 浏览器会话池
///
/// 用信号量限制同时存在的会话数量。许可在会话的整个生命周期内持有，
/// 会话关闭时一并归还
#[derive(Clone)]
pub struct SessionPool {
    /// 底层驱动
    driver: Arc<dyn BrowserDriver>,
    /// 会话许可
    permits: Arc<Semaphore>,
    /// 许可总数
    capacity: usize,
}

impl SessionPool {
    /// 创建一个新的会话池
    ///
    /// # 参数
    ///
    /// * `driver` - 浏览器驱动
    /// * `max_sessions` - 最大并发会话数，0 按 1 处理
    ///
    /// # 返回值
    ///
    /// 返回新的SessionPool实例
    pub fn new(driver: Arc<dyn BrowserDriver>, max_sessions: usize) -> Self {
        let capacity = max_sessions.max(1);
        Self {
            driver,
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// 获取许可并启动会话
    ///
    /// 池满时等待；启动失败时立即归还许可
    ///
    /// # 参数
    ///
    /// * `options` - 会话选项
    ///
    /// # 返回值
    ///
    /// * `Ok(PooledSession)` - 持有许可的会话
    /// * `Err(DriverError)` - 启动失败
    pub async fn acquire(&self, options: &SessionOptions) -> Result<PooledSession, DriverError> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| DriverError::Other(format!("session pool closed: {}", e)))?;

        tracing::debug!(
            "Launching {} session ({} of {} slots free)",
            self.driver.name(),
            self.permits.available_permits(),
            self.capacity
        );
        let session = self.driver.launch(options).await?;

        Ok(PooledSession {
            session,
            _permit: permit,
        })
    }

    /// 当前空闲的许可数
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    pub fn driver_name(&self) -> &'static str {
        self.driver.name()
    }
}

/// 持有池许可的会话
pub struct PooledSession {
    session: Box<dyn BrowserSession>,
    _permit: OwnedSemaphorePermit,
}

impl PooledSession {
    /// 页面句柄
    pub fn page(&mut self) -> &mut dyn BrowserSession {
        self.session.as_mut()
    }

    /// 关闭会话并归还许可
    pub async fn release(self) -> Result<(), DriverError> {
        let PooledSession { session, _permit } = self;
        session.close().await
    }
}
