// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::MetricsSettings;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::info;

/// 安装 Prometheus 指标导出器
///
/// 未启用或地址无效时只记录日志，不影响服务启动
pub fn init_metrics(settings: &MetricsSettings) {
    if !settings.enabled {
        info!("Metrics exporter disabled");
        return;
    }

    let addr: SocketAddr = match settings.listen_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::warn!("Invalid metrics address {}: {}", settings.listen_addr, e);
            return;
        }
    };

    // Port may already be taken in development
    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        tracing::warn!("Failed to install Prometheus recorder: {}", e);
        return;
    }

    describe();
    info!("Metrics exporter listening on {}", addr);
}

fn describe() {
    metrics::describe_counter!("scrape_jobs_total", "Scrape runs by final status");
    metrics::describe_histogram!(
        "scrape_job_duration_seconds",
        metrics::Unit::Seconds,
        "Wall-clock time from job start to extraction completion"
    );
    metrics::describe_counter!("scrape_pages_total", "Pages extracted by successful runs");
    metrics::describe_counter!("webhook_delivery_attempts_total", "Webhook POSTs attempted");
    metrics::describe_counter!("webhook_delivery_failed_total", "Webhook POSTs that failed");
}
