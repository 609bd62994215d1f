// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::scrape_record::{Extraction, ScrapeRecord};
use serde::Serialize;
use serde_json::{Number, Value};

/// 图表数据
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Visualization {
    /// 横轴标签（`YYYY-MM-DD`）
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

/// 一条数据序列
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub label: String,
    pub data: Vec<Value>,
    pub background_color: String,
    pub border_color: String,
    pub border_width: u32,
}

/// 可视化服务
pub struct VisualizationService;

impl VisualizationService {
    /// 基于成功记录构建图表数据
    ///
    /// # 参数
    ///
    /// * `records` - 按时间正序排列的成功记录
    /// * `first_field` - 抓取器第一个字段的名称
    ///
    /// # 返回值
    ///
    /// 两条序列：数据点与执行耗时。分页结果的数据点为页数，
    /// 单条结果在首字段为数值时取该值，否则为 1
    pub fn build(records: &[ScrapeRecord], first_field: Option<&str>) -> Visualization {
        let labels = records
            .iter()
            .map(|r| r.created_at.format("%Y-%m-%d").to_string())
            .collect();

        let points = records
            .iter()
            .map(|r| data_point(&r.payload, first_field))
            .collect();

        let durations = records
            .iter()
            .map(|r| Value::from(r.execution_time_ms))
            .collect();

        Visualization {
            labels,
            datasets: vec![
                Dataset {
                    label: "Data Points".to_string(),
                    data: points,
                    background_color: "rgba(54, 162, 235, 0.2)".to_string(),
                    border_color: "rgba(54, 162, 235, 1)".to_string(),
                    border_width: 1,
                },
                Dataset {
                    label: "Execution Time (ms)".to_string(),
                    data: durations,
                    background_color: "rgba(255, 99, 132, 0.2)".to_string(),
                    border_color: "rgba(255, 99, 132, 1)".to_string(),
                    border_width: 1,
                },
            ],
        }
    }
}

fn data_point(payload: &Extraction, first_field: Option<&str>) -> Value {
    match payload {
        Extraction::Paginated(pages) => Value::from(pages.len()),
        Extraction::Single(record) => first_field
            .and_then(|name| record.get(name))
            .and_then(numeric)
            .unwrap_or_else(|| Value::from(1)),
    }
}

fn numeric(value: &Value) -> Option<Value> {
    match value {
        Value::Number(_) => Some(value.clone()),
        Value::String(s) => {
            let parsed: f64 = s.trim().parse().ok()?;
            if parsed.fract() == 0.0 && parsed.abs() < i64::MAX as f64 {
                Some(Value::from(parsed as i64))
            } else {
                Number::from_f64(parsed).map(Value::Number)
            }
        }
        _ => None,
    }
}
