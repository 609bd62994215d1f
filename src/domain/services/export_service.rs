// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::scrape_record::Extraction;
use serde_json::Value;
use thiserror::Error;

/// 导出错误类型
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Encoding error: {0}")]
    Encoding(String),
}

/// 导出服务
///
/// 将一条记录的提取结果转换为 CSV 或 JSON 文档
pub struct ExportService;

impl ExportService {
    /// 导出为 CSV
    ///
    /// 表头取第一行的字段名；后续行缺失的字段输出为空，null 同样输出为空
    ///
    /// # 参数
    ///
    /// * `payload` - 提取结果
    ///
    /// # 返回值
    ///
    /// * `Ok(String)` - CSV 文本，没有任何字段时为空字符串
    /// * `Err(ExportError)` - 写入失败
    pub fn to_csv(payload: &Extraction) -> Result<String, ExportError> {
        let rows = payload.rows();
        let Some(first) = rows.first() else {
            return Ok(String::new());
        };
        let header: Vec<&str> = first.keys().map(String::as_str).collect();
        if header.is_empty() {
            return Ok(String::new());
        }

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&header)?;
        for row in &rows {
            writer.write_record(header.iter().map(|key| cell(row.get(*key))))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| ExportError::Encoding(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| ExportError::Encoding(e.to_string()))
    }

    /// 导出为格式化的 JSON
    pub fn to_json(payload: &Extraction) -> Result<Vec<u8>, ExportError> {
        Ok(serde_json::to_vec_pretty(payload)?)
    }
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
