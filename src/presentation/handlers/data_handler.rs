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

use axum::{
    extract::{Extension, Path},
    http::header,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        models::{scrape_record::ScrapeRecord, user::User},
        repositories::{
            scrape_record_repository::ScrapeRecordRepository,
            scraper_repository::ScraperRepository,
        },
        services::{export_service::ExportService, visualization_service::VisualizationService},
    },
    presentation::errors::{ApiError, AppError},
};

async fn load_record<R: ScrapeRecordRepository>(
    records: &R,
    id: Uuid,
    user: &User,
) -> Result<ScrapeRecord, AppError> {
    Ok(records
        .find_owned(id, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Data not found".into()))?)
}

fn attachment(id: Uuid, extension: &str) -> String {
    format!("attachment; filename=data-{}.{}", id, extension)
}

/// 以 CSV 附件导出一条记录
pub async fn export_csv<R: ScrapeRecordRepository + 'static>(
    Extension(records): Extension<Arc<R>>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let record = load_record(records.as_ref(), id, &user).await?;
    let csv = ExportService::to_csv(&record.payload)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, attachment(id, "csv")),
        ],
        csv,
    ))
}

/// 以 JSON 附件导出一条记录的结果
pub async fn export_json<R: ScrapeRecordRepository + 'static>(
    Extension(records): Extension<Arc<R>>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let record = load_record(records.as_ref(), id, &user).await?;
    let body = ExportService::to_json(&record.payload)?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, attachment(id, "json")),
        ],
        body,
    ))
}

/// 抓取器成功记录的图表数据
pub async fn visualization<S, R>(
    Extension(scrapers): Extension<Arc<S>>,
    Extension(records): Extension<Arc<R>>,
    Extension(user): Extension<User>,
    Path(scraper_id): Path<Uuid>,
) -> Result<Json<Value>, AppError>
where
    S: ScraperRepository + 'static,
    R: ScrapeRecordRepository + 'static,
{
    let scraper = scrapers
        .find_owned(scraper_id, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Scraper not found".into()))?;

    let history = records.successful_by_scraper(scraper.id).await?;
    let first_field = scraper.selectors.first().map(|field| field.name.as_str());
    let visualization = VisualizationService::build(&history, first_field);

    Ok(Json(
        json!({ "success": true, "visualization": visualization }),
    ))
}
