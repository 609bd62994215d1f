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
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    application::{
        dto::{data_query::PageQuery, scraper_request::ScraperRequestDto},
        use_cases::run_scraper::{RunOutcome, RunScraperUseCase},
    },
    domain::{
        models::{scraper::Scraper, user::User},
        repositories::{
            scrape_record_repository::ScrapeRecordRepository,
            scraper_repository::ScraperRepository, user_repository::UserRepository,
        },
    },
    presentation::{
        errors::{ApiError, AppError},
        extractors::api_json::ApiJson,
    },
};

fn scraper_not_found() -> ApiError {
    ApiError::NotFound("Scraper not found".into())
}

async fn load_owned<S: ScraperRepository>(
    scrapers: &S,
    id: Uuid,
    user: &User,
) -> Result<Scraper, AppError> {
    Ok(scrapers
        .find_owned(id, user.id)
        .await?
        .ok_or_else(scraper_not_found)?)
}

/// 创建抓取器
pub async fn create_scraper<S: ScraperRepository + 'static>(
    Extension(scrapers): Extension<Arc<S>>,
    Extension(user): Extension<User>,
    ApiJson(payload): ApiJson<ScraperRequestDto>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    payload.validate().map_err(ApiError::Validation)?;

    let scraper = Scraper::new(user.id, payload.into_draft(None));
    scraper
        .validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let scraper = scrapers.create(&scraper).await?;
    tracing::info!(scraper_id = %scraper.id, user_id = %user.id, "Scraper created");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": scraper })),
    ))
}

/// 列出调用方的抓取器，最新的在前
pub async fn list_scrapers<S: ScraperRepository + 'static>(
    Extension(scrapers): Extension<Arc<S>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let data = scrapers.list_by_user(user.id).await?;
    Ok(Json(
        json!({ "success": true, "count": data.len(), "data": data }),
    ))
}

/// 获取单个抓取器
pub async fn get_scraper<S: ScraperRepository + 'static>(
    Extension(scrapers): Extension<Arc<S>>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let scraper = load_owned(scrapers.as_ref(), id, &user).await?;
    Ok(Json(json!({ "success": true, "data": scraper })))
}

/// 全量更新可编辑字段
///
/// 调度的最近运行时间由服务端维护，更新时保留原值
pub async fn update_scraper<S: ScraperRepository + 'static>(
    Extension(scrapers): Extension<Arc<S>>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    ApiJson(payload): ApiJson<ScraperRequestDto>,
) -> Result<Json<Value>, AppError> {
    let mut scraper = load_owned(scrapers.as_ref(), id, &user).await?;
    payload.validate().map_err(ApiError::Validation)?;

    scraper.apply(payload.into_draft(scraper.schedule.last_run));
    scraper
        .validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let scraper = scrapers.update(&scraper).await?;
    Ok(Json(json!({ "success": true, "data": scraper })))
}

/// 删除抓取器及其全部记录
pub async fn delete_scraper<S: ScraperRepository + 'static>(
    Extension(scrapers): Extension<Arc<S>>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    if !scrapers.delete_owned(id, user.id).await? {
        return Err(scraper_not_found().into());
    }
    tracing::info!(scraper_id = %id, "Scraper deleted");
    Ok(Json(json!({ "success": true, "data": {} })))
}

/// 运行抓取器
///
/// 令牌路径与 API 密钥路径共用此处理器；额度检查在 API 密钥中间件中完成
pub async fn run_scraper<U, S, R>(
    Extension(runner): Extension<Arc<RunScraperUseCase<U, S, R>>>,
    Extension(scrapers): Extension<Arc<S>>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError>
where
    U: UserRepository + 'static,
    S: ScraperRepository + 'static,
    R: ScrapeRecordRepository + 'static,
{
    let scraper = load_owned(scrapers.as_ref(), id, &user).await?;
    let outcome = runner.execute(&scraper).await?;
    Ok(run_response(outcome))
}

fn run_response(outcome: RunOutcome) -> Response {
    match outcome {
        RunOutcome::Succeeded(record) => {
            (StatusCode::OK, Json(json!({ "success": true, "data": record }))).into_response()
        }
        RunOutcome::Failed(record) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "success": false,
                "message": "Scraping failed",
                "error": record.error,
                "data": record,
            })),
        )
            .into_response(),
    }
}

/// 分页获取抓取器的记录，最新的在前
pub async fn get_scraped_data<S, R>(
    Extension(scrapers): Extension<Arc<S>>,
    Extension(records): Extension<Arc<R>>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Value>, AppError>
where
    S: ScraperRepository + 'static,
    R: ScrapeRecordRepository + 'static,
{
    let scraper = load_owned(scrapers.as_ref(), id, &user).await?;
    let (page, limit) = (query.page(), query.limit());
    let (data, total) = records.list_by_scraper(scraper.id, page, limit).await?;

    Ok(Json(json!({
        "success": true,
        "count": total,
        "totalPages": total.div_ceil(limit),
        "currentPage": page,
        "data": data,
    })))
}
