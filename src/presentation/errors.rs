// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

use crate::application::use_cases::run_scraper::RunScraperError;
use crate::domain::repositories::RepositoryError;
use crate::domain::services::auth_service::AuthError;

/// 面向客户端的错误
#[derive(Error, Debug)]
pub enum ApiError {
    /// 请求内容不合法
    #[error("{0}")]
    BadRequest(String),
    /// 字段校验失败
    #[error("Validation failed")]
    Validation(#[from] ValidationErrors),
    /// 未认证或凭据无效
    #[error("{0}")]
    Unauthorized(String),
    /// 资源不存在或不属于调用方
    #[error("{0}")]
    NotFound(String),
    /// 调用额度已用完
    #[error("API usage limit exceeded")]
    QuotaExceeded,
}

/// 应用错误类型
///
/// 封装所有可能的应用层错误，提供统一的错误处理接口
#[derive(Debug)]
pub struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(ApiError::Validation(errors)) = self.0.downcast_ref::<ApiError>() {
            let body = Json(json!({ "success": false, "errors": field_errors(errors) }));
            return (StatusCode::BAD_REQUEST, body).into_response();
        }

        let (status, message) = self.classify();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Request failed: {:#}", self.0);
        }

        let body = Json(json!({ "success": false, "message": message }));
        (status, body).into_response()
    }
}

impl AppError {
    fn classify(&self) -> (StatusCode, String) {
        if let Some(err) = self.0.downcast_ref::<ApiError>() {
            let status = match err {
                ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
                ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
                ApiError::NotFound(_) => StatusCode::NOT_FOUND,
                ApiError::QuotaExceeded => StatusCode::TOO_MANY_REQUESTS,
            };
            return (status, err.to_string());
        }

        let repository = self.0.downcast_ref::<RepositoryError>().or_else(|| {
            match self.0.downcast_ref::<RunScraperError>() {
                Some(RunScraperError::Repository(e)) => Some(e),
                _ => None,
            }
        });
        match repository {
            Some(RepositoryError::NotFound) => {
                return (StatusCode::NOT_FOUND, "Resource not found".to_string())
            }
            Some(RepositoryError::Conflict(message)) => {
                return (StatusCode::BAD_REQUEST, message.clone())
            }
            _ => {}
        }

        if let Some(RunScraperError::Invalid(e)) = self.0.downcast_ref::<RunScraperError>() {
            return (StatusCode::BAD_REQUEST, e.to_string());
        }

        if let Some(AuthError::InvalidToken | AuthError::Expired) =
            self.0.downcast_ref::<AuthError>()
        {
            return (
                StatusCode::UNAUTHORIZED,
                "Not authorized to access this route".to_string(),
            );
        }

        (StatusCode::INTERNAL_SERVER_ERROR, "Server Error".to_string())
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

/// 展开字段错误，字段名转为驼峰并按名称排序
fn field_errors(errors: &ValidationErrors) -> Vec<serde_json::Value> {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .flat_map(|(field, errors)| {
            let field = camel_case(&field);
            errors.iter().map(move |error| {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value ({})", error.code));
                json!({ "field": field, "message": message })
            })
        })
        .collect()
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}
