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

use crate::domain::repositories::user_repository::UserRepository;
use crate::domain::services::auth_service::AuthService;
use crate::presentation::errors::{ApiError, AppError};
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

const API_KEY_HEADER: &str = "x-api-key";

/// 认证状态
#[derive(Clone)]
pub struct AuthState {
    /// 令牌服务
    pub auth: AuthService,
    /// 用户仓库
    pub users: Arc<dyn UserRepository>,
}

/// 令牌认证中间件
///
/// 校验 `Authorization: Bearer <token>`，并把当前用户注入请求扩展
///
/// # 参数
///
/// * `state` - 认证状态
/// * `req` - HTTP请求
/// * `next` - 下一个中间件
///
/// # 返回值
///
/// * `Ok(Response)` - 认证成功的响应
/// * `Err(AppError)` - 401 或内部错误
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    debug!("AuthMiddleware processing path: {}", req.uri().path());

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Not authorized to access this route".into()))?;

    let user_id = state.auth.verify_token(token).map_err(|e| {
        debug!("Rejected bearer token: {}", e);
        ApiError::Unauthorized("Not authorized to access this route".into())
    })?;

    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User no longer exists".into()))?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// API 密钥认证中间件
///
/// 校验 `x-api-key` 请求头并执行额度闸门：额度用尽时返回 429，
/// 不会进入后续处理。检查与计数之间不做预留
pub async fn api_key_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let api_key = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|key| !key.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("API key is required".into()))?;

    let user = state
        .users
        .find_by_api_key(api_key)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid API key".into()))?;

    if !user.has_quota() {
        tracing::warn!(user_id = %user.id, "API usage limit exceeded");
        return Err(ApiError::QuotaExceeded.into());
    }

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}
