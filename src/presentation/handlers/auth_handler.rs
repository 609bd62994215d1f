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

use crate::application::dto::auth_request::{
    LoginRequestDto, RegisterRequestDto, WebhookUrlRequestDto,
};
use crate::domain::models::user::{NewUser, Role, User};
use crate::domain::repositories::user_repository::UserRepository;
use crate::domain::services::auth_service::AuthService;
use crate::presentation::errors::{ApiError, AppError};
use crate::presentation::extractors::api_json::ApiJson;
use axum::{http::StatusCode, Extension, Json};
use serde_json::{json, Value};
use std::sync::Arc;
use validator::Validate;

fn summary(user: &User) -> Value {
    json!({
        "id": user.id,
        "name": user.name,
        "email": user.email,
        "apiKey": user.api_key,
        "role": user.role,
    })
}

/// 注册新用户
///
/// 成功返回 201 与访问令牌；邮箱已注册时返回 400
pub async fn register<U: UserRepository + 'static>(
    Extension(users): Extension<Arc<U>>,
    Extension(auth): Extension<AuthService>,
    ApiJson(payload): ApiJson<RegisterRequestDto>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    payload.validate().map_err(ApiError::Validation)?;

    let new_user = NewUser {
        name: payload.name.trim().to_string(),
        email: payload.email.trim().to_string(),
        password_hash: auth.hash_password(&payload.password)?,
        api_key: auth.generate_api_key(),
        role: Role::User,
        usage_limit: auth.default_usage_limit(),
    };
    let user = users.create(&new_user.into_user()).await?;
    let token = auth.issue_token(user.id)?;

    tracing::info!(user_id = %user.id, "User registered");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "token": token, "user": summary(&user) })),
    ))
}

/// 登录
///
/// 邮箱不存在与密码错误返回相同的 401
pub async fn login<U: UserRepository + 'static>(
    Extension(users): Extension<Arc<U>>,
    Extension(auth): Extension<AuthService>,
    ApiJson(payload): ApiJson<LoginRequestDto>,
) -> Result<Json<Value>, AppError> {
    payload.validate().map_err(ApiError::Validation)?;

    let invalid = || ApiError::Unauthorized("Invalid credentials".into());
    let user = users
        .find_by_email(payload.email.trim())
        .await?
        .ok_or_else(invalid)?;

    if !auth.verify_password(&payload.password, &user.password_hash)? {
        return Err(invalid().into());
    }

    let token = auth.issue_token(user.id)?;
    Ok(Json(
        json!({ "success": true, "token": token, "user": summary(&user) }),
    ))
}

/// 当前用户信息
pub async fn me(Extension(user): Extension<User>) -> Json<Value> {
    Json(json!({ "success": true, "user": user }))
}

/// 重新生成 API 密钥，旧密钥立即失效
pub async fn regenerate_api_key<U: UserRepository + 'static>(
    Extension(users): Extension<Arc<U>>,
    Extension(auth): Extension<AuthService>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let api_key = auth.generate_api_key();
    users.update_api_key(user.id, &api_key).await?;
    Ok(Json(json!({ "success": true, "apiKey": api_key })))
}

/// 设置账户级 Webhook 地址
pub async fn update_webhook<U: UserRepository + 'static>(
    Extension(users): Extension<Arc<U>>,
    Extension(user): Extension<User>,
    ApiJson(payload): ApiJson<WebhookUrlRequestDto>,
) -> Result<Json<Value>, AppError> {
    payload.validate().map_err(ApiError::Validation)?;

    users.update_webhook_url(user.id, &payload.webhook_url).await?;
    Ok(Json(
        json!({ "success": true, "webhookUrl": payload.webhook_url }),
    ))
}
