// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

const PASSWORD_SCHEME: &str = "pbkdf2-sha256";
/// 默认 PBKDF2 迭代次数
pub const DEFAULT_PASSWORD_ITERATIONS: u32 = 600_000;
const SALT_LEN: usize = 16;
const API_KEY_LEN: usize = 32;

/// 认证错误类型
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AuthError {
    /// 令牌格式或签名无效
    #[error("Invalid token")]
    InvalidToken,
    /// 令牌已过期
    #[error("Token expired")]
    Expired,
    /// 存储的密码哈希无法解析
    #[error("Malformed password hash")]
    MalformedHash,
    /// 密钥不可用
    #[error("Invalid key material: {0}")]
    Key(String),
}

/// 令牌声明
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: Uuid,
    exp: i64,
}

/// 认证服务
///
/// 负责签发与校验访问令牌、密码哈希与 API 密钥生成
#[derive(Clone)]
pub struct AuthService {
    secret: Vec<u8>,
    token_ttl_secs: i64,
    default_usage_limit: i64,
    password_iterations: u32,
}

impl AuthService {
    /// 创建认证服务
    ///
    /// # 参数
    ///
    /// * `secret` - 令牌签名密钥
    /// * `token_ttl_secs` - 令牌有效期（秒）
    /// * `default_usage_limit` - 新用户默认额度
    pub fn new(secret: impl Into<String>, token_ttl_secs: u64, default_usage_limit: i64) -> Self {
        Self {
            secret: secret.into().into_bytes(),
            token_ttl_secs: i64::try_from(token_ttl_secs).unwrap_or(i64::MAX),
            default_usage_limit,
            password_iterations: DEFAULT_PASSWORD_ITERATIONS,
        }
    }

    /// 设置新哈希使用的迭代次数，已存储的哈希按自身记录的次数校验
    pub fn with_password_iterations(mut self, iterations: u32) -> Self {
        self.password_iterations = iterations.max(1);
        self
    }

    pub fn password_iterations(&self) -> u32 {
        self.password_iterations
    }

    pub fn default_usage_limit(&self) -> i64 {
        self.default_usage_limit
    }

    fn mac(&self) -> Result<HmacSha256, AuthError> {
        HmacSha256::new_from_slice(&self.secret).map_err(|e| AuthError::Key(e.to_string()))
    }

    /// 为用户签发访问令牌
    ///
    /// 令牌格式为 `base64url(claims).hex(hmac)`
    pub fn issue_token(&self, user_id: Uuid) -> Result<String, AuthError> {
        let claims = Claims {
            sub: user_id,
            exp: Utc::now().timestamp().saturating_add(self.token_ttl_secs),
        };
        let body = serde_json::to_vec(&claims).map_err(|_| AuthError::InvalidToken)?;
        let encoded = URL_SAFE_NO_PAD.encode(body);

        let mut mac = self.mac()?;
        mac.update(encoded.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        Ok(format!("{}.{}", encoded, signature))
    }

    /// 校验访问令牌
    ///
    /// # 返回值
    ///
    /// * `Ok(Uuid)` - 令牌持有者的用户ID
    /// * `Err(AuthError)` - 签名不符、格式错误或已过期
    pub fn verify_token(&self, token: &str) -> Result<Uuid, AuthError> {
        let (encoded, signature) = token.split_once('.').ok_or(AuthError::InvalidToken)?;
        let signature = hex::decode(signature).map_err(|_| AuthError::InvalidToken)?;

        let mut mac = self.mac()?;
        mac.update(encoded.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::InvalidToken)?;

        let body = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|_| AuthError::InvalidToken)?;
        let claims: Claims = serde_json::from_slice(&body).map_err(|_| AuthError::InvalidToken)?;

        if claims.exp < Utc::now().timestamp() {
            return Err(AuthError::Expired);
        }
        Ok(claims.sub)
    }

    /// 计算密码哈希
    ///
    /// 随机盐 + PBKDF2-HMAC-SHA256，格式 `scheme$iterations$salt$hash`
    pub fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let mut salt = [0u8; SALT_LEN];
        rand::rng().fill_bytes(&mut salt);
        let derived = derive_key(password.as_bytes(), &salt, self.password_iterations);
        Ok(format!(
            "{}${}${}${}",
            PASSWORD_SCHEME,
            self.password_iterations,
            hex::encode(salt),
            hex::encode(derived)
        ))
    }

    /// 校验密码
    pub fn verify_password(&self, password: &str, stored: &str) -> Result<bool, AuthError> {
        let mut parts = stored.split('$');
        let (Some(scheme), Some(iterations), Some(salt), Some(hash), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return Err(AuthError::MalformedHash);
        };
        if scheme != PASSWORD_SCHEME {
            return Err(AuthError::MalformedHash);
        }
        let iterations: u32 = iterations.parse().map_err(|_| AuthError::MalformedHash)?;
        if iterations == 0 {
            return Err(AuthError::MalformedHash);
        }
        let salt = hex::decode(salt).map_err(|_| AuthError::MalformedHash)?;
        let expected = hex::decode(hash).map_err(|_| AuthError::MalformedHash)?;

        let derived = derive_key(password.as_bytes(), &salt, iterations);
        // Compare MACs over both keys so the check runs in constant time
        let mut mac = self.mac()?;
        mac.update(&derived);
        let tag = mac.finalize().into_bytes();
        let mut mac = self.mac()?;
        mac.update(&expected);
        Ok(mac.verify_slice(&tag).is_ok())
    }

    /// 生成新的 API 密钥（64 位十六进制）
    pub fn generate_api_key(&self) -> String {
        let mut bytes = [0u8; API_KEY_LEN];
        rand::rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }
}

/// PBKDF2-HMAC-SHA256，输出 32 字节
fn derive_key(password: &[u8], salt: &[u8], iterations: u32) -> [u8; 32] {
    pbkdf2::pbkdf2_hmac_array::<Sha256, 32>(password, salt, iterations)
}
