//! 访问令牌提供者 - 基础设施层
//!
//! 用 JWT 断言换取 Bearer 令牌，并在进程内缓存

use crate::config::Config;
use crate::error::{AppResult, AuthError};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// 访问令牌提供者
///
/// 职责：
/// - 缓存当前令牌（进程生命周期内）
/// - 缓存为空时向 OAuth 端点换取新令牌
/// - 不负责重试，401 的处理由调用方决定
pub struct TokenProvider {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    assertion: String,
    cached: RwLock<Option<String>>,
}

impl TokenProvider {
    /// 创建新的令牌提供者
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        Self {
            http,
            token_url: config.oauth_token_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            assertion: config.jwt_assertion.clone(),
            cached: RwLock::new(None),
        }
    }

    /// 获取令牌：有缓存直接返回，否则换取并缓存
    pub async fn token(&self) -> AppResult<String> {
        if let Some(token) = self.cached.read().await.as_ref() {
            return Ok(token.clone());
        }

        let mut slot = self.cached.write().await;
        // 等锁期间可能已被其他请求填上
        if let Some(token) = slot.as_ref() {
            return Ok(token.clone());
        }
        let token = self.obtain().await?;
        *slot = Some(token.clone());
        Ok(token)
    }

    /// 丢弃缓存的令牌
    pub async fn invalidate(&self) {
        *self.cached.write().await = None;
    }

    /// 强制换取新令牌
    pub async fn refresh(&self) -> AppResult<String> {
        let token = self.obtain().await?;
        *self.cached.write().await = Some(token.clone());
        Ok(token)
    }

    /// 直接设置令牌（命令行工具、测试）
    pub async fn set(&self, token: impl Into<String>) {
        *self.cached.write().await = Some(token.into());
    }

    /// 向 OAuth 端点换取令牌
    async fn obtain(&self) -> AppResult<String> {
        if self.assertion.is_empty() {
            return Err(AuthError::MissingAssertion.into());
        }
        info!("🔑 正在获取访问令牌: {}", self.token_url);

        let form = [
            ("grant_type", JWT_BEARER_GRANT),
            ("assertion", self.assertion.as_str()),
        ];
        let mut request = self
            .http
            .post(&self.token_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&form);
        if !self.client_id.is_empty() {
            request = request.basic_auth(&self.client_id, Some(&self.client_secret));
        }

        let response = request.send().await.map_err(|e| {
            warn!("令牌请求失败: {}", e);
            AuthError::TokenExchangeFailed {
                message: e.to_string(),
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("令牌端点返回 {}: {}", status, body);
            return Err(AuthError::TokenExchangeFailed {
                message: format!("status {}: {}", status.as_u16(), body),
            }
            .into());
        }

        let parsed: TokenResponse =
            response
                .json()
                .await
                .map_err(|e| AuthError::TokenExchangeFailed {
                    message: e.to_string(),
                })?;
        debug!("访问令牌获取成功");
        Ok(parsed.access_token)
    }
}
