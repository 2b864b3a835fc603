//! 带认证的 HTTP 通道 - 基础设施层
//!
//! 所有对工作流平台的调用都经过这里：附加 Bearer 令牌，
//! 遇到 401 时刷新令牌并且只重试一次。

use crate::error::{ApiError, AppError, AppResult};
use crate::infrastructure::TokenProvider;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

/// 带认证的 HTTP 通道
pub struct AuthorizedHttp {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenProvider,
}

impl AuthorizedHttp {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, tokens: TokenProvider) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
        }
    }

    pub fn tokens(&self) -> &TokenProvider {
        &self.tokens
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        self.send(Method::GET, path, None::<&()>).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> AppResult<T> {
        self.send(Method::POST, path, Some(body)).await
    }

    /// 发送请求；401 时刷新令牌并重试一次，第二次的结果直接返回
    async fn send<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> AppResult<T> {
        let endpoint = format!("{}{}", self.base_url, path);
        debug!("Endpoint: {} {}", method, endpoint);

        let mut token = self.tokens.token().await?;
        let mut response = self.dispatch(&method, &endpoint, body, &token).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            warn!("请求 {} 返回 401，刷新令牌后重试", endpoint);
            self.tokens.invalidate().await;
            token = self.tokens.refresh().await?;
            response = self.dispatch(&method, &endpoint, body, &token).await?;
        }

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::api_request_failed(&endpoint, e))?;

        if !status.is_success() {
            let body = parse_error_body(&bytes);
            warn!("请求 {} 失败: {} {}", endpoint, status.as_u16(), body);
            return Err(ApiError::BadStatus {
                endpoint,
                status: status.as_u16(),
                body,
            }
            .into());
        }

        // 空响应体按 null 处理
        let slice: &[u8] = if bytes.is_empty() { b"null" } else { &bytes };
        serde_json::from_slice(slice)
            .map_err(|source| ApiError::JsonParseFailed { endpoint, source }.into())
    }

    async fn dispatch<B: Serialize + ?Sized>(
        &self,
        method: &Method,
        endpoint: &str,
        body: Option<&B>,
        token: &str,
    ) -> AppResult<reqwest::Response> {
        let mut request = self
            .http
            .request(method.clone(), endpoint)
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }
        request
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))
    }
}

/// 上游错误体：能解析成 JSON 就用 JSON，否则保留原文
fn parse_error_body(bytes: &[u8]) -> JsonValue {
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| JsonValue::String(String::from_utf8_lossy(bytes).into_owned()))
}
