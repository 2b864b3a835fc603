//! 代理转发
//!
//! 只允许访问白名单内的主机（含端口），不跟随重定向

use crate::error::{AppResult, ProxyError};
use reqwest::redirect::Policy;
use reqwest::Url;
use serde_json::Value as JsonValue;
use tracing::{info, warn};

/// 代理白名单检查和转发
pub struct ProxyGate {
    http: reqwest::Client,
    allowed_hosts: Vec<String>,
}

impl ProxyGate {
    /// 白名单条目为 `host` 或 `host:port`；只写主机时仅允许协议默认端口
    pub fn new(allowed_hosts: Vec<String>) -> AppResult<Self> {
        // 重定向目标绕过白名单，3xx 直接按失败处理
        let http = reqwest::Client::builder()
            .redirect(Policy::none())
            .build()
            .map_err(|source| ProxyError::ClientBuildFailed { source })?;
        Ok(Self {
            http,
            allowed_hosts: allowed_hosts
                .into_iter()
                .map(|h| h.trim().to_ascii_lowercase())
                .collect(),
        })
    }

    /// 检查 url：必须是 http(s)，主机和端口必须在白名单内
    pub fn check(&self, raw: Option<&str>) -> AppResult<Url> {
        let raw = raw.map(str::trim).filter(|u| !u.is_empty()).ok_or(ProxyError::MissingUrl)?;
        let url = Url::parse(raw).map_err(|_| ProxyError::InvalidUrl {
            url: raw.to_string(),
        })?;
        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(ProxyError::InvalidUrl {
                url: raw.to_string(),
            }
            .into());
        }
        let host = url
            .host_str()
            .ok_or_else(|| ProxyError::InvalidUrl {
                url: raw.to_string(),
            })?
            .to_ascii_lowercase();
        // url.port() 在默认端口时为 None
        let port = url.port();
        if !self.allowed_hosts.iter().any(|entry| entry_matches(entry, &host, port)) {
            let target = match port {
                Some(port) => format!("{}:{}", host, port),
                None => host,
            };
            warn!("拒绝代理请求，主机不在白名单内: {}", target);
            return Err(ProxyError::HostNotAllowed { host: target }.into());
        }
        Ok(url)
    }

    /// 检查后转发 GET 请求，返回 JSON
    pub async fn fetch(&self, raw: Option<&str>) -> AppResult<JsonValue> {
        let url = self.check(raw)?;
        info!("代理请求: {}", url);

        let response = self.http.get(url).send().await.map_err(fetch_failed)?;
        let status = response.status();
        if !status.is_success() {
            if status.is_redirection() {
                warn!("代理目标返回重定向 {}，不跟随", status.as_u16());
            }
            return Err(ProxyError::FetchFailed {
                message: format!("status {}", status.as_u16()),
            }
            .into());
        }
        let data = response.json().await.map_err(fetch_failed)?;
        Ok(data)
    }
}

/// 白名单条目是否匹配主机和显式端口
fn entry_matches(entry: &str, host: &str, port: Option<u16>) -> bool {
    let (entry_host, entry_port) = match entry.rsplit_once(':') {
        Some((h, p)) if !h.is_empty() => match p.parse::<u16>() {
            Ok(p) => (h, Some(p)),
            Err(_) => (entry, None),
        },
        _ => (entry, None),
    };
    entry_host == host && entry_port == port
}

fn fetch_failed(e: reqwest::Error) -> ProxyError {
    warn!("Error fetching data: {}", e);
    ProxyError::FetchFailed {
        message: e.to_string(),
    }
}
