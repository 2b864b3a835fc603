use crate::error::{AppResult, ConfigError};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// 标识符缓存的存储方式
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// 进程内存（重启后丢失）
    Memory,
    /// 浏览器 Cookie
    Cookie,
}

impl FromStr for CacheBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(CacheBackend::Memory),
            "cookie" => Ok(CacheBackend::Cookie),
            other => Err(format!("未知的缓存方式: {}", other)),
        }
    }
}

/// 程序配置
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP 服务监听地址
    pub bind_addr: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- 工作流平台 API ---
    pub api_base_url: String,
    pub oauth_token_url: String,
    pub client_id: String,
    pub client_secret: String,
    /// 长期有效的 JWT 断言
    pub jwt_assertion: String,
    // --- 固定资源名称 ---
    pub organization_name: String,
    pub organization_subdomain: String,
    pub template_name: String,
    pub template_description: String,
    pub redirect_url: String,
    pub document_name: String,
    /// 文档 base64 内容文件
    pub document_content_path: String,
    /// 分享链接有效期
    pub share_link_expire: u32,
    // --- 缓存 ---
    pub cache_backend: CacheBackend,
    /// Cookie 有效期（秒）
    pub cookie_max_age_secs: u64,
    /// 代理允许访问的主机，`host` 或 `host:port`
    pub proxy_allowed_hosts: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            verbose_logging: false,
            api_base_url: "https://api.airslate.io/v1".to_string(),
            oauth_token_url: "https://oauth.airslate.com/public/oauth/token".to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            jwt_assertion: String::new(),
            organization_name: "Technology Solutions Inc.".to_string(),
            organization_subdomain: "tech-solutions".to_string(),
            template_name: "Purchase Order Template".to_string(),
            template_description: "Purchase Order Template".to_string(),
            redirect_url: "https://www.google.com".to_string(),
            document_name: "IT Purchase Order.docx".to_string(),
            document_content_path: "IT Purchase Order.docx.base64".to_string(),
            share_link_expire: 60,
            cache_backend: CacheBackend::Memory,
            cookie_max_age_secs: 604_800,
            proxy_allowed_hosts: vec!["api.airslate.io".to_string()],
        }
    }
}

// 密钥不进日志
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_addr", &self.bind_addr)
            .field("verbose_logging", &self.verbose_logging)
            .field("api_base_url", &self.api_base_url)
            .field("oauth_token_url", &self.oauth_token_url)
            .field("client_id", &redact(&self.client_id))
            .field("client_secret", &redact(&self.client_secret))
            .field("jwt_assertion", &redact(&self.jwt_assertion))
            .field("organization_name", &self.organization_name)
            .field("template_name", &self.template_name)
            .field("document_name", &self.document_name)
            .field("document_content_path", &self.document_content_path)
            .field("share_link_expire", &self.share_link_expire)
            .field("cache_backend", &self.cache_backend)
            .field("cookie_max_age_secs", &self.cookie_max_age_secs)
            .field("proxy_allowed_hosts", &self.proxy_allowed_hosts)
            .finish()
    }
}

fn redact(value: &str) -> &'static str {
    if value.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

impl Config {
    /// 加载配置：默认值 → TOML 文件（可选）→ 环境变量
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        base.with_env()
    }

    /// 从 TOML 文件读取，缺省字段使用默认值
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content, &path.display().to_string())
    }

    fn from_toml_str(content: &str, origin: &str) -> AppResult<Self> {
        let config = toml::from_str(content).map_err(|source| ConfigError::TomlParseFailed {
            path: origin.to_string(),
            source,
        })?;
        Ok(config)
    }

    /// 只使用默认值和环境变量
    pub fn from_env() -> AppResult<Self> {
        Self::default().with_env()
    }

    fn with_env(mut self) -> AppResult<Self> {
        override_string("BIND_ADDR", &mut self.bind_addr);
        override_string("API_BASE_URL", &mut self.api_base_url);
        override_string("OAUTH_TOKEN_URL", &mut self.oauth_token_url);
        override_string("CLIENT_ID", &mut self.client_id);
        override_string("CLIENT_SECRET", &mut self.client_secret);
        override_string("JWT_TOKEN", &mut self.jwt_assertion);
        override_string("ORGANIZATION_NAME", &mut self.organization_name);
        override_string("ORGANIZATION_SUBDOMAIN", &mut self.organization_subdomain);
        override_string("TEMPLATE_NAME", &mut self.template_name);
        override_string("REDIRECT_URL", &mut self.redirect_url);
        override_string("DOCUMENT_NAME", &mut self.document_name);
        override_string("DOCUMENT_CONTENT_PATH", &mut self.document_content_path);
        override_parsed("VERBOSE_LOGGING", "bool", &mut self.verbose_logging)?;
        override_parsed("SHARE_LINK_EXPIRE", "u32", &mut self.share_link_expire)?;
        override_parsed("COOKIE_MAX_AGE_SECS", "u64", &mut self.cookie_max_age_secs)?;
        override_parsed("CACHE_BACKEND", "memory|cookie", &mut self.cache_backend)?;
        if let Ok(hosts) = std::env::var("PROXY_ALLOWED_HOSTS") {
            self.proxy_allowed_hosts = parse_host_list(&hosts);
        }
        Ok(self)
    }
}

fn override_string(var_name: &str, target: &mut String) {
    if let Ok(value) = std::env::var(var_name) {
        *target = value;
    }
}

fn override_parsed<T: FromStr>(var_name: &str, expected_type: &str, target: &mut T) -> AppResult<()> {
    if let Ok(value) = std::env::var(var_name) {
        *target = value.parse().map_err(|_| ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value: value.clone(),
            expected_type: expected_type.to_string(),
        })?;
    }
    Ok(())
}

/// 解析逗号分隔的主机列表
pub fn parse_host_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|h| h.trim().to_ascii_lowercase())
        .filter(|h| !h.is_empty())
        .collect()
}
