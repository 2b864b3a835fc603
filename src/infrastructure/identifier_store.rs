//! 标识符缓存 - 基础设施层
//!
//! 保存已经解析过的 organization / template / document / flow / role ID，
//! 避免每次请求都重新查找。存在即视为有效，不做失效检测。

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

/// 缓存键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    OrganizationId,
    TemplateId,
    DocumentId,
    FlowId,
    RoleId,
}

impl CacheKey {
    pub const ALL: [CacheKey; 5] = [
        CacheKey::OrganizationId,
        CacheKey::TemplateId,
        CacheKey::DocumentId,
        CacheKey::FlowId,
        CacheKey::RoleId,
    ];

    /// 键名（同时也是 Cookie 名）
    pub fn as_str(self) -> &'static str {
        match self {
            CacheKey::OrganizationId => "organizationId",
            CacheKey::TemplateId => "templateId",
            CacheKey::DocumentId => "documentId",
            CacheKey::FlowId => "flowId",
            CacheKey::RoleId => "roleId",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 标识符存储接口
#[async_trait]
pub trait IdentifierStore: Send + Sync {
    async fn get(&self, key: CacheKey) -> Option<String>;
    async fn set(&self, key: CacheKey, value: String);
    async fn clear(&self, key: CacheKey);
}

/// 只清除 flow ID
pub async fn clear_flow(store: &dyn IdentifierStore) {
    store.clear(CacheKey::FlowId).await;
}

/// 清除全部五个 ID
pub async fn clear_all(store: &dyn IdentifierStore) {
    for key in CacheKey::ALL {
        store.clear(key).await;
    }
}

/// 进程内存存储，进程重启后丢失
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<CacheKey, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentifierStore for MemoryStore {
    async fn get(&self, key: CacheKey) -> Option<String> {
        self.entries.read().await.get(&key).cloned()
    }

    async fn set(&self, key: CacheKey, value: String) {
        self.entries.write().await.insert(key, value);
    }

    async fn clear(&self, key: CacheKey) {
        self.entries.write().await.remove(&key);
    }
}

/// Cookie 存储
///
/// 每个请求一个实例：从 `Cookie` 头读取初始值，
/// 记录本次请求的写入和清除，最后生成 `Set-Cookie` 头。
pub struct CookieStore {
    max_age_secs: u64,
    values: RwLock<HashMap<CacheKey, String>>,
    changes: RwLock<Vec<(CacheKey, Option<String>)>>,
}

impl CookieStore {
    /// 由请求的 `Cookie` 头创建
    pub fn from_cookie_header(header: Option<&str>, max_age_secs: u64) -> Self {
        let values = header.map(parse_cookie_header).unwrap_or_default();
        Self {
            max_age_secs,
            values: RwLock::new(values),
            changes: RwLock::new(Vec::new()),
        }
    }

    /// 本次请求需要返回的 `Set-Cookie` 头，同一个键只保留最后一次修改
    pub async fn set_cookie_headers(&self) -> Vec<String> {
        let changes = self.changes.read().await;
        let mut latest: Vec<(CacheKey, Option<String>)> = Vec::new();
        for (key, value) in changes.iter() {
            latest.retain(|(k, _)| k != key);
            latest.push((*key, value.clone()));
        }
        latest
            .into_iter()
            .map(|(key, value)| match value {
                Some(v) => format!("{}={}; Path=/; Max-Age={}", key, v, self.max_age_secs),
                None => format!("{}=; Path=/; Max-Age=0", key),
            })
            .collect()
    }
}

fn parse_cookie_header(header: &str) -> HashMap<CacheKey, String> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .filter_map(|(name, value)| {
            let key = CacheKey::from_name(name.trim())?;
            let value = value.trim();
            if value.is_empty() {
                return None;
            }
            if !is_plain_identifier(value) {
                // 会拼进上游 URL 路径，只接受字母数字和 - _
                warn!("忽略格式异常的 Cookie {}: {:?}", key, value);
                return None;
            }
            Some((key, value.to_string()))
        })
        .collect()
}

/// 平台 ID 只由字母、数字、`-`、`_` 组成
pub fn is_plain_identifier(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= 128
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

#[async_trait]
impl IdentifierStore for CookieStore {
    async fn get(&self, key: CacheKey) -> Option<String> {
        self.values.read().await.get(&key).cloned()
    }

    async fn set(&self, key: CacheKey, value: String) {
        self.values.write().await.insert(key, value.clone());
        self.changes.write().await.push((key, Some(value)));
    }

    async fn clear(&self, key: CacheKey) {
        self.values.write().await.remove(&key);
        self.changes.write().await.push((key, None));
    }
}

/// 单个请求使用的缓存：共享内存或者请求级 Cookie
pub enum SessionCache {
    Shared(Arc<MemoryStore>),
    Cookie(CookieStore),
}

impl SessionCache {
    pub async fn set_cookie_headers(&self) -> Vec<String> {
        match self {
            SessionCache::Shared(_) => Vec::new(),
            SessionCache::Cookie(store) => store.set_cookie_headers().await,
        }
    }

    fn inner(&self) -> &dyn IdentifierStore {
        match self {
            SessionCache::Shared(store) => store.as_ref(),
            SessionCache::Cookie(store) => store,
        }
    }
}

#[async_trait]
impl IdentifierStore for SessionCache {
    async fn get(&self, key: CacheKey) -> Option<String> {
        self.inner().get(key).await
    }

    async fn set(&self, key: CacheKey, value: String) {
        self.inner().set(key, value).await
    }

    async fn clear(&self, key: CacheKey) {
        self.inner().clear(key).await
    }
}
