//! 服务层（HTTP）
//!
//! ## 职责
//!
//! - 持有共享资源（OrderFlow、内存缓存、代理白名单）
//! - 把 HTTP 请求转换为流程调用，把错误映射为 HTTP 状态
//! - 不包含业务判断
//!
//! ## 层次关系
//!
//! ```text
//! server (HTTP 路由)
//!     ↓
//! workflow::OrderFlow (处理单张订单)
//!     ↓
//! services (能力层：locator / assembler / distributor)
//!     ↓
//! clients + infrastructure (平台 API、令牌、缓存)
//! ```

pub mod pages;
pub mod proxy;
pub mod routes;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::{header, HeaderMap};
use tracing::info;

use crate::clients::{WorkflowApi, WorkflowClient};
use crate::config::{CacheBackend, Config};
use crate::error::AppResult;
use crate::infrastructure::{CookieStore, MemoryStore, SessionCache};
use crate::workflow::OrderFlow;

pub use proxy::ProxyGate;
pub use routes::router;

/// 路由共享状态
#[derive(Clone)]
pub struct AppState {
    flow: Arc<OrderFlow>,
    shared_cache: Arc<MemoryStore>,
    proxy: Arc<ProxyGate>,
    cache_backend: CacheBackend,
    cookie_max_age_secs: u64,
}

impl AppState {
    /// 用指定的平台 API 创建状态
    pub fn new(api: Arc<dyn WorkflowApi>, config: &Config) -> AppResult<Self> {
        Ok(Self {
            flow: Arc::new(OrderFlow::new(api, config)),
            shared_cache: Arc::new(MemoryStore::new()),
            proxy: Arc::new(ProxyGate::new(config.proxy_allowed_hosts.clone())?),
            cache_backend: config.cache_backend,
            cookie_max_age_secs: config.cookie_max_age_secs,
        })
    }

    /// 本次请求使用的缓存
    pub fn session(&self, headers: &HeaderMap) -> SessionCache {
        match self.cache_backend {
            CacheBackend::Memory => SessionCache::Shared(self.shared_cache.clone()),
            CacheBackend::Cookie => {
                let cookie = headers
                    .get(header::COOKIE)
                    .and_then(|v| v.to_str().ok());
                SessionCache::Cookie(CookieStore::from_cookie_header(
                    cookie,
                    self.cookie_max_age_secs,
                ))
            }
        }
    }

    pub fn flow(&self) -> &OrderFlow {
        &self.flow
    }

    pub fn proxy(&self) -> &ProxyGate {
        &self.proxy
    }

    pub fn shared_cache(&self) -> &Arc<MemoryStore> {
        &self.shared_cache
    }
}

/// 应用主结构
pub struct App {
    config: Config,
    state: AppState,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);
        let api: Arc<dyn WorkflowApi> = Arc::new(WorkflowClient::new(&config));
        let state = AppState::new(api, &config).context("初始化服务状态失败")?;
        Ok(Self { config, state })
    }

    /// 运行 HTTP 服务直到进程退出
    pub async fn run(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.config.bind_addr)
            .await
            .with_context(|| format!("无法监听地址: {}", self.config.bind_addr))?;
        let addr = listener.local_addr()?;
        info!("🌐 服务已启动: http://{}", addr);

        axum::serve(listener, router(self.state))
            .await
            .context("HTTP 服务异常退出")?;
        Ok(())
    }
}

fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 采购订单服务启动");
    info!("🔗 平台 API: {}", config.api_base_url);
    info!("🗂️ 缓存方式: {:?}", config.cache_backend);
    info!("🛡️ 代理白名单: {:?}", config.proxy_allowed_hosts);
    info!("{}", "=".repeat(60));
}
