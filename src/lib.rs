//! # Purchase Order Flow
//!
//! 一个采购订单表单服务：提交订单后调用文档工作流平台，
//! 生成可填写的文档分享链接，在 iframe 中展示给用户。
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 令牌、带认证的 HTTP 通道、标识符缓存
//! - `TokenProvider` - JWT 断言换取 Bearer 令牌并缓存
//! - `AuthorizedHttp` - 401 时刷新令牌并重试一次
//! - `IdentifierStore` - 内存 / Cookie 两种缓存实现
//!
//! ### ② 平台客户端（Clients）
//! - `clients/` - `WorkflowApi` 接口和基于 HTTP 的实现
//!
//! ### ③ 业务能力层（Services）
//! - `ResourceLocator` - organization / template / document 查找或创建
//! - `FlowAssembler` - 订单 → 字段值，创建 Flow
//! - `LinkDistributor` - 获取或创建分享链接
//!
//! ### ④ 流程层（Workflow）
//! - `OrderFlow` - 一张订单的完整流程，逐步查缓存
//!
//! ### ⑤ 服务层（Server）
//! - `server/` - axum 路由、错误到 HTTP 状态的映射、页面
//!
//! ## 模块结构

pub mod cli;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod server;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{WorkflowApi, WorkflowClient};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{CacheKey, IdentifierStore, MemoryStore};
pub use models::Order;
pub use server::{router, App, AppState};
pub use workflow::{OrderFlow, OrderStage};
