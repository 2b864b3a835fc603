//! 命令行参数

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// 采购订单服务
#[derive(Parser, Debug)]
#[command(name = "po-flow", version, about = "Purchase order form backed by a document-workflow API")]
pub struct RootArgs {
    /// TOML 配置文件（也可以用 PO_FLOW_CONFIG 指定）
    #[arg(long, value_name = "FILE", env = "PO_FLOW_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 启动 HTTP 服务（默认）
    Serve,
    /// 获取访问令牌
    Token(TokenArgs),
    /// 打印产品目录
    Catalog,
}

#[derive(Parser, Debug)]
pub struct TokenArgs {
    /// 获取后调用组织列表接口验证令牌
    #[arg(long)]
    pub verify: bool,

    /// 在标准输出打印完整令牌
    #[arg(long)]
    pub print: bool,
}
