use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use purchase_order_flow::cli::{Command, RootArgs, TokenArgs};
use purchase_order_flow::clients::{WorkflowApi, WorkflowClient};
use purchase_order_flow::models::catalog;
use purchase_order_flow::utils::logging;
use purchase_order_flow::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let args = RootArgs::parse();

    // 加载配置
    let config = Config::load(args.config.as_deref()).context("加载配置失败")?;

    // 初始化日志
    logging::init(config.verbose_logging);

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => App::initialize(config)?.run().await?,
        Command::Token(token_args) => run_token(&config, &token_args).await?,
        Command::Catalog => print_catalog(),
    }

    Ok(())
}

/// 获取新令牌，可选验证
async fn run_token(config: &Config, args: &TokenArgs) -> Result<()> {
    let client = WorkflowClient::new(config);
    let token = client.tokens().refresh().await.context("获取访问令牌失败")?;
    info!("✓ 新令牌: {}", logging::truncate_text(&token, 12));

    if args.verify {
        let orgs = client
            .list_organizations()
            .await
            .context("令牌验证失败")?;
        info!("✓ 令牌有效，可见 {} 个组织", orgs.len());
    }

    if args.print {
        println!("{}", token);
    }
    Ok(())
}

fn print_catalog() {
    for product in catalog::all() {
        println!("{}\t{}\t${}", product.item_id, product.name, product.price);
    }
}
