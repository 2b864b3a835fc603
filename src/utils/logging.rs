/// 日志工具模块
///
/// 初始化 tracing 输出；`RUST_LOG` 优先，否则按 verbose 选择级别
use tracing_subscriber::EnvFilter;

/// 初始化日志（重复调用无副作用）
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 默认过滤规则：库和命令行程序本身（target 为 `po_flow`）
fn default_directives(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    format!("purchase_order_flow={level},po_flow={level}")
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
