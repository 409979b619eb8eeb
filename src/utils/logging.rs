/// 日志工具模块
///
/// 负责初始化 tracing 订阅器，并提供日志格式化的辅助函数
use crate::config::Config;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化日志
///
/// 优先使用 `RUST_LOG`，否则根据 `verbose` 选择 debug 或 info 级别。
/// 重复调用是安全的（测试中会多次初始化）。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 CV Analyzer 客户端启动");
    info!("🌐 API 地址: {}", config.api_base_url);
    info!("💾 会话文件: {}", config.session_file);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
