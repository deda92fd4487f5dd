//! 日志初始化

use tracing_subscriber::EnvFilter;

/// 日志初始化错误
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// 已安装全局 subscriber
    #[error("Global tracing subscriber already set: {0}")]
    Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),

    /// 已安装 `log` 记录器
    #[error("Global log bridge already set: {0}")]
    LogBridge(#[from] log::SetLoggerError),
}

/// 安装全局 `tracing` subscriber，并把 `log` 记录桥接进来
///
/// 过滤规则取自 `RUST_LOG`，未设置时为 `default_directive`（如 `"info"`）。
pub fn try_init_logging(default_directive: &str) -> Result<(), LoggingError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    tracing_log::LogTracer::init()?;
    Ok(())
}

/// 以 `info` 为默认级别初始化日志；重复调用时忽略
pub fn init_logging() {
    if let Err(_e) = try_init_logging("info") {
        tracing::debug!("Logging already initialized: {}", _e);
    }
}
