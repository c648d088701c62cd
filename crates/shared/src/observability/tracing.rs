//! 日志初始化
//!
//! 日志写到 stderr，stdout 留给命令的结构化输出。

use anyhow::Result;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use super::ObservabilityConfig;

/// 初始化 tracing 订阅器
///
/// 重复初始化会返回错误，调用方通常只在 `main` 中调用一次。
pub fn init(config: &ObservabilityConfig) -> Result<()> {
    // 构建环境过滤器
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // 构建日志层
    let fmt_layer = if config.json_logs {
        fmt::layer()
            .json()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_ansi(true)
            .with_writer(std::io::stderr)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    ::tracing::debug!(service = %config.service_name, "日志已初始化");
    Ok(())
}
