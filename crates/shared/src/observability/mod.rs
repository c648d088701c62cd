//! 统一可观测性模块
//!
//! 所有入口通过单一函数初始化日志，保证一致的过滤规则与输出格式。

pub mod tracing;

use serde::Deserialize;

/// 可观测性配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// 服务名称，用于标识日志来源
    pub service_name: String,

    /// 日志级别（如 "info", "debug"），`RUST_LOG` 优先
    pub log_level: String,

    /// 是否启用 JSON 格式日志
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: "ruler".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

pub use self::tracing::init;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ObservabilityConfig::default();
        assert_eq!(config.log_level, "info");
        assert!(!config.json_logs);
    }
}
