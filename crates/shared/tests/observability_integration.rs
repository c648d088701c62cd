//! 日志初始化集成测试
//!
//! 全局订阅器每个进程只能安装一次，单独放在一个测试二进制中。

use ruler_shared::observability::{self, ObservabilityConfig};

#[test]
fn test_init_only_once() {
    let config = ObservabilityConfig {
        service_name: "ruler-test".to_string(),
        log_level: "debug".to_string(),
        json_logs: true,
    };

    assert!(observability::init(&config).is_ok());
    // 重复初始化返回错误而不是 panic
    assert!(observability::init(&config).is_err());

    tracing::info!(service = %config.service_name, "订阅器已安装");
}
