//! 配置管理模块
//!
//! 支持多格式配置文件加载，环境变量覆盖，以及类型安全的配置访问。

use crate::observability::ObservabilityConfig;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// 规则引擎配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// 规则定义文件（JSON / YAML）
    pub rules_file: Option<String>,
    /// 记录文件的数据格式：json / yaml / xml
    pub format: String,
    /// 是否输出逐条规则报告
    pub report: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rules_file: None,
            format: "json".to_string(),
            report: false,
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub service_name: String,
    pub environment: String,
    pub observability: ObservabilityConfig,
    pub engine: EngineConfig,
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 加载顺序（后加载的会覆盖先加载的同名配置项）：
    /// 1. config/default.toml（默认配置）
    /// 2. config/{environment}.toml（环境特定配置）
    /// 3. 环境变量（RULER_ 前缀，层级用双下划线，如 RULER_ENGINE__FORMAT -> engine.format）
    pub fn load(service_name: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("RULER_ENV").unwrap_or_else(|_| "development".to_string());
        let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

        Self::load_from(Path::new(&config_dir), service_name, &env)
    }

    /// 从指定目录加载配置
    pub fn load_from(
        config_dir: &Path,
        service_name: &str,
        env: &str,
    ) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .set_default("service_name", service_name)?
            .set_default("environment", env)?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join(format!("{}.toml", env))).required(false))
            .add_source(
                Environment::with_prefix("RULER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut config: Self = builder.build()?.try_deserialize()?;
        config.observability.service_name = config.service_name.clone();
        Ok(config)
    }
}
