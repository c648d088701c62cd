//! 规则定义
//!
//! 以 JSON / YAML 声明规则组，构建前校验定义的合法性。

use crate::comparator::Comparators;
use crate::decoder::DataFormat;
use crate::error::{Result, RuleError};
use crate::operators::{Combinator, RuleType};
use crate::registry::StrategyRegistry;
use crate::rule::Rule;
use crate::ruler::{Ruler, build_ruler};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// 单条规则定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub path: String,
    #[serde(rename = "type")]
    pub rule_type: String,
    #[serde(default)]
    pub value: Value,
}

impl RuleDefinition {
    pub fn new(
        path: impl Into<String>,
        rule_type: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            path: path.into(),
            rule_type: rule_type.into(),
            value: value.into(),
        }
    }

    /// 校验单条定义，`index` 用于错误定位
    fn validate(&self, index: usize) -> Result<()> {
        if self.path.trim().is_empty() {
            return Err(RuleError::InvalidDefinition(format!(
                "rules[{}] 的路径不能为空",
                index
            )));
        }

        match RuleType::lookup(&self.rule_type) {
            Some(RuleType::Regex | RuleType::Nregex) => {
                let pattern = self.value.as_str().ok_or_else(|| {
                    RuleError::InvalidDefinition(format!(
                        "rules[{}] 的 {} 需要字符串正则",
                        index, self.rule_type
                    ))
                })?;
                // 预编译，同时填充正则缓存
                Comparators::compiled(pattern)?;
            }
            Some(RuleType::Oneof | RuleType::Noneof) => {
                if !matches!(self.value, Value::List(_) | Value::Map(_)) {
                    return Err(RuleError::InvalidDefinition(format!(
                        "rules[{}] 的 {} 需要数组或映射值",
                        index, self.rule_type
                    )));
                }
            }
            _ => {}
        }

        Ok(())
    }

    fn to_rule(&self, registry: &StrategyRegistry) -> Rule {
        Rule::from_registry(registry, self.path.as_str(), &self.rule_type, self.value.clone())
    }
}

/// 规则组定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulerDefinition {
    pub combinator: String,
    #[serde(default)]
    pub format: DataFormat,
    pub rules: Vec<RuleDefinition>,
}

impl RulerDefinition {
    /// 从 JSON 文本解析
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| RuleError::InvalidDefinition(e.to_string()))
    }

    /// 从 YAML 文本解析
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| RuleError::InvalidDefinition(e.to_string()))
    }

    /// 按格式解析
    pub fn parse(text: &str, format: DataFormat) -> Result<Self> {
        match format {
            DataFormat::Json => Self::from_json(text),
            DataFormat::Yaml => Self::from_yaml(text),
            DataFormat::Xml => Err(RuleError::InvalidDefinition(
                "规则定义仅支持 JSON / YAML".to_string(),
            )),
        }
    }

    /// 校验定义
    pub fn validate(&self) -> Result<Combinator> {
        let combinator: Combinator = self.combinator.parse()?;

        if self.rules.is_empty() {
            return Err(RuleError::InvalidDefinition("规则列表不能为空".to_string()));
        }

        for (i, rule) in self.rules.iter().enumerate() {
            rule.validate(i)?;
        }

        Ok(combinator)
    }

    /// 使用全局注册表构建规则组
    pub fn build(&self) -> Result<Box<dyn Ruler>> {
        self.build_with(StrategyRegistry::global())
    }

    /// 使用指定注册表构建规则组
    #[instrument(skip_all, fields(combinator = %self.combinator, rules = self.rules.len()))]
    pub fn build_with(&self, registry: &StrategyRegistry) -> Result<Box<dyn Ruler>> {
        let combinator = self.validate()?;
        let rules = self.rules.iter().map(|r| r.to_rule(registry)).collect();

        debug!(format = %self.format, "规则组已构建");
        Ok(build_ruler(combinator, rules, self.format.decoder()))
    }
}
