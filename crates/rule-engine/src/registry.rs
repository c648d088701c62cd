//! 规则策略注册表
//!
//! 规则类型名（大小写不敏感）到“比较器 + 取值策略”对的映射。默认内容为全部内置规则类型，
//! 调用方可以在运行时注册自定义策略。规则在构造时解析并绑定策略，之后注册表的变化不影响已有规则。

use crate::comparator::{Comparator, Comparators};
use crate::operators::RuleType;
use crate::pluck::{Pluck, Plucks};
use dashmap::DashMap;
use std::fmt;
use std::sync::LazyLock;
use tracing::{debug, info};

/// 一个规则类型绑定的比较器与取值策略
#[derive(Clone)]
pub struct RuleStrategy {
    pub comparator: Comparator,
    pub pluck: Pluck,
}

impl RuleStrategy {
    pub fn new(comparator: Comparator, pluck: Pluck) -> Self {
        Self { comparator, pluck }
    }

    /// 内置规则类型的策略
    pub fn builtin(rule_type: RuleType) -> Self {
        Self::new(Comparators::for_type(rule_type), Plucks::for_type(rule_type))
    }
}

impl fmt::Debug for RuleStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleStrategy").finish_non_exhaustive()
    }
}

static GLOBAL: LazyLock<StrategyRegistry> = LazyLock::new(StrategyRegistry::new);

/// 策略注册表
pub struct StrategyRegistry {
    strategies: DashMap<String, RuleStrategy>,
}

impl StrategyRegistry {
    /// 创建包含全部内置规则类型的注册表
    pub fn new() -> Self {
        let registry = Self::empty();
        for rule_type in RuleType::ALL {
            registry
                .strategies
                .insert(rule_type.as_str().to_string(), RuleStrategy::builtin(rule_type));
        }
        registry
    }

    /// 创建空注册表
    pub fn empty() -> Self {
        Self {
            strategies: DashMap::new(),
        }
    }

    /// 进程级默认注册表，`Rule::new` 使用它
    pub fn global() -> &'static StrategyRegistry {
        &GLOBAL
    }

    fn key(name: &str) -> String {
        name.trim().to_ascii_uppercase()
    }

    /// 注册或替换一个规则类型
    pub fn register(&self, name: &str, comparator: Comparator, pluck: Pluck) {
        let key = Self::key(name);
        let replaced = self
            .strategies
            .insert(key.clone(), RuleStrategy::new(comparator, pluck))
            .is_some();

        if replaced {
            info!(rule_type = %key, "规则策略已替换");
        } else {
            debug!(rule_type = %key, "规则策略已注册");
        }
    }

    /// 精确查找
    pub fn get(&self, name: &str) -> Option<RuleStrategy> {
        self.strategies.get(&Self::key(name)).map(|s| s.clone())
    }

    /// 查找策略，未注册的名称回退为 `EQ`；返回实际采用的规则类型名
    pub fn resolve(&self, name: &str) -> (String, RuleStrategy) {
        let key = Self::key(name);
        if let Some(strategy) = self.strategies.get(&key) {
            return (key, strategy.clone());
        }

        debug!(rule_type = %key, "未识别的规则类型，回退为 EQ");
        let fallback = self
            .strategies
            .get(RuleType::Eq.as_str())
            .map(|s| s.clone())
            .unwrap_or_else(|| RuleStrategy::builtin(RuleType::Eq));
        (RuleType::Eq.as_str().to_string(), fallback)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.strategies.contains_key(&Self::key(name))
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// 已注册的规则类型名，按字母序
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.strategies.iter().map(|s| s.key().clone()).collect();
        names.sort();
        names
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparator::Comparison;
    use crate::value::Value;
    use std::sync::Arc;

    #[test]
    fn test_default_registry_has_all_builtin_types() {
        let registry = StrategyRegistry::new();
        assert_eq!(registry.len(), RuleType::ALL.len());
        for rule_type in RuleType::ALL {
            assert!(registry.contains(&rule_type.as_str().to_lowercase()));
        }
    }

    #[test]
    fn test_resolve_falls_back_to_eq() {
        let registry = StrategyRegistry::new();
        let (name, strategy) = registry.resolve("between");
        assert_eq!(name, "EQ");
        assert!((strategy.comparator)(&Value::from(1), &Value::from(1)).matched);
        assert!(!(strategy.comparator)(&Value::from(1), &Value::from(2)).matched);
    }

    #[test]
    fn test_empty_registry_still_resolves_eq() {
        let registry = StrategyRegistry::empty();
        assert!(registry.is_empty());
        let (name, strategy) = registry.resolve("gt");
        assert_eq!(name, "EQ");
        assert!((strategy.comparator)(&Value::from("a"), &Value::from("a")).matched);
    }

    #[test]
    fn test_register_custom_strategy() {
        let registry = StrategyRegistry::new();
        let even: Comparator = Arc::new(|actual: &Value, _expected: &Value| {
            Comparison::matched(actual.as_f64().is_some_and(|n| n % 2.0 == 0.0))
        });
        registry.register("even", even, Plucks::for_type(RuleType::Eq));

        assert!(registry.contains("EVEN"));
        let strategy = registry.get("Even").unwrap();
        assert!((strategy.comparator)(&Value::from(4), &Value::Null).matched);
        assert!(!(strategy.comparator)(&Value::from(3), &Value::Null).matched);
    }

    #[test]
    fn test_register_replaces_builtin() {
        let registry = StrategyRegistry::new();
        let never: Comparator = Arc::new(|_: &Value, _: &Value| Comparison::matched(false));
        registry.register("eq", never, Plucks::for_type(RuleType::Eq));

        let (_, strategy) = registry.resolve("EQ");
        assert!(!(strategy.comparator)(&Value::from(1), &Value::from(1)).matched);
        assert_eq!(registry.len(), RuleType::ALL.len());
    }

    #[test]
    fn test_names_sorted() {
        let names = StrategyRegistry::new().names();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert!(names.contains(&"NCONTAINS".to_string()));
    }
}
