//! 规则定义
//!
//! 一条规则绑定取值路径、期望值、比较器和取值策略，构造后不可变。

use crate::comparator::{Comparator, Comparison};
use crate::decoder::Decoder;
use crate::error::Result;
use crate::pluck::Pluck;
use crate::registry::StrategyRegistry;
use crate::result::RuleResult;
use crate::value::{Record, Value};
use std::fmt;

/// 自定义策略规则的类型名
pub const CUSTOM_RULE_TYPE: &str = "CUSTOM";

/// 规则
#[derive(Clone)]
pub struct Rule {
    path: String,
    rule_type: String,
    expected: Value,
    comparator: Comparator,
    pluck: Pluck,
}

impl Rule {
    /// 按规则类型名创建规则，策略取自全局注册表；未识别的类型回退为 `EQ`
    pub fn new(path: impl Into<String>, rule_type: &str, expected: impl Into<Value>) -> Self {
        Self::from_registry(StrategyRegistry::global(), path, rule_type, expected)
    }

    /// 按规则类型名创建规则，策略取自指定注册表
    pub fn from_registry(
        registry: &StrategyRegistry,
        path: impl Into<String>,
        rule_type: &str,
        expected: impl Into<Value>,
    ) -> Self {
        let (rule_type, strategy) = registry.resolve(rule_type);
        Self {
            path: path.into(),
            rule_type,
            expected: expected.into(),
            comparator: strategy.comparator,
            pluck: strategy.pluck,
        }
    }

    /// 直接提供比较器与取值策略，绕过注册表
    pub fn with_strategies(
        path: impl Into<String>,
        expected: impl Into<Value>,
        comparator: Comparator,
        pluck: Pluck,
    ) -> Self {
        Self {
            path: path.into(),
            rule_type: CUSTOM_RULE_TYPE.to_string(),
            expected: expected.into(),
            comparator,
            pluck,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn rule_type(&self) -> &str {
        &self.rule_type
    }

    pub fn expected(&self) -> &Value {
        &self.expected
    }

    /// 从记录中取出待比较的值
    pub fn pluck(&self, record: &Record, decoder: &dyn Decoder) -> Result<Value> {
        (self.pluck)(record, &self.path, decoder)
    }

    /// 比较并返回匹配标志与错误
    pub fn compare_with_error(&self, actual: &Value) -> Comparison {
        (self.comparator)(actual, &self.expected)
    }

    /// 比较，有错误时视为不匹配
    pub fn compare(&self, actual: &Value) -> bool {
        self.compare_with_error(actual).is_satisfied()
    }

    /// 静默评估：取值或比较出错都视为不满足
    pub fn matches(&self, record: &Record, decoder: &dyn Decoder) -> bool {
        match self.pluck(record, decoder) {
            Ok(actual) => self.compare(&actual),
            Err(_) => false,
        }
    }

    /// 报告评估：错误保留在结果中
    pub fn check(&self, record: &Record, decoder: &dyn Decoder) -> RuleResult {
        match self.pluck(record, decoder) {
            Ok(actual) => {
                let comparison = self.compare_with_error(&actual);
                RuleResult::compared(self.expected.clone(), actual, comparison)
            }
            Err(err) => RuleResult::pluck_failed(self.expected.clone(), err),
        }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("path", &self.path)
            .field("rule_type", &self.rule_type)
            .field("expected", &self.expected)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.path, self.rule_type, self.expected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparator::Comparators;
    use crate::decoder::JsonDecoder;
    use crate::operators::RuleType;
    use crate::pluck::Plucks;
    use serde_json::json;
    use std::sync::Arc;

    fn record(value: serde_json::Value) -> Record {
        Value::from(value).into_map().unwrap()
    }

    #[test]
    fn test_compare_cases() {
        let cases = vec![
            (Rule::new("1", "eq", "xxx"), Value::from("xxx"), true),
            (Rule::new("2", "eq", 1), Value::from(2), false),
            (Rule::new("3", "neq", "xxxx"), Value::from("xxx"), true),
            (Rule::new("4", "neq", 2), Value::from(2), false),
            (Rule::new("5", "gt", 2), Value::from(3), true),
            (Rule::new("6", "gt", 2), Value::from(2), false),
            (Rule::new("7", "gte", 3), Value::from(3), true),
            (Rule::new("8", "gte", 2), Value::from(1), false),
            (Rule::new("9", "lt", 2), Value::from(1), true),
            (Rule::new("10", "lt", 4), Value::from(4), false),
            (Rule::new("11", "lte", 4), Value::from(4), true),
            (Rule::new("12", "lte", 4), Value::from(5), false),
            (Rule::new("13", "exists", Value::Null), Value::Null, false),
            (Rule::new("14", "exists", "xxx"), Value::from("xxx"), true),
            (Rule::new("15", "nexists", Value::Null), Value::Null, true),
            (Rule::new("16", "nexists", "xxx"), Value::from("xxx"), false),
            (
                Rule::new("17", "regex", r"^1[34578]\d{9}$"),
                Value::from("18612045500"),
                true,
            ),
            (
                Rule::new("18", "regex", "/^400[0-9]{7}/"),
                Value::from("13823292292"),
                false,
            ),
            (
                Rule::new("19", "nregex", "/^400[0-9]{7}/"),
                Value::from("5001234567"),
                true,
            ),
            (Rule::new("20", "startwith", "abc"), Value::from("abcdef"), true),
            (Rule::new("21", "startwith", "abc"), Value::from("xabc"), false),
        ];

        for (rule, actual, expected) in cases {
            assert_eq!(rule.compare(&actual), expected, "case {}", rule.path());
        }
    }

    #[test]
    fn test_rule_type_is_normalized() {
        assert_eq!(Rule::new("a", "gte", 1).rule_type(), "GTE");
        assert_eq!(Rule::new("a", "unknown", 1).rule_type(), "EQ");
        let custom = Rule::with_strategies(
            "a",
            1,
            Comparators::for_type(RuleType::Eq),
            Plucks::for_type(RuleType::Eq),
        );
        assert_eq!(custom.rule_type(), CUSTOM_RULE_TYPE);
    }

    #[test]
    fn test_factory_and_escape_hatch_agree() {
        let by_name = Rule::new("score", "GTE", 60);
        let direct = Rule::with_strategies(
            "score",
            60,
            Arc::new(Comparators::gte),
            Arc::new(Plucks::dotted_path),
        );

        for actual in [json!(59), json!(60), json!(61), json!("60"), json!(null), json!(true)] {
            let actual = Value::from(actual);
            assert_eq!(
                by_name.compare_with_error(&actual),
                direct.compare_with_error(&actual),
                "actual {actual}"
            );
        }
    }

    #[test]
    fn test_matches_and_check() {
        let rec = record(json!({"user": {"level": "gold"}}));
        let rule = Rule::new("user.level", "eq", "gold");
        assert!(rule.matches(&rec, &JsonDecoder));

        let result = rule.check(&rec, &JsonDecoder);
        assert!(result.is_satisfied());
        assert_eq!(result.actual, Value::from("gold"));
        assert_eq!(result.expected, Value::from("gold"));
    }

    #[test]
    fn test_pluck_error_is_not_a_match() {
        let rec = record(json!({"user": 5}));
        let rule = Rule::new("user.level", "nexists", Value::Null);
        assert!(!rule.matches(&rec, &JsonDecoder));

        let result = rule.check(&rec, &JsonDecoder);
        assert!(!result.matched);
        assert_eq!(result.actual, Value::Null);
        assert_eq!(
            result.error.as_ref().map(|e| e.kind()),
            Some("type_not_supported")
        );
    }

    #[test]
    fn test_display() {
        let rule = Rule::new("order.amount", "gte", 500);
        assert_eq!(rule.to_string(), "order.amount GTE 500");
    }
}
