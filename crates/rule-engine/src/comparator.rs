//! 比较器
//!
//! 每种规则类型对应一个纯函数 `(actual, expected) -> Comparison`。
//! 比较器从不 panic：类型不符时返回 `matched = false` 并附带错误种类，
//! 由调用方决定是折叠为不匹配（静默模式）还是保留用于诊断（报告模式）。

use crate::error::RuleError;
use crate::operators::RuleType;
use crate::value::Value;
use dashmap::DashMap;
use regex::Regex;
use std::cmp::Ordering;
use std::sync::{Arc, LazyLock};
use tracing::debug;

/// 比较器函数
pub type Comparator = Arc<dyn Fn(&Value, &Value) -> Comparison + Send + Sync>;

/// 单次比较的结果：匹配标志加可选错误
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub matched: bool,
    pub error: Option<RuleError>,
}

impl Comparison {
    pub fn matched(matched: bool) -> Self {
        Self {
            matched,
            error: None,
        }
    }

    pub fn failed(error: RuleError) -> Self {
        Self {
            matched: false,
            error: Some(error),
        }
    }

    /// 匹配标志与非致命错误同时存在
    pub fn flagged(matched: bool, error: Option<RuleError>) -> Self {
        Self { matched, error }
    }

    /// 取反匹配标志，错误原样保留
    pub fn negate(self) -> Self {
        Self {
            matched: !self.matched,
            error: self.error,
        }
    }

    /// 静默模式下的结论：有错误即视为不匹配
    pub fn is_satisfied(&self) -> bool {
        self.matched && self.error.is_none()
    }
}

/// 正则缓存容量上限，超过后整体清空重建
const REGEX_CACHE_CAPACITY: usize = 1024;

/// 已编译正则缓存，进程内共享
static REGEX_CACHE: LazyLock<DashMap<String, Regex>> = LazyLock::new(DashMap::new);

/// 内置比较器集合
pub struct Comparators;

impl Comparators {
    /// 获取规则类型对应的比较器
    pub fn for_type(rule_type: RuleType) -> Comparator {
        let f: fn(&Value, &Value) -> Comparison = match rule_type {
            RuleType::Eq | RuleType::Jeq => Self::eq,
            RuleType::Neq | RuleType::Jneq => Self::neq,
            RuleType::Gt => Self::gt,
            RuleType::Gte => Self::gte,
            RuleType::Lt => Self::lt,
            RuleType::Lte => Self::lte,
            RuleType::Exists => Self::exists,
            RuleType::Nexists => Self::nexists,
            RuleType::Regex => Self::regex,
            RuleType::Nregex => Self::nregex,
            RuleType::Contains => Self::contains,
            RuleType::Ncontains => Self::ncontains,
            RuleType::Oneof => Self::one_of,
            RuleType::Noneof => Self::none_of,
            RuleType::Startwith => Self::starts_with,
            RuleType::Nstartwith => Self::not_starts_with,
            RuleType::Endwith => Self::ends_with,
            RuleType::Nendwith => Self::not_ends_with,
        };
        Arc::new(f)
    }

    /// 按规则类型直接评估
    pub fn evaluate(actual: &Value, rule_type: RuleType, expected: &Value) -> Comparison {
        Self::for_type(rule_type)(actual, expected)
    }

    /// 相等：同类型且值相等，跨类型永不匹配
    pub fn eq(actual: &Value, expected: &Value) -> Comparison {
        Comparison::matched(actual == expected)
    }

    pub fn neq(actual: &Value, expected: &Value) -> Comparison {
        Self::eq(actual, expected).negate()
    }

    pub fn gt(actual: &Value, expected: &Value) -> Comparison {
        Self::order(actual, expected, "GT", Ordering::is_gt)
    }

    pub fn gte(actual: &Value, expected: &Value) -> Comparison {
        Self::order(actual, expected, "GTE", Ordering::is_ge)
    }

    pub fn lt(actual: &Value, expected: &Value) -> Comparison {
        Self::order(actual, expected, "LT", Ordering::is_lt)
    }

    pub fn lte(actual: &Value, expected: &Value) -> Comparison {
        Self::order(actual, expected, "LTE", Ordering::is_le)
    }

    pub fn exists(actual: &Value, _expected: &Value) -> Comparison {
        Comparison::matched(!actual.is_null())
    }

    pub fn nexists(actual: &Value, _expected: &Value) -> Comparison {
        Comparison::matched(actual.is_null())
    }

    pub fn regex(actual: &Value, expected: &Value) -> Comparison {
        Self::regex_match(actual, expected)
    }

    pub fn nregex(actual: &Value, expected: &Value) -> Comparison {
        Self::regex_match(actual, expected).negate()
    }

    /// 字符串子串或列表元素包含
    pub fn contains(actual: &Value, expected: &Value) -> Comparison {
        match (expected, actual) {
            (Value::String(needle), Value::String(haystack)) => {
                Comparison::matched(haystack.contains(needle.as_str()))
            }
            (Value::String(_), Value::List(items)) | (Value::Number(_), Value::List(items)) => {
                let (found, mismatch) = Self::scan_list(items, expected);
                if found {
                    Comparison::matched(true)
                } else {
                    Comparison::flagged(false, mismatch)
                }
            }
            _ => Comparison::failed(RuleError::not_supported(
                "CONTAINS",
                Self::pair_name(actual, expected),
            )),
        }
    }

    /// 独立评估的“不包含”：未找到且列表中有异型元素时，结果为 true 但附带类型不匹配
    pub fn ncontains(actual: &Value, expected: &Value) -> Comparison {
        match (expected, actual) {
            (Value::String(needle), Value::String(haystack)) => {
                Comparison::matched(!haystack.contains(needle.as_str()))
            }
            (Value::String(_), Value::List(items)) | (Value::Number(_), Value::List(items)) => {
                let (found, mismatch) = Self::scan_list(items, expected);
                if found {
                    Comparison::matched(false)
                } else {
                    Comparison::flagged(true, mismatch)
                }
            }
            _ => Comparison::failed(RuleError::not_supported(
                "NCONTAINS",
                Self::pair_name(actual, expected),
            )),
        }
    }

    /// actual 属于 expected 集合（列表元素，或映射的键）
    pub fn one_of(actual: &Value, expected: &Value) -> Comparison {
        match Self::membership(actual, expected, "ONEOF") {
            Ok(found) => Comparison::matched(found),
            Err(err) => Comparison::failed(err),
        }
    }

    pub fn none_of(actual: &Value, expected: &Value) -> Comparison {
        match Self::membership(actual, expected, "NONEOF") {
            Ok(found) => Comparison::matched(!found),
            Err(err) => Comparison::failed(err),
        }
    }

    pub fn starts_with(actual: &Value, expected: &Value) -> Comparison {
        Self::affix(actual, expected, |s, prefix| s.starts_with(prefix))
    }

    pub fn not_starts_with(actual: &Value, expected: &Value) -> Comparison {
        Self::affix(actual, expected, |s, prefix| !s.starts_with(prefix))
    }

    pub fn ends_with(actual: &Value, expected: &Value) -> Comparison {
        Self::affix(actual, expected, |s, suffix| s.ends_with(suffix))
    }

    pub fn not_ends_with(actual: &Value, expected: &Value) -> Comparison {
        Self::affix(actual, expected, |s, suffix| !s.ends_with(suffix))
    }

    /// 大小比较：字符串按字典序，数值按 IEEE-754
    fn order<F>(actual: &Value, expected: &Value, operator: &str, cmp: F) -> Comparison
    where
        F: Fn(Ordering) -> bool,
    {
        let ordering = match (actual, expected) {
            (Value::String(a), Value::String(e)) => Some(a.as_str().cmp(e.as_str())),
            (Value::Number(a), Value::Number(e)) => a.partial_cmp(e),
            (Value::String(_), other) => {
                return Comparison::failed(RuleError::type_mismatch("string", other.type_name()));
            }
            (Value::Number(_), other) => {
                return Comparison::failed(RuleError::type_mismatch("number", other.type_name()));
            }
            (other, _) => {
                return Comparison::failed(RuleError::not_supported(operator, other.type_name()));
            }
        };

        // NaN 参与比较时没有次序，按不匹配处理
        Comparison::matched(ordering.is_some_and(cmp))
    }

    fn regex_match(actual: &Value, expected: &Value) -> Comparison {
        let Value::String(s) = actual else {
            return Comparison::failed(RuleError::not_supported("REGEX", actual.type_name()));
        };
        let Value::String(pattern) = expected else {
            return Comparison::failed(RuleError::type_mismatch(
                "string (regex pattern)",
                expected.type_name(),
            ));
        };

        match Self::compiled(pattern) {
            Ok(regex) => Comparison::matched(regex.is_match(s)),
            Err(err) => Comparison::failed(err),
        }
    }

    /// 取缓存的正则，首次使用时编译
    ///
    /// 缓存最多保留 `REGEX_CACHE_CAPACITY` 个模式；规则来自用户输入时模式数量无界，
    /// 满了之后整体清空，被清掉的模式在下次使用时重新编译。
    pub(crate) fn compiled(pattern: &str) -> Result<Regex, RuleError> {
        if let Some(regex) = REGEX_CACHE.get(pattern) {
            return Ok(regex.clone());
        }

        let regex = Regex::new(pattern).map_err(|e| RuleError::InvalidRegex {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        if REGEX_CACHE.len() >= REGEX_CACHE_CAPACITY {
            debug!(capacity = REGEX_CACHE_CAPACITY, "正则缓存已满，清空");
            REGEX_CACHE.clear();
        }
        REGEX_CACHE.insert(pattern.to_string(), regex.clone());
        Ok(regex)
    }

    /// 在列表中查找与 expected 同类型且相等的元素；返回（是否找到，遇到的异型元素错误）
    fn scan_list(items: &[Value], expected: &Value) -> (bool, Option<RuleError>) {
        let mut mismatch = None;
        for item in items {
            if item.type_name() != expected.type_name() {
                mismatch = Some(RuleError::type_mismatch(
                    expected.type_name(),
                    item.type_name(),
                ));
            } else if item == expected {
                return (true, None);
            }
        }
        (false, mismatch)
    }

    fn membership(actual: &Value, expected: &Value, operator: &str) -> Result<bool, RuleError> {
        match expected {
            Value::List(items) => Ok(items.iter().any(|item| item == actual)),
            Value::Map(set) => match actual {
                Value::String(key) => Ok(set.contains_key(key)),
                other => Err(RuleError::type_mismatch("string (set key)", other.type_name())),
            },
            other => Err(RuleError::not_supported(operator, other.type_name())),
        }
    }

    fn affix<F>(actual: &Value, expected: &Value, test: F) -> Comparison
    where
        F: Fn(&str, &str) -> bool,
    {
        match (actual, expected) {
            (Value::String(s), Value::String(affix)) => Comparison::matched(test(s, affix)),
            (Value::String(_), other) | (other, _) => {
                Comparison::failed(RuleError::type_mismatch("string", other.type_name()))
            }
        }
    }

    fn pair_name(actual: &Value, expected: &Value) -> String {
        format!("{} / {}", actual.type_name(), expected.type_name())
    }
}
