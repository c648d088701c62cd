//! 单条规则的评估结果

use crate::comparator::Comparison;
use crate::error::RuleError;
use crate::value::Value;
use indexmap::IndexMap;
use serde::{Serialize, Serializer};

/// 报告模式的输出：规则路径到结果的映射，按规则插入顺序迭代
pub type Report = IndexMap<String, RuleResult>;

/// 评估结果快照
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleResult {
    pub expected: Value,
    pub actual: Value,
    pub matched: bool,
    #[serde(serialize_with = "serialize_error")]
    pub error: Option<RuleError>,
}

impl RuleResult {
    /// 比较完成后的结果
    pub fn compared(expected: Value, actual: Value, comparison: Comparison) -> Self {
        Self {
            expected,
            actual,
            matched: comparison.matched,
            error: comparison.error,
        }
    }

    /// 取值失败的结果，actual 为空
    pub fn pluck_failed(expected: Value, error: RuleError) -> Self {
        Self {
            expected,
            actual: Value::Null,
            matched: false,
            error: Some(error),
        }
    }

    /// 规则是否满足：匹配且无错误
    pub fn is_satisfied(&self) -> bool {
        self.matched && self.error.is_none()
    }

    /// 渲染为 JSON 文本，失败时返回空字符串
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

fn serialize_error<S>(error: &Option<RuleError>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match error {
        Some(err) => serializer.serialize_some(&err.to_string()),
        None => serializer.serialize_none(),
    }
}
