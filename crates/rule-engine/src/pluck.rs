//! 取值策略
//!
//! 根据路径从记录中取出规则要比较的值：
//! - 点号路径：逐段下钻，中间段遇到字符串时视为嵌入的序列化子文档并通过解码器展开
//! - JSONPath：把整条记录重新序列化为 JSON 树后求值，取第一个命中值

use crate::decoder::Decoder;
use crate::error::{Result, RuleError};
use crate::operators::RuleType;
use crate::value::{Record, Value};
use serde_json_path::JsonPath;
use std::sync::Arc;

/// 取值函数，缺失的值以 `Value::Null` 表示
pub type Pluck = Arc<dyn Fn(&Record, &str, &dyn Decoder) -> Result<Value> + Send + Sync>;

/// 内置取值策略
pub struct Plucks;

impl Plucks {
    /// 规则类型对应的取值策略：`J` 前缀类型使用 JSONPath
    pub fn for_type(rule_type: RuleType) -> Pluck {
        if rule_type.uses_json_path() {
            Arc::new(Self::json_path)
        } else {
            Arc::new(Self::dotted_path)
        }
    }

    /// 点号路径取值
    ///
    /// 最后一段的值原样返回，不做解码；中间段只接受嵌套记录或可解码的字符串。
    pub fn dotted_path(record: &Record, path: &str, decoder: &dyn Decoder) -> Result<Value> {
        let parts: Vec<&str> = path.split('.').collect();
        Self::walk(record, &parts, decoder)
    }

    fn walk(record: &Record, parts: &[&str], decoder: &dyn Decoder) -> Result<Value> {
        match parts {
            [] => Ok(Value::Null),
            [last] => Ok(record.get(*last).cloned().unwrap_or_default()),
            [head, rest @ ..] => match record.get(*head) {
                Some(Value::Map(nested)) => Self::walk(nested, rest, decoder),
                Some(Value::String(embedded)) => {
                    let nested = decoder.decode(embedded.as_bytes())?;
                    Self::walk(&nested, rest, decoder)
                }
                Some(other) => Err(RuleError::not_supported(
                    format!("path segment '{}'", head),
                    other.type_name(),
                )),
                None => Err(RuleError::not_supported(
                    format!("path segment '{}'", head),
                    "missing",
                )),
            },
        }
    }

    /// JSONPath 取值，返回第一个命中值；无命中时为 `Null`
    pub fn json_path(record: &Record, path: &str, _decoder: &dyn Decoder) -> Result<Value> {
        let json_path =
            JsonPath::parse(path).map_err(|e| RuleError::PathSyntaxError(e.to_string()))?;
        let tree = serde_json::to_value(record)?;

        Ok(json_path
            .query(&tree)
            .first()
            .cloned()
            .map(Value::from)
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::{JsonDecoder, YamlDecoder};
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        Value::from(value).into_map().unwrap()
    }

    #[test]
    fn test_dotted_path_nested_maps() {
        let rec = record(json!({"a": {"b": {"c": 5}}}));
        let value = Plucks::dotted_path(&rec, "a.b.c", &JsonDecoder).unwrap();
        assert_eq!(value, Value::Number(5.0));
    }

    #[test]
    fn test_dotted_path_embedded_json() {
        let rec = record(json!({"a": "{\"b\":{\"c\":5}}"}));
        let value = Plucks::dotted_path(&rec, "a.b.c", &JsonDecoder).unwrap();
        assert_eq!(value, Value::Number(5.0));
    }

    #[test]
    fn test_dotted_path_embedded_inside_embedded() {
        let inner = json!({"c": "deep"}).to_string();
        let outer = json!({"b": inner}).to_string();
        let rec = record(json!({"a": outer}));
        let value = Plucks::dotted_path(&rec, "a.b.c", &JsonDecoder).unwrap();
        assert_eq!(value, Value::from("deep"));
    }

    #[test]
    fn test_dotted_path_embedded_yaml() {
        let rec = record(json!({"payload": "user:\n  level: gold\n"}));
        let value = Plucks::dotted_path(&rec, "payload.user.level", &YamlDecoder).unwrap();
        assert_eq!(value, Value::from("gold"));
    }

    #[test]
    fn test_dotted_path_final_segment_is_not_decoded() {
        let rec = record(json!({"a": "{\"b\":1}"}));
        let value = Plucks::dotted_path(&rec, "a", &JsonDecoder).unwrap();
        assert_eq!(value, Value::from("{\"b\":1}"));
    }

    #[test]
    fn test_dotted_path_missing_leaf_is_null() {
        let rec = record(json!({"a": {"b": 1}}));
        assert_eq!(
            Plucks::dotted_path(&rec, "a.x", &JsonDecoder).unwrap(),
            Value::Null
        );
        assert_eq!(
            Plucks::dotted_path(&rec, "x", &JsonDecoder).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn test_dotted_path_unsupported_intermediate() {
        let rec = record(json!({"a": [1, 2], "n": 3}));
        let err = Plucks::dotted_path(&rec, "a.0", &JsonDecoder).unwrap_err();
        assert_eq!(err.kind(), "type_not_supported");
        let err = Plucks::dotted_path(&rec, "n.x", &JsonDecoder).unwrap_err();
        assert_eq!(err.kind(), "type_not_supported");
        let err = Plucks::dotted_path(&rec, "missing.x", &JsonDecoder).unwrap_err();
        assert_eq!(err.kind(), "type_not_supported");
    }

    #[test]
    fn test_dotted_path_decode_failure() {
        let rec = record(json!({"a": "not a document"}));
        let err = Plucks::dotted_path(&rec, "a.b", &JsonDecoder).unwrap_err();
        assert_eq!(err.kind(), "decode_failure");
    }

    #[test]
    fn test_json_path_index() {
        let rec = record(json!({"items": [{"id": 1}, {"id": 2}]}));
        let value = Plucks::json_path(&rec, "$.items[1].id", &JsonDecoder).unwrap();
        assert_eq!(value, Value::Number(2.0));
    }

    #[test]
    fn test_json_path_filter_and_wildcard() {
        let rec = record(json!({
            "items": [
                {"sku": "TICKET", "price": 500},
                {"sku": "FOOD", "price": 80}
            ]
        }));
        let value = Plucks::json_path(&rec, "$.items[?@.price < 100].sku", &JsonDecoder).unwrap();
        assert_eq!(value, Value::from("FOOD"));
        let value = Plucks::json_path(&rec, "$.items[*].sku", &JsonDecoder).unwrap();
        assert_eq!(value, Value::from("TICKET"));
    }

    #[test]
    fn test_json_path_no_match_is_null() {
        let rec = record(json!({"items": []}));
        let value = Plucks::json_path(&rec, "$.items[0]", &JsonDecoder).unwrap();
        assert_eq!(value, Value::Null);
    }

    #[test]
    fn test_json_path_syntax_error() {
        let rec = record(json!({"a": 1}));
        let err = Plucks::json_path(&rec, "$.[", &JsonDecoder).unwrap_err();
        assert_eq!(err.kind(), "path_syntax_error");
    }

    #[test]
    fn test_for_type_selects_strategy() {
        let rec = record(json!({"items": [{"id": 7}]}));
        let json_pluck = Plucks::for_type(RuleType::Jeq);
        assert_eq!(
            json_pluck(&rec, "$.items[0].id", &JsonDecoder).unwrap(),
            Value::Number(7.0)
        );
        let dotted = Plucks::for_type(RuleType::Eq);
        assert_eq!(dotted(&rec, "items", &JsonDecoder).unwrap().type_name(), "array");
    }
}
