//! 数据解码器
//!
//! 点号路径取值遇到字符串形式的嵌入子文档时，通过注入的解码器把它解析为记录。
//! 引擎只依赖 [`Decoder`] 接口，内置 JSON / YAML / XML 三种实现。

use crate::error::{Result, RuleError};
use crate::value::{Record, Value};
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// 把字节解码为记录
pub trait Decoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<Record>;
}

impl<F> Decoder for F
where
    F: Fn(&[u8]) -> Result<Record> + Send + Sync,
{
    fn decode(&self, bytes: &[u8]) -> Result<Record> {
        self(bytes)
    }
}

/// JSON 解码器
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl Decoder for JsonDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<Record> {
        serde_json::from_slice(bytes).map_err(|e| RuleError::DecodeFailure(e.to_string()))
    }
}

/// YAML 解码器
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlDecoder;

impl Decoder for YamlDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<Record> {
        serde_yaml::from_slice(bytes).map_err(|e| RuleError::DecodeFailure(e.to_string()))
    }
}

/// XML 解码器
///
/// 根元素的内容即记录：子元素名为键，属性以 `@name` 为键，
/// 同名兄弟元素合并为列表，叶子元素取文本（XML 没有类型，一律为字符串）。
/// 元素同时带有属性或子元素和文本时，文本存放在 `#text` 键下。
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlDecoder;

/// 非叶子元素自身文本的键
pub const XML_TEXT_KEY: &str = "#text";

impl Decoder for XmlDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<Record> {
        let text =
            std::str::from_utf8(bytes).map_err(|e| RuleError::DecodeFailure(e.to_string()))?;
        let doc = Document::parse(text).map_err(|e| RuleError::DecodeFailure(e.to_string()))?;

        match Self::element_value(doc.root_element()) {
            Value::Map(record) => Ok(record),
            Value::String(s) if s.is_empty() => Ok(Record::new()),
            other => Err(RuleError::DecodeFailure(format!(
                "XML 根元素不是结构化内容: {}",
                other
            ))),
        }
    }
}

impl XmlDecoder {
    fn element_value(node: Node<'_, '_>) -> Value {
        let mut record = Record::new();

        for attr in node.attributes() {
            record.insert(format!("@{}", attr.name()), Value::from(attr.value()));
        }

        let mut has_children = false;
        for child in node.children().filter(Node::is_element) {
            has_children = true;
            let name = child.tag_name().name().to_string();
            let value = Self::element_value(child);
            match record.remove(&name) {
                None => {
                    record.insert(name, value);
                }
                Some(Value::List(mut items)) => {
                    items.push(value);
                    record.insert(name, Value::List(items));
                }
                Some(previous) => {
                    record.insert(name, Value::List(vec![previous, value]));
                }
            }
        }

        // 直接文本子节点逐段去空白后以空格连接
        let text = node
            .children()
            .filter(Node::is_text)
            .filter_map(|n| n.text())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if !has_children && record.is_empty() {
            return Value::String(text);
        }
        if !text.is_empty() {
            record.insert(XML_TEXT_KEY.to_string(), Value::String(text));
        }
        Value::Map(record)
    }
}

/// 数据格式，用于从配置中选择解码器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    #[default]
    Json,
    Yaml,
    Xml,
}

impl DataFormat {
    pub fn decoder(&self) -> Arc<dyn Decoder> {
        match self {
            Self::Json => Arc::new(JsonDecoder),
            Self::Yaml => Arc::new(YamlDecoder),
            Self::Xml => Arc::new(XmlDecoder),
        }
    }

    /// 按文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "xml" => Some(Self::Xml),
            _ => None,
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Yaml => write!(f, "yaml"),
            Self::Xml => write!(f, "xml"),
        }
    }
}

impl FromStr for DataFormat {
    type Err = RuleError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_extension(s.trim())
            .ok_or_else(|| RuleError::InvalidDefinition(format!("未知的数据格式: {}", s)))
    }
}
