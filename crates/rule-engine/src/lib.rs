//! 规则校验引擎
//!
//! 用一组谓词规则校验结构化记录（JSON / YAML / XML 解码后的键值文档），支持：
//! - 可扩展的比较器注册表，类型敏感且错误种类明确
//! - 点号路径 / JSONPath 取值，透明展开嵌入的序列化子文档
//! - AND / OR 组合：短路求值或逐条报告

pub mod comparator;
pub mod decoder;
pub mod definition;
pub mod error;
pub mod operators;
pub mod pluck;
pub mod registry;
pub mod result;
pub mod rule;
pub mod ruler;
pub mod value;

pub use comparator::{Comparator, Comparators, Comparison};
pub use decoder::{DataFormat, Decoder, JsonDecoder, XML_TEXT_KEY, XmlDecoder, YamlDecoder};
pub use definition::{RuleDefinition, RulerDefinition};
pub use error::{Result, RuleError};
pub use operators::{Combinator, RuleType};
pub use pluck::{Pluck, Plucks};
pub use registry::{RuleStrategy, StrategyRegistry};
pub use result::{Report, RuleResult};
pub use rule::Rule;
pub use ruler::{AndRuler, OrRuler, Ruler, build_ruler, new_ruler};
pub use value::{Record, Value};
