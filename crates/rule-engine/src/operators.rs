//! 规则类型与组合方式定义

use crate::error::RuleError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 内置规则类型
///
/// 名称大小写不敏感；`J` 前缀的类型使用 JSONPath 取值，其余使用点号路径取值。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RuleType {
    // 相等比较
    Eq,
    Neq,
    Jeq,
    Jneq,

    // 大小比较
    Gt,
    Gte,
    Lt,
    Lte,

    // 存在性
    Exists,
    Nexists,

    // 正则
    Regex,
    Nregex,

    // 包含检查
    Contains,
    Ncontains,
    Oneof,
    Noneof,

    // 字符串前后缀
    Startwith,
    Nstartwith,
    Endwith,
    Nendwith,
}

impl RuleType {
    pub const ALL: [RuleType; 20] = [
        Self::Eq,
        Self::Neq,
        Self::Jeq,
        Self::Jneq,
        Self::Gt,
        Self::Gte,
        Self::Lt,
        Self::Lte,
        Self::Exists,
        Self::Nexists,
        Self::Regex,
        Self::Nregex,
        Self::Contains,
        Self::Ncontains,
        Self::Oneof,
        Self::Noneof,
        Self::Startwith,
        Self::Nstartwith,
        Self::Endwith,
        Self::Nendwith,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "EQ",
            Self::Neq => "NEQ",
            Self::Jeq => "JEQ",
            Self::Jneq => "JNEQ",
            Self::Gt => "GT",
            Self::Gte => "GTE",
            Self::Lt => "LT",
            Self::Lte => "LTE",
            Self::Exists => "EXISTS",
            Self::Nexists => "NEXISTS",
            Self::Regex => "REGEX",
            Self::Nregex => "NREGEX",
            Self::Contains => "CONTAINS",
            Self::Ncontains => "NCONTAINS",
            Self::Oneof => "ONEOF",
            Self::Noneof => "NONEOF",
            Self::Startwith => "STARTWITH",
            Self::Nstartwith => "NSTARTWITH",
            Self::Endwith => "ENDWITH",
            Self::Nendwith => "NENDWITH",
        }
    }

    /// 按名称查找，大小写不敏感
    pub fn lookup(name: &str) -> Option<Self> {
        let upper = name.trim().to_ascii_uppercase();
        Self::ALL.into_iter().find(|t| t.as_str() == upper)
    }

    /// 按名称查找，未识别的名称回退为 `EQ`
    pub fn parse_or_eq(name: &str) -> Self {
        Self::lookup(name).unwrap_or(Self::Eq)
    }

    /// 是否使用 JSONPath 取值
    pub fn uses_json_path(&self) -> bool {
        matches!(self, Self::Jeq | Self::Jneq)
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 规则组合方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Combinator {
    And,
    Or,
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => write!(f, "AND"),
            Self::Or => write!(f, "OR"),
        }
    }
}

impl FromStr for Combinator {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AND" => Ok(Self::And),
            "OR" => Ok(Self::Or),
            _ => Err(RuleError::RulerTypeMismatch(s.to_string())),
        }
    }
}
