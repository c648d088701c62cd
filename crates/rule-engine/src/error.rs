//! 规则引擎错误类型

use thiserror::Error;

/// 规则评估过程中可能出现的错误
///
/// 需要实现 `Clone`/`PartialEq`：错误会作为快照挂在 [`crate::RuleResult`] 上返回给调用方。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("类型不匹配: 期望 {expected}, 实际 {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("类型不支持: {operator} 不支持类型 {value_type}")]
    TypeNotSupported {
        operator: String,
        value_type: String,
    },

    #[error("子文档解码失败: {0}")]
    DecodeFailure(String),

    #[error("JSONPath 语法错误: {0}")]
    PathSyntaxError(String),

    #[error("无效的组合类型: {0}")]
    RulerTypeMismatch(String),

    #[error("无效的正则表达式 '{pattern}': {reason}")]
    InvalidRegex { pattern: String, reason: String },

    #[error("序列化错误: {0}")]
    Serialization(String),

    #[error("规则定义无效: {0}")]
    InvalidDefinition(String),
}

impl RuleError {
    pub(crate) fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub(crate) fn not_supported(
        operator: impl Into<String>,
        value_type: impl Into<String>,
    ) -> Self {
        Self::TypeNotSupported {
            operator: operator.into(),
            value_type: value_type.into(),
        }
    }

    /// 错误种类的稳定名称，用于日志字段和报告序列化
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TypeMismatch { .. } => "type_mismatch",
            Self::TypeNotSupported { .. } => "type_not_supported",
            Self::DecodeFailure(_) => "decode_failure",
            Self::PathSyntaxError(_) => "path_syntax_error",
            Self::RulerTypeMismatch(_) => "ruler_type_mismatch",
            Self::InvalidRegex { .. } => "invalid_regex",
            Self::Serialization(_) => "serialization",
            Self::InvalidDefinition(_) => "invalid_definition",
        }
    }
}

impl From<serde_json::Error> for RuleError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RuleError>;
