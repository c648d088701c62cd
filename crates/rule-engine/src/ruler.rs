//! 规则组合器
//!
//! `AndRuler` / `OrRuler` 持有有序规则序列和解码器，对一条记录做两种评估：
//! - `validate`：短路求值，只返回结论
//! - `validate_with_result`：逐条评估全部规则，返回每条规则的结果
//!
//! 规则序列只能通过 `add_rule`（需要 `&mut self`）增长，评估只需要 `&self`。

use crate::decoder::Decoder;
use crate::error::Result;
use crate::operators::Combinator;
use crate::result::Report;
use crate::rule::Rule;
use crate::value::Record;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// 一组按 AND/OR 组合的规则
pub trait Ruler: fmt::Debug + Send + Sync {
    /// 组合方式
    fn combinator(&self) -> Combinator;

    /// 按插入顺序排列的规则
    fn rules(&self) -> &[Rule];

    /// 短路求值
    fn validate(&self, record: &Record) -> bool;

    /// 完整评估，返回每条规则的结果与总体结论
    ///
    /// 报告以路径为键：同一路径的多条规则只保留最后一条的结果，位置为该路径首次出现处；
    /// 总体结论仍计入每一条规则。
    fn validate_with_result(&self, record: &Record) -> (Report, bool);

    /// 追加规则，返回自身以便链式调用
    fn add_rule(&mut self, rule: Rule) -> &mut dyn Ruler;
}

/// 按组合方式名创建规则组，名称大小写不敏感
///
/// # Errors
/// 名称不是 `AND` / `OR` 时返回 [`crate::RuleError::RulerTypeMismatch`]。
pub fn new_ruler(
    rules: Vec<Rule>,
    combinator: &str,
    decoder: Arc<dyn Decoder>,
) -> Result<Box<dyn Ruler>> {
    let combinator: Combinator = combinator.parse()?;
    Ok(build_ruler(combinator, rules, decoder))
}

/// 按组合方式创建规则组
pub fn build_ruler(
    combinator: Combinator,
    rules: Vec<Rule>,
    decoder: Arc<dyn Decoder>,
) -> Box<dyn Ruler> {
    match combinator {
        Combinator::And => Box::new(AndRuler::new(rules, decoder)),
        Combinator::Or => Box::new(OrRuler::new(rules, decoder)),
    }
}

/// 记录报告中的一条结果，出错时打日志
fn record_result(
    report: &mut Report,
    rule: &Rule,
    record: &Record,
    decoder: &dyn Decoder,
) -> bool {
    let result = rule.check(record, decoder);
    if let Some(err) = &result.error {
        warn!(
            path = rule.path(),
            rule_type = rule.rule_type(),
            error_kind = err.kind(),
            error = %err,
            "规则评估出错"
        );
    }
    let satisfied = result.is_satisfied();
    report.insert(rule.path().to_string(), result);
    satisfied
}

/// 所有规则都满足才通过
#[derive(Clone)]
pub struct AndRuler {
    rules: Vec<Rule>,
    decoder: Arc<dyn Decoder>,
}

impl AndRuler {
    pub fn new(rules: Vec<Rule>, decoder: Arc<dyn Decoder>) -> Self {
        Self { rules, decoder }
    }

    /// 构造期追加规则
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }
}

impl Ruler for AndRuler {
    fn combinator(&self) -> Combinator {
        Combinator::And
    }

    fn rules(&self) -> &[Rule] {
        &self.rules
    }

    fn validate(&self, record: &Record) -> bool {
        for (i, rule) in self.rules.iter().enumerate() {
            // AND: 遇到取值失败或不匹配立即返回
            if !rule.matches(record, self.decoder.as_ref()) {
                debug!(index = i, path = rule.path(), "AND 短路 - 规则不满足");
                return false;
            }
        }
        true
    }

    #[instrument(skip_all, fields(combinator = "AND", rules = self.rules.len()))]
    fn validate_with_result(&self, record: &Record) -> (Report, bool) {
        let mut report = Report::with_capacity(self.rules.len());
        let mut all_matched = true;

        for rule in &self.rules {
            all_matched &= record_result(&mut report, rule, record, self.decoder.as_ref());
        }

        debug!(matched = all_matched, "AND 组评估完成");
        (report, all_matched)
    }

    fn add_rule(&mut self, rule: Rule) -> &mut dyn Ruler {
        self.rules.push(rule);
        self
    }
}

impl fmt::Debug for AndRuler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AndRuler")
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

/// 任一规则满足即通过
#[derive(Clone)]
pub struct OrRuler {
    rules: Vec<Rule>,
    decoder: Arc<dyn Decoder>,
}

impl OrRuler {
    pub fn new(rules: Vec<Rule>, decoder: Arc<dyn Decoder>) -> Self {
        Self { rules, decoder }
    }

    /// 构造期追加规则
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }
}

impl Ruler for OrRuler {
    fn combinator(&self) -> Combinator {
        Combinator::Or
    }

    fn rules(&self) -> &[Rule] {
        &self.rules
    }

    fn validate(&self, record: &Record) -> bool {
        for (i, rule) in self.rules.iter().enumerate() {
            // OR: 任一规则满足立即返回
            if rule.matches(record, self.decoder.as_ref()) {
                debug!(index = i, path = rule.path(), "OR 短路 - 规则满足");
                return true;
            }
        }
        false
    }

    #[instrument(skip_all, fields(combinator = "OR", rules = self.rules.len()))]
    fn validate_with_result(&self, record: &Record) -> (Report, bool) {
        let mut report = Report::with_capacity(self.rules.len());
        let mut any_matched = false;

        for rule in &self.rules {
            any_matched |= record_result(&mut report, rule, record, self.decoder.as_ref());
        }

        debug!(matched = any_matched, "OR 组评估完成");
        (report, any_matched)
    }

    fn add_rule(&mut self, rule: Rule) -> &mut dyn Ruler {
        self.rules.push(rule);
        self
    }
}

impl fmt::Debug for OrRuler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrRuler")
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}
