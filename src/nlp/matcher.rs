//! Case-insensitive literal/regex target matching over raw report text.

use std::ops::Range;

use regex::{Regex, RegexSet};

use crate::{
    error::{PipelineError, Result},
    nlp::rules::RuleSet,
};

/// One surviving match of a rule against a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    /// Index into the `RuleSet` the matcher was built from.
    pub rule: usize,
    pub span: Range<usize>,
}

#[derive(Debug, Clone)]
struct CompiledTrigger {
    rule: usize,
    regex: Regex,
}

/// Compiled triggers for a rule set. Immutable and safe to share across threads.
#[derive(Debug, Clone)]
pub struct TargetMatcher {
    prefilter: RegexSet,
    triggers: Vec<CompiledTrigger>,
}

impl TargetMatcher {
    pub fn new(rules: &RuleSet) -> Result<Self> {
        let mut sources = Vec::new();
        let mut rule_ids = Vec::new();
        for (idx, rule) in rules.rules().iter().enumerate() {
            sources.push(literal_pattern(&rule.literal));
            rule_ids.push(idx);
            if let Some(pattern) = &rule.pattern {
                sources.push(format!("(?i)(?:{pattern})"));
                rule_ids.push(idx);
            }
        }

        let compile_err =
            |err: regex::Error| PipelineError::Configuration(format!("cannot compile rule: {err}"));
        let prefilter = RegexSet::new(&sources).map_err(compile_err)?;
        let triggers = sources
            .iter()
            .zip(rule_ids)
            .map(|(source, rule)| {
                Ok(CompiledTrigger {
                    rule,
                    regex: Regex::new(source).map_err(compile_err)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            prefilter,
            triggers,
        })
    }

    /// All non-overlapping matches in document order.
    ///
    /// Overlaps keep the longest span; ties go to the earlier start, then to
    /// the rule defined first.
    pub fn find(&self, text: &str) -> Vec<RuleMatch> {
        let mut candidates = Vec::new();
        for trigger_idx in self.prefilter.matches(text).iter() {
            let trigger = &self.triggers[trigger_idx];
            for found in trigger.regex.find_iter(text) {
                if found.is_empty() {
                    continue;
                }
                candidates.push(RuleMatch {
                    rule: trigger.rule,
                    span: found.range(),
                });
            }
        }

        candidates.sort_by(|a, b| {
            span_len(&b.span)
                .cmp(&span_len(&a.span))
                .then(a.span.start.cmp(&b.span.start))
                .then(a.rule.cmp(&b.rule))
        });
        let mut kept: Vec<RuleMatch> = Vec::new();
        for candidate in candidates {
            let overlaps = kept
                .iter()
                .any(|k| candidate.span.start < k.span.end && k.span.start < candidate.span.end);
            if !overlaps {
                kept.push(candidate);
            }
        }
        kept.sort_by_key(|m| m.span.start);
        kept
    }
}

fn span_len(span: &Range<usize>) -> usize {
    span.end - span.start
}

/// Regex source for a literal: words joined by flexible whitespace, anchored
/// on word boundaries wherever the literal starts or ends with a word char.
fn literal_pattern(literal: &str) -> String {
    let literal = literal.trim();
    let body = literal
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+");
    let is_word = |c: Option<char>| c.is_some_and(|c| c.is_alphanumeric() || c == '_');
    let lead = if is_word(literal.chars().next()) { r"\b" } else { "" };
    let tail = if is_word(literal.chars().last()) { r"\b" } else { "" };
    format!("(?i){lead}{body}{tail}")
}
