//! Target rule configuration: which phrases flag which problems.

use std::{collections::HashMap, fs, path::Path};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{PipelineError, Result};

const DEFAULT_CATEGORY: &str = "PROBLEM";

/// On-disk rule record, laid out like medspaCy's `target_rules` JSON.
#[derive(Debug, Deserialize)]
struct RawRule {
    literal: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    pattern: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawRuleFile {
    target_rules: Vec<RawRule>,
}

/// A literal trigger phrase mapped to a problem category.
#[derive(Debug, Clone, Serialize)]
pub struct TargetRule {
    pub literal: String,
    pub category: String,
    /// Extra regex trigger matched alongside the literal.
    pub pattern: Option<String>,
}

impl TargetRule {
    /// Lowercased, whitespace-collapsed literal used to detect duplicates.
    pub fn key(&self) -> String {
        normalize_literal(&self.literal)
    }
}

/// Validated, immutable rule configuration.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<TargetRule>,
}

impl RuleSet {
    /// Load and validate rules from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|err| {
            PipelineError::Configuration(format!(
                "cannot read rule file {}: {err}",
                path.display()
            ))
        })?;
        let rules = Self::from_json(&raw)?;
        info!(path = %path.display(), rules = rules.len(), "loaded target rules");
        Ok(rules)
    }

    /// Parse and validate rules from JSON text.
    pub fn from_json(raw: &str) -> Result<Self> {
        let parsed: RawRuleFile = serde_json::from_str(raw)
            .map_err(|err| PipelineError::Configuration(format!("malformed rule file: {err}")))?;
        let rules = parsed
            .target_rules
            .into_iter()
            .map(|rule| TargetRule {
                literal: rule.literal.trim().to_string(),
                category: rule
                    .category
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty())
                    .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
                pattern: rule.pattern.filter(|p| !p.trim().is_empty()),
            })
            .collect();
        Self::new(rules)
    }

    /// Validate an in-memory rule list.
    ///
    /// Duplicate literals are rejected rather than resolved by load order, so
    /// rule precedence never depends on file layout.
    pub fn new(rules: Vec<TargetRule>) -> Result<Self> {
        if rules.is_empty() {
            return Err(PipelineError::Configuration(
                "rule file defines no target rules".into(),
            ));
        }
        let mut seen: HashMap<String, usize> = HashMap::new();
        for (idx, rule) in rules.iter().enumerate() {
            let key = rule.key();
            if key.is_empty() {
                return Err(PipelineError::Configuration(format!(
                    "rule #{} has a blank literal",
                    idx + 1
                )));
            }
            if let Some(first) = seen.insert(key, idx) {
                return Err(PipelineError::Configuration(format!(
                    "duplicate literal '{}' in rules #{} and #{}",
                    rule.literal,
                    first + 1,
                    idx + 1
                )));
            }
            if let Some(pattern) = &rule.pattern {
                Regex::new(pattern).map_err(|err| {
                    PipelineError::Configuration(format!(
                        "rule '{}' has an invalid pattern: {err}",
                        rule.literal
                    ))
                })?;
            }
        }
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[TargetRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn normalize_literal(literal: &str) -> String {
    literal
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
