//! Per-report problem extraction.

pub mod aggregate;

use std::borrow::Cow;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{PipelineError, Result},
    nlp::{Annotate, RuleSet},
};

/// Problem label of the row emitted for a study with nothing flagged.
pub const NONE_FLAGGED: &str = "none_flagged";
/// `sent_id` of the row emitted for a study with nothing flagged.
pub const NO_SENTENCE: i64 = -1;

/// One problem mention, attributed to the sentence that contains it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExtractionRow {
    pub study_id: i64,
    pub sent_id: i64,
    pub problem: String,
    pub sentence: String,
}

impl ExtractionRow {
    /// The "no problem found" row for `study_id`.
    pub fn sentinel(study_id: i64) -> Self {
        Self {
            study_id,
            sent_id: NO_SENTENCE,
            problem: NONE_FLAGGED.to_string(),
            sentence: String::new(),
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.sent_id == NO_SENTENCE && self.problem == NONE_FLAGGED
    }
}

/// Swaps the redaction placeholder for a sentence-safe stand-in while a
/// report is segmented, and back again in the surfaced sentences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redaction {
    placeholder: String,
    stand_in: String,
}

/// Report text after placeholder substitution.
#[derive(Debug, Clone)]
pub struct Masked<'a> {
    pub text: Cow<'a, str>,
    /// False when nothing was replaced, including when the report already
    /// contained the stand-in and substitution had to be skipped.
    pub substituted: bool,
}

impl Default for Redaction {
    fn default() -> Self {
        Self {
            placeholder: "___".to_string(),
            stand_in: "PII".to_string(),
        }
    }
}

impl Redaction {
    pub fn new(placeholder: impl Into<String>, stand_in: impl Into<String>) -> Result<Self> {
        let placeholder = placeholder.into();
        let stand_in = stand_in.into();
        if placeholder.is_empty() || stand_in.is_empty() {
            return Err(PipelineError::Configuration(
                "redaction placeholder and stand-in must be non-empty".into(),
            ));
        }
        if !stand_in.chars().all(char::is_alphanumeric) {
            return Err(PipelineError::Configuration(format!(
                "stand-in '{stand_in}' must be alphanumeric so it cannot split sentences"
            )));
        }
        if placeholder.contains(&stand_in) || stand_in.contains(&placeholder) {
            return Err(PipelineError::Configuration(format!(
                "placeholder '{placeholder}' and stand-in '{stand_in}' overlap"
            )));
        }
        Ok(Self {
            placeholder,
            stand_in,
        })
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn stand_in(&self) -> &str {
        &self.stand_in
    }

    /// True when `text` already contains the stand-in verbatim.
    pub fn collides(&self, text: &str) -> bool {
        text.contains(&self.stand_in)
    }

    pub fn mask<'a>(&self, text: &'a str) -> Masked<'a> {
        if !text.contains(&self.placeholder) {
            return Masked {
                text: Cow::Borrowed(text),
                substituted: false,
            };
        }
        if self.collides(text) {
            debug!(stand_in = %self.stand_in, "report already contains stand-in; leaving placeholder");
            return Masked {
                text: Cow::Borrowed(text),
                substituted: false,
            };
        }
        Masked {
            text: Cow::Owned(text.replace(&self.placeholder, &self.stand_in)),
            substituted: true,
        }
    }

    pub fn unmask(&self, sentence: &str) -> String {
        sentence.replace(&self.stand_in, &self.placeholder)
    }

    /// Reject rules that would flag the stand-in itself as a problem.
    pub fn check_rules(&self, rules: &RuleSet) -> Result<()> {
        let stand_in = self.stand_in.to_lowercase();
        for rule in rules.rules() {
            let literal_hit = rule.literal.to_lowercase().contains(&stand_in);
            let pattern_hit = rule
                .pattern
                .as_deref()
                .and_then(|p| regex::Regex::new(&format!("(?i)(?:{p})")).ok())
                .is_some_and(|re| re.is_match(&self.stand_in));
            if literal_hit || pattern_hit {
                return Err(PipelineError::Configuration(format!(
                    "rule '{}' matches the redaction stand-in '{}'",
                    rule.literal, self.stand_in
                )));
            }
        }
        Ok(())
    }
}

/// Extract the problem rows of a single report.
///
/// Always returns at least one row: a report without text, or whose text
/// flags nothing, yields exactly the sentinel row.
pub fn extract_study(
    study_id: i64,
    body: Option<&str>,
    pipeline: &dyn Annotate,
    redaction: &Redaction,
) -> Vec<ExtractionRow> {
    let Some(body) = body else {
        return vec![ExtractionRow::sentinel(study_id)];
    };
    let masked = redaction.mask(body);
    let annotations = pipeline.annotate(&masked.text);
    if annotations.is_empty() {
        return vec![ExtractionRow::sentinel(study_id)];
    }

    let rows: IndexSet<ExtractionRow> = annotations
        .into_iter()
        .map(|ann| {
            let sentence = ann.sentence.trim();
            let sentence = if masked.substituted {
                redaction.unmask(sentence)
            } else {
                sentence.to_string()
            };
            ExtractionRow {
                study_id,
                sent_id: ann.sentence_start as i64,
                problem: ann.label.to_lowercase(),
                sentence,
            }
        })
        .collect();
    rows.into_iter().collect()
}
