//! Annotation pipeline: sentence segmentation plus target rule matching.

use std::{ops::Range, path::Path, sync::Arc};

use clap::ValueEnum;
use serde::Serialize;
use tracing::info;

use crate::{
    error::Result,
    nlp::{matcher::TargetMatcher, rules::RuleSet, sentences::SentenceSplitter},
};

/// Which rule field becomes the problem label of a match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum LabelSource {
    /// The rule's trigger literal.
    #[default]
    Literal,
    /// The rule's category.
    Category,
}

/// Matched entity together with the sentence that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Annotation {
    /// Literal of the rule that fired.
    pub literal: String,
    pub category: String,
    /// Raw (not yet normalized) problem label.
    pub label: String,
    /// Surface text of the match.
    pub text: String,
    pub span: Range<usize>,
    pub sentence: String,
    /// Token offset of the owning sentence; used as its id.
    pub sentence_start: usize,
}

/// Trait for annotation engines.
///
/// Implementations must not keep per-call state so a single instance can
/// serve many documents, including from several threads.
pub trait Annotate: Send + Sync {
    fn annotate(&self, text: &str) -> Vec<Annotation>;
}

/// Rule-based pipeline built once from a validated `RuleSet`.
#[derive(Debug, Clone)]
pub struct Pipeline {
    rules: RuleSet,
    matcher: TargetMatcher,
    splitter: SentenceSplitter,
    label_source: LabelSource,
}

impl Pipeline {
    pub fn new(rules: RuleSet, label_source: LabelSource) -> Result<Self> {
        let matcher = TargetMatcher::new(&rules)?;
        Ok(Self {
            rules,
            matcher,
            splitter: SentenceSplitter::new(),
            label_source,
        })
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn label_source(&self) -> LabelSource {
        self.label_source
    }
}

impl Annotate for Pipeline {
    fn annotate(&self, text: &str) -> Vec<Annotation> {
        let matches = self.matcher.find(text);
        if matches.is_empty() {
            return Vec::new();
        }
        let sentences = self.splitter.split(text);

        matches
            .into_iter()
            .filter_map(|found| {
                // Sentences tile the document, so the lookup only misses on a
                // match that starts past the end of the text.
                let owner = sentences
                    .partition_point(|s| s.span.start <= found.span.start)
                    .checked_sub(1)?;
                let sentence = &sentences[owner];
                let rule = &self.rules.rules()[found.rule];
                let label = match self.label_source {
                    LabelSource::Literal => rule.literal.clone(),
                    LabelSource::Category => rule.category.clone(),
                };
                Some(Annotation {
                    literal: rule.literal.clone(),
                    category: rule.category.clone(),
                    label,
                    text: text[found.span.clone()].to_string(),
                    span: found.span,
                    sentence: sentence.text(text).to_string(),
                    sentence_start: sentence.start,
                })
            })
            .collect()
    }
}

/// Load rules from disk and build the shared pipeline.
pub fn load_pipeline(rules_path: &Path, label_source: LabelSource) -> Result<Arc<Pipeline>> {
    let rules = RuleSet::from_path(rules_path)?;
    let pipeline = Pipeline::new(rules, label_source)?;
    info!(rules = pipeline.rules().len(), ?label_source, "initialised pipeline");
    Ok(Arc::new(pipeline))
}
