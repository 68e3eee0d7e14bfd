//! Natural language processing layer: rules, segmentation, matching.

pub mod matcher;
pub mod ner;
pub mod rules;
pub mod sentences;

pub use ner::{load_pipeline, Annotate, Annotation, LabelSource, Pipeline};
pub use rules::{RuleSet, TargetRule};
