//! Rule-based extraction of problem sentences from radiology reports.
//!
//! Reports are run through a sentence splitter and a target rule matcher,
//! each match becomes a row keyed by study and sentence, and the combined rows
//! are deduplicated and split into one partition per problem label.

pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod extract;
pub mod logging;
pub mod nlp;
pub mod pipeline;

pub use error::{PipelineError, Result};
