//! CLI entry-point for validating and listing target rules.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::{info, instrument};

use crate::{
    config::Settings,
    extract::Redaction,
    nlp::{LabelSource, RuleSet},
};

/// Args for the `rules` command.
#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    /// Target rule JSON file; defaults to `RULES_PATH`.
    #[arg(long)]
    pub rules: Option<PathBuf>,
    #[arg(long, value_enum)]
    pub label_source: Option<LabelSource>,
}

#[instrument(skip(settings))]
pub async fn run(args: Args, settings: Settings) -> Result<()> {
    let path = args.rules.unwrap_or(settings.rules_path);
    let rules = RuleSet::from_path(&path)?;
    Redaction::new(settings.placeholder, settings.stand_in)?.check_rules(&rules)?;
    let label_source = args.label_source.unwrap_or(settings.label_source);
    info!(rules = rules.len(), "rule file is valid");
    print!("{}", render_rules(&rules, label_source));
    Ok(())
}

/// One line per rule: the problem label it produces, then its triggers.
pub fn render_rules(rules: &RuleSet, label_source: LabelSource) -> String {
    let mut out = String::new();
    for rule in rules.rules() {
        let label = match label_source {
            LabelSource::Literal => rule.literal.to_lowercase(),
            LabelSource::Category => rule.category.to_lowercase(),
        };
        out.push_str(&format!("{label} <- {:?}", rule.literal));
        if let Some(pattern) = &rule.pattern {
            out.push_str(&format!(" /{pattern}/"));
        }
        out.push('\n');
    }
    out
}
