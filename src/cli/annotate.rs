//! CLI entry-point for annotating one ad-hoc text.

use std::{io::Read, path::PathBuf};

use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use tracing::instrument;

use crate::{
    config::Settings,
    extract::{extract_study, Redaction},
    nlp::{self, LabelSource},
};

/// Args for the `annotate` command.
#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    /// Text to annotate; read from stdin when omitted.
    #[arg(long)]
    pub text: Option<String>,
    /// Study id stamped on the printed rows.
    #[arg(long, default_value_t = 0)]
    pub study_id: i64,
    #[arg(long)]
    pub rules: Option<PathBuf>,
    #[arg(long, value_enum)]
    pub label_source: Option<LabelSource>,
}

#[instrument(skip(settings, args), fields(study_id = args.study_id))]
pub async fn run(args: Args, settings: Settings) -> Result<()> {
    let text = match args.text {
        Some(text) => text,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading text from stdin")?;
            buf
        }
    };
    let rules_path = args.rules.unwrap_or(settings.rules_path);
    let pipeline = nlp::load_pipeline(
        &rules_path,
        args.label_source.unwrap_or(settings.label_source),
    )?;
    let redaction = Redaction::new(settings.placeholder, settings.stand_in)?;
    redaction.check_rules(pipeline.rules())?;

    for row in extract_study(args.study_id, Some(&text), pipeline.as_ref(), &redaction) {
        println!("{}", serde_json::to_string(&row)?);
    }
    Ok(())
}
