//! CLI entry-point for the batch problem extraction run.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args as ClapArgs;
use tracing::instrument;

use crate::{
    config::{parse_workers, Settings},
    data::OutputFormat,
    extract::aggregate::DedupScope,
    nlp::LabelSource,
    pipeline::find_problems,
};

/// Args for the `run` command. Each flag overrides its environment setting.
#[derive(Debug, Clone, Default, ClapArgs)]
pub struct Args {
    /// Report table (CSV or Parquet).
    #[arg(long)]
    pub reports: Option<PathBuf>,
    /// Target rule JSON file.
    #[arg(long)]
    pub rules: Option<PathBuf>,
    /// Output folder for the per-problem files.
    #[arg(long)]
    pub outputs: Option<PathBuf>,
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,
    /// Collapse identical sentences across studies, or only within one.
    #[arg(long, value_enum)]
    pub dedup: Option<DedupScope>,
    #[arg(long, value_enum)]
    pub label_source: Option<LabelSource>,
    /// Parallel extraction workers, at least 1.
    #[arg(long, value_parser = parse_workers)]
    pub workers: Option<usize>,
}

impl Args {
    fn apply(self, mut settings: Settings) -> Settings {
        if let Some(path) = self.reports {
            settings.reports_path = path;
        }
        if let Some(path) = self.rules {
            settings.rules_path = path;
        }
        if let Some(dir) = self.outputs {
            settings.outputs_dir = dir;
        }
        if let Some(format) = self.format {
            settings.output_format = format;
        }
        if let Some(scope) = self.dedup {
            settings.dedup_scope = scope;
        }
        if let Some(source) = self.label_source {
            settings.label_source = source;
        }
        if let Some(workers) = self.workers {
            settings.workers = workers;
        }
        settings
    }
}

#[instrument(skip(settings))]
pub async fn run(args: Args, settings: Settings) -> Result<()> {
    let settings = args.apply(settings);
    let summary = find_problems(&settings).await?;
    if !summary.failures.is_empty() {
        bail!(
            "{} of {} partitions could not be written",
            summary.failures.len(),
            summary.failures.len() + summary.partitions.len()
        );
    }
    Ok(())
}
