//! Runtime configuration utilities for problem-finder.

use std::{env, path::PathBuf};

use anyhow::{anyhow, bail, Context};
use clap::ValueEnum;
use serde::Serialize;

use crate::{data::OutputFormat, extract::aggregate::DedupScope, nlp::LabelSource};

/// Application configuration resolved from `.env` and defaults.
#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    /// Report table with `study_id` and `body` columns.
    pub reports_path: PathBuf,
    /// Target rule JSON file.
    pub rules_path: PathBuf,
    /// Folder receiving one file per problem label.
    pub outputs_dir: PathBuf,
    /// Redaction marker found in the source reports.
    pub placeholder: String,
    /// Token substituted for the placeholder during segmentation.
    pub stand_in: String,
    pub dedup_scope: DedupScope,
    pub label_source: LabelSource,
    pub output_format: OutputFormat,
    /// Extraction worker count; 1 runs on the calling task.
    pub workers: usize,
}

impl Settings {
    /// Load configuration from environment with reasonable defaults.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Resolve settings from `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let path_var = |key: &str, default: &str| {
            PathBuf::from(lookup(key).unwrap_or_else(|| default.to_string()))
        };
        let reports_path = path_var("REPORTS_PATH", "./mimic_cxr_reports.csv");
        let rules_path = path_var("RULES_PATH", "./config/problem_targets.json");
        let outputs_dir = path_var("OUTPUTS_DIR", "./temp/sentences");
        let placeholder = lookup("REDACTION_PLACEHOLDER").unwrap_or_else(|| "___".to_string());
        let stand_in = lookup("REDACTION_STAND_IN").unwrap_or_else(|| "PII".to_string());
        let dedup_scope = enum_var(&lookup, "DEDUP_SCOPE")?.unwrap_or_default();
        let label_source = enum_var(&lookup, "LABEL_SOURCE")?.unwrap_or_default();
        let output_format = enum_var(&lookup, "OUTPUT_FORMAT")?.unwrap_or_default();
        let workers = match lookup("WORKERS") {
            Some(raw) => parse_workers(&raw).with_context(|| format!("invalid WORKERS '{raw}'"))?,
            None => 1,
        };

        Ok(Self {
            reports_path,
            rules_path,
            outputs_dir,
            placeholder,
            stand_in,
            dedup_scope,
            label_source,
            output_format,
            workers,
        })
    }
}

/// Worker count parser shared by `WORKERS` and `--workers`; zero is rejected.
pub fn parse_workers(raw: &str) -> anyhow::Result<usize> {
    let workers: usize = raw
        .trim()
        .parse()
        .map_err(|_| anyhow!("expected a positive integer"))?;
    if workers == 0 {
        bail!("expected a positive integer, got 0");
    }
    Ok(workers)
}

fn enum_var<T: ValueEnum>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> anyhow::Result<Option<T>> {
    match lookup(key) {
        Some(raw) => T::from_str(raw.trim(), true)
            .map(Some)
            .map_err(|err| anyhow!("invalid {key}: {err}")),
        None => Ok(None),
    }
}
