//! Run summary written next to the partition files.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::{
    data::writer::{WriteFailure, WriteReport, WrittenPartition},
    error::Result,
    extract::aggregate::DedupScope,
    nlp::LabelSource,
};

pub const SUMMARY_FILE: &str = "_run_summary.json";

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub elapsed_secs: f64,
    pub reports: usize,
    /// Rows before corpus-wide deduplication.
    pub extracted_rows: usize,
    pub kept_rows: usize,
    pub stand_in_collisions: usize,
    pub dedup_scope: DedupScope,
    pub label_source: LabelSource,
    pub partitions: Vec<WrittenPartition>,
    pub failures: Vec<WriteFailure>,
    pub removed: Vec<PathBuf>,
}

impl RunSummary {
    pub fn attach(&mut self, report: WriteReport) {
        self.partitions = report.written;
        self.failures = report.failures;
        self.removed = report.removed;
    }
}

pub fn write_summary(dir: &Path, summary: &RunSummary) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(SUMMARY_FILE);
    let json = serde_json::to_string_pretty(summary).map_err(std::io::Error::other)?;
    std::fs::write(&path, json)?;
    info!(path = %path.display(), "wrote run summary");
    Ok(path)
}
