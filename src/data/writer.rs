//! Persistence of per-problem partitions, one file per label.

use std::{
    collections::{HashMap, HashSet},
    fs::{self, File},
    path::{Path, PathBuf},
};

use clap::ValueEnum;
use polars::prelude::{
    CsvWriter, DataFrame, NamedFrom, ParquetWriter, PolarsResult, SerWriter, Series,
};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::{
    error::{PipelineError, Result},
    extract::{aggregate::ProblemPartitions, ExtractionRow},
};

/// File format of the partition outputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Csv,
    Parquet,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Parquet => "parquet",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WrittenPartition {
    pub label: String,
    pub path: PathBuf,
    pub rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct WriteFailure {
    pub label: String,
    pub error: String,
}

/// Outcome of writing every partition; failures do not stop later writes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WriteReport {
    pub written: Vec<WrittenPartition>,
    pub failures: Vec<WriteFailure>,
    /// Partition files from an earlier run that were deleted.
    pub removed: Vec<PathBuf>,
}

impl WriteReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// File stem for a label: anything outside `[A-Za-z0-9 _-]` becomes `_`.
pub fn file_stem(label: &str) -> String {
    label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Write each partition to `<dir>/<label>.<ext>`.
///
/// CSV and Parquet files in `dir` that no current partition maps to are
/// deleted first, so the folder only holds this run's labels.
pub fn write_partitions(
    partitions: &ProblemPartitions,
    dir: &Path,
    format: OutputFormat,
) -> WriteReport {
    let mut report = WriteReport::default();
    let dir_error = fs::create_dir_all(dir).err().map(|err| err.to_string());
    if dir_error.is_none() {
        let keep: HashSet<String> = partitions
            .labels()
            .map(|label| format!("{}.{}", file_stem(label), format.extension()))
            .collect();
        report.removed = remove_stale(dir, &keep);
    }
    let mut stems: HashMap<String, &str> = HashMap::new();

    for (label, rows) in partitions.iter() {
        let stem = file_stem(label);
        let path = dir.join(format!("{stem}.{}", format.extension()));
        let outcome = if let Some(reason) = &dir_error {
            Err(PipelineError::write(label, &path, reason))
        } else if let Some(owner) = stems.get(&stem) {
            Err(PipelineError::write(
                label,
                &path,
                format!("file name collides with partition '{owner}'"),
            ))
        } else {
            stems.insert(stem, label);
            write_partition(label, rows, &path, format)
        };

        match outcome {
            Ok(()) => {
                info!(path = %path.display(), rows = rows.len(), "wrote partition");
                report.written.push(WrittenPartition {
                    label: label.to_string(),
                    path,
                    rows: rows.len(),
                });
            }
            Err(err) => {
                error!(%err, "partition not written");
                report.failures.push(WriteFailure {
                    label: label.to_string(),
                    error: err.to_string(),
                });
            }
        }
    }
    report
}

/// Delete partition-like files in `dir` whose names are not in `keep`.
fn remove_stale(dir: &Path, keep: &HashSet<String>) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(dir = %dir.display(), %err, "could not list output folder");
            return Vec::new();
        }
    };
    let mut removed = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let is_partition = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                [OutputFormat::Csv, OutputFormat::Parquet]
                    .iter()
                    .any(|format| format.extension() == ext)
            });
        let name = entry.file_name().to_string_lossy().into_owned();
        if !is_partition || !path.is_file() || keep.contains(&name) {
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(path = %path.display(), "removed stale partition");
                removed.push(path);
            }
            Err(err) => warn!(path = %path.display(), %err, "could not remove stale partition"),
        }
    }
    removed.sort();
    removed
}

fn write_partition(
    label: &str,
    rows: &[ExtractionRow],
    path: &Path,
    format: OutputFormat,
) -> Result<()> {
    let as_write_err = |err: &dyn std::fmt::Display| PipelineError::write(label, path, err);
    let mut df = rows_to_frame(rows).map_err(|err| as_write_err(&err))?;
    let mut file = File::create(path).map_err(|err| as_write_err(&err))?;
    match format {
        OutputFormat::Csv => {
            CsvWriter::new(&mut file)
                .include_header(true)
                .finish(&mut df)
                .map_err(|err| as_write_err(&err))?;
        }
        OutputFormat::Parquet => {
            ParquetWriter::new(file)
                .finish(&mut df)
                .map_err(|err| as_write_err(&err))?;
        }
    }
    Ok(())
}

/// Tabular form of a partition: `study_id, sent_id, problem, sentence`.
pub fn rows_to_frame(rows: &[ExtractionRow]) -> PolarsResult<DataFrame> {
    let study_ids: Vec<i64> = rows.iter().map(|r| r.study_id).collect();
    let sent_ids: Vec<i64> = rows.iter().map(|r| r.sent_id).collect();
    let problems: Vec<String> = rows.iter().map(|r| r.problem.clone()).collect();
    let sentences: Vec<String> = rows.iter().map(|r| r.sentence.clone()).collect();
    DataFrame::new(vec![
        Series::new("study_id".into(), study_ids),
        Series::new("sent_id".into(), sent_ids),
        Series::new("problem".into(), problems),
        Series::new("sentence".into(), sentences),
    ])
}
