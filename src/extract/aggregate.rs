//! Corpus-level extraction, deduplication, and partitioning by problem.

use std::{
    collections::{BTreeMap, HashSet},
    sync::Arc,
};

use clap::ValueEnum;
use futures::future::try_join_all;
use indexmap::IndexSet;
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    data::Report,
    error::{PipelineError, Result},
    extract::{extract_study, ExtractionRow, Redaction},
    nlp::Annotate,
};

/// How far the post-concatenation deduplication reaches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DedupScope {
    /// Identical `(problem, sentence)` pairs collapse across studies; the
    /// first row in input order survives.
    #[default]
    Corpus,
    /// Only exact duplicate rows collapse; study provenance is kept.
    Study,
}

/// Rows grouped by problem label, labels in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProblemPartitions {
    partitions: BTreeMap<String, Vec<ExtractionRow>>,
}

impl ProblemPartitions {
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.partitions.keys().map(String::as_str)
    }

    pub fn get(&self, label: &str) -> Option<&[ExtractionRow]> {
        self.partitions.get(label).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ExtractionRow])> {
        self.partitions
            .iter()
            .map(|(label, rows)| (label.as_str(), rows.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    pub fn total_rows(&self) -> usize {
        self.partitions.values().map(Vec::len).sum()
    }

    /// All rows, partition by partition.
    pub fn rows(&self) -> impl Iterator<Item = &ExtractionRow> {
        self.partitions.values().flatten()
    }
}

/// Run the extractor over every report and concatenate in input order.
pub fn extract_corpus(
    reports: &[Report],
    pipeline: &dyn Annotate,
    redaction: &Redaction,
) -> Vec<ExtractionRow> {
    reports
        .iter()
        .flat_map(|report| {
            extract_study(report.study_id, report.body.as_deref(), pipeline, redaction)
        })
        .collect()
}

/// Same result as `extract_corpus`, spread over `workers` blocking tasks.
///
/// Reports are split into contiguous chunks and the chunk results are
/// re-joined in order.
pub async fn extract_corpus_parallel<P>(
    reports: Arc<[Report]>,
    pipeline: Arc<P>,
    redaction: Arc<Redaction>,
    workers: usize,
) -> Result<Vec<ExtractionRow>>
where
    P: Annotate + 'static,
{
    let workers = workers.max(1);
    if workers == 1 || reports.len() < 2 {
        return Ok(extract_corpus(&reports, pipeline.as_ref(), &redaction));
    }
    let chunk = reports.len().div_ceil(workers);
    let tasks = (0..reports.len()).step_by(chunk).map(|begin| {
        let end = (begin + chunk).min(reports.len());
        let reports = Arc::clone(&reports);
        let pipeline = Arc::clone(&pipeline);
        let redaction = Arc::clone(&redaction);
        tokio::task::spawn_blocking(move || {
            debug!(begin, end, "extracting chunk");
            extract_corpus(&reports[begin..end], pipeline.as_ref(), &redaction)
        })
    });
    let chunks = try_join_all(tasks)
        .await
        .map_err(|err| PipelineError::Worker(err.to_string()))?;
    Ok(chunks.into_iter().flatten().collect())
}

/// Deduplicate concatenated rows and split them by problem label.
///
/// Sentinel rows are only collapsed when exactly equal, so every study that
/// produced one keeps it.
pub fn partition_rows(rows: Vec<ExtractionRow>, scope: DedupScope) -> ProblemPartitions {
    let before = rows.len();
    let unique: IndexSet<ExtractionRow> = match scope {
        DedupScope::Study => rows.into_iter().collect(),
        DedupScope::Corpus => {
            let mut seen: HashSet<(String, String)> = HashSet::new();
            rows.into_iter()
                .filter(|row| {
                    row.is_sentinel() || seen.insert((row.problem.clone(), row.sentence.clone()))
                })
                .collect()
        }
    };
    debug!(before, after = unique.len(), ?scope, "deduplicated rows");

    let mut partitions: BTreeMap<String, Vec<ExtractionRow>> = BTreeMap::new();
    for row in unique {
        partitions.entry(row.problem.clone()).or_default().push(row);
    }
    ProblemPartitions { partitions }
}

/// Extract, deduplicate, and partition a whole corpus.
pub fn aggregate(
    reports: &[Report],
    pipeline: &dyn Annotate,
    redaction: &Redaction,
    scope: DedupScope,
) -> ProblemPartitions {
    let rows = extract_corpus(reports, pipeline, redaction);
    let partitions = partition_rows(rows, scope);
    info!(
        reports = reports.len(),
        partitions = partitions.len(),
        rows = partitions.total_rows(),
        "aggregated corpus"
    );
    partitions
}

/// Number of reports that already contain the redaction stand-in.
pub fn collision_count(reports: &[Report], redaction: &Redaction) -> usize {
    reports
        .iter()
        .filter_map(|r| r.body.as_deref())
        .filter(|body| redaction.collides(body))
        .count()
}
