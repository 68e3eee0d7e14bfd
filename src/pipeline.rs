//! The batch run: load reports, extract, aggregate, and write partitions.

use std::{sync::Arc, time::Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};

use crate::{
    config::Settings,
    data::{
        self,
        summary::{write_summary, RunSummary},
        Report,
    },
    extract::{aggregate, Redaction},
    nlp,
};

/// Load, extract, aggregate, and write; returns the persisted summary.
pub async fn find_problems(settings: &Settings) -> Result<RunSummary> {
    let started_at = Utc::now();
    let timer = Instant::now();

    let redaction = Redaction::new(&settings.placeholder, &settings.stand_in)?;

    info!(path = %settings.reports_path.display(), "loading reports");
    let reports: Arc<[Report]> = data::load_reports(&settings.reports_path)?.into();

    info!(path = %settings.rules_path.display(), "initialising pipeline");
    let pipeline = nlp::load_pipeline(&settings.rules_path, settings.label_source)?;
    redaction.check_rules(pipeline.rules())?;

    let collisions = aggregate::collision_count(&reports, &redaction);
    if collisions > 0 {
        warn!(
            collisions,
            stand_in = %redaction.stand_in(),
            "reports already contain the stand-in; placeholder substitution skipped for them"
        );
    }

    info!(reports = reports.len(), workers = settings.workers, "processing studies");
    let rows = aggregate::extract_corpus_parallel(
        Arc::clone(&reports),
        pipeline,
        Arc::new(redaction),
        settings.workers,
    )
    .await?;
    let extracted_rows = rows.len();
    let partitions = aggregate::partition_rows(rows, settings.dedup_scope);

    let report = data::write_partitions(&partitions, &settings.outputs_dir, settings.output_format);

    let mut summary = RunSummary {
        started_at,
        elapsed_secs: 0.0,
        reports: reports.len(),
        extracted_rows,
        kept_rows: partitions.total_rows(),
        stand_in_collisions: collisions,
        dedup_scope: settings.dedup_scope,
        label_source: settings.label_source,
        partitions: Vec::new(),
        failures: Vec::new(),
        removed: Vec::new(),
    };
    summary.attach(report);
    summary.elapsed_secs = timer.elapsed().as_secs_f64();
    write_summary(&settings.outputs_dir, &summary).context("writing run summary")?;

    info!(
        partitions = summary.partitions.len(),
        rows = summary.kept_rows,
        seconds = summary.elapsed_secs,
        "done"
    );
    Ok(summary)
}
