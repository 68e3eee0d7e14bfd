//! Report table ingestion from CSV or Parquet.

use std::{fs::File, path::Path};

use polars::prelude::{DataType, ParquetReader, SerReader};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{PipelineError, Result};

pub const STUDY_ID: &str = "study_id";
pub const BODY: &str = "body";

/// One radiology report. `body` is `None` when no report text exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub study_id: i64,
    pub body: Option<String>,
}

impl Report {
    pub fn new(study_id: i64, body: Option<&str>) -> Self {
        Self {
            study_id,
            body: body.map(str::to_string),
        }
    }
}

/// Read the whole report table, picking the reader from the file extension.
pub fn load_reports(path: &Path) -> Result<Vec<Report>> {
    if !path.exists() {
        return Err(PipelineError::input(path, "file does not exist"));
    }
    let is_parquet = path
        .extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("parquet") || ext.eq_ignore_ascii_case("pq"));
    let reports = if is_parquet {
        read_parquet(path)?
    } else {
        read_csv(path)?
    };
    info!(path = %path.display(), reports = reports.len(), "loaded reports");
    Ok(reports)
}

fn read_csv(path: &Path) -> Result<Vec<Report>> {
    // Headers are trimmed so `study_id, body` binds the same fields serde sees.
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_path(path)
        .map_err(|err| PipelineError::input(path, err))?;
    let headers = reader
        .headers()
        .map_err(|err| PipelineError::input(path, err))?
        .clone();
    for required in [STUDY_ID, BODY] {
        if !headers.iter().any(|h| h == required) {
            return Err(PipelineError::input(
                path,
                format!("missing required column '{required}'"),
            ));
        }
    }

    let mut reports = Vec::new();
    for result in reader.deserialize() {
        let report: Report = result.map_err(|err| PipelineError::input(path, err))?;
        reports.push(report);
    }
    Ok(reports)
}

fn read_parquet(path: &Path) -> Result<Vec<Report>> {
    let file = File::open(path).map_err(|err| PipelineError::input(path, err))?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|err| PipelineError::input(path, err))?;
    let column = |name: &str| {
        df.column(name).map_err(|_| {
            PipelineError::input(path, format!("missing required column '{name}'"))
        })
    };

    let ids = column(STUDY_ID)?
        .cast(&DataType::Int64)
        .map_err(|err| PipelineError::input(path, err))?;
    let bodies = column(BODY)?
        .cast(&DataType::String)
        .map_err(|err| PipelineError::input(path, err))?;
    let ids = ids.i64().map_err(|err| PipelineError::input(path, err))?;
    let bodies = bodies.str().map_err(|err| PipelineError::input(path, err))?;

    let mut reports = Vec::with_capacity(df.height());
    for (row, (study_id, body)) in ids.into_iter().zip(bodies.into_iter()).enumerate() {
        let study_id = study_id
            .ok_or_else(|| PipelineError::input(path, format!("null study_id at row {row}")))?;
        reports.push(Report::new(study_id, body));
    }
    Ok(reports)
}
