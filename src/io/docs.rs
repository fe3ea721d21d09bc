//! Documentation artifacts under `docs/`.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::QualityMetrics;
use crate::error::AppError;

pub fn write_schema_doc(path: &Path, markdown: &str) -> Result<(), AppError> {
    std::fs::write(path, markdown).map_err(|e| AppError::io("write schema document", path, e))
}

/// Write `docs/quality_metrics.json` (pretty-printed, trailing newline).
pub fn write_quality_metrics(path: &Path, metrics: &QualityMetrics) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| AppError::io("create quality metrics", path, e))?;
    serde_json::to_writer_pretty(&mut file, metrics).map_err(|e| AppError::io("write quality metrics", path, e))?;
    file.write_all(b"\n")
        .map_err(|e| AppError::io("write quality metrics", path, e))
}

#[cfg(test)]
pub fn read_quality_metrics(path: &Path) -> Result<QualityMetrics, AppError> {
    let file = File::open(path).map_err(|e| AppError::io("open quality metrics", path, e))?;
    serde_json::from_reader(file).map_err(|e| AppError::io("parse quality metrics", path, e))
}
