//! JSON report writers.
//!
//! Writes report structs to JSON files with proper formatting.

use log::{debug, info};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::reporter::AggregationReport;
use crate::simulator::RecastReport;
use crate::utils::error::OutputError;

/// Write an aggregation report to a JSON file
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - Path cannot be created or is invalid
pub fn write_report(
    report: &AggregationReport,
    output_path: impl AsRef<Path>,
) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing report to: {}", output_path.display());

    super::validate_path(output_path)?;

    if let Some(parent) = output_path.parent() {
        if !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!(
                    "Cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    let file = File::create(output_path).map_err(OutputError::WriteFailed)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, report).map_err(OutputError::SerializationFailed)?;

    info!(
        "Report written: {} groups, {} files",
        report.summaries.len(),
        report.files.len()
    );

    Ok(())
}

/// Write a recast comparison report to a JSON file
pub fn write_recast_report(
    report: &RecastReport,
    output_path: impl AsRef<Path>,
) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing recast report to: {}", output_path.display());

    super::validate_path(output_path)?;

    let file = File::create(output_path).map_err(OutputError::WriteFailed)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, report).map_err(OutputError::SerializationFailed)?;

    Ok(())
}

/// Read an aggregation report back from a JSON file
///
/// Useful for validation, merging, and testing.
pub fn read_report(input_path: impl AsRef<Path>) -> Result<AggregationReport, OutputError> {
    let input_path = input_path.as_ref();

    debug!("Reading report from: {}", input_path.display());

    let file = File::open(input_path).map_err(OutputError::WriteFailed)?;
    let report: AggregationReport =
        serde_json::from_reader(file).map_err(OutputError::SerializationFailed)?;

    debug!(
        "Report loaded: version {}, {} files",
        report.version,
        report.files.len()
    );

    Ok(report)
}
