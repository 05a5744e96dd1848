//! Output writers for aggregation and recast reports.
//!
//! The engine's responsibility ends at the report structures; this
//! module only serializes them to JSON for the external report writer.

pub mod json;

// Re-export main functions
pub use json::{read_report, write_recast_report, write_report};

use crate::utils::error::OutputError;
use std::path::Path;

/// Common path validation for output files
pub fn validate_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    if path.exists() && path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}
