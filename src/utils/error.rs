//! Error types for the snapshot engine.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use thiserror::Error;

/// Errors that can occur while parsing a snapshot
///
/// Most grammar violations degrade gracefully (sentinel values, skipped
/// rows) and never surface here; these variants cover the cases where a
/// whole file cannot be used.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Snapshot '{0}' is empty")]
    EmptyInput(String),

    #[error("Failed to read snapshot file: {0}")]
    ReadFailed(#[from] std::io::Error),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}
