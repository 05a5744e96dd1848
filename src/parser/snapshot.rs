//! Snapshot parsing and the batch driver.
//!
//! A snapshot is one parsed log file: its sections in document order, a
//! best-effort capture time, and the pool-size correction that was folded
//! into its memory figures at cook time. Snapshots are immutable once
//! cooked.

use chrono::NaiveDateTime;
use log::{info, warn};

use super::grammar::{clean_line, SectionGrammar};
use super::section::{
    CaptureLocationSection, CookContext, LevelStreamingSection, MemStatsSection,
    ObjectListSection, PoolStatsSection, Section, TextureStreamingSection,
};
use super::timestamp;
use crate::utils::error::ParseError;

/// One raw input to the batch driver
#[derive(Debug, Clone)]
pub struct SnapshotInput {
    /// Source identity (file name or path), also used for the
    /// timestamp fallback
    pub name: String,

    /// Full log text
    pub text: String,
}

/// One parsed point-in-time engine-state dump
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Source identity (path or file name)
    pub source_name: String,

    /// Sections in document order
    pub sections: Vec<Section>,

    /// Best-effort capture time: header date, else filename fragment,
    /// else None (file-modification time is an external tie-break only)
    pub capture_time: Option<NaiveDateTime>,

    /// Correction applied to the free-memory figures at cook time, in KB
    pub reduce_pool_size_kb: i32,
}

impl Snapshot {
    /// Parse and cook one log text.
    ///
    /// The raw text is only borrowed for the duration of the parse; the
    /// returned snapshot owns its sections exclusively.
    ///
    /// # Errors
    /// * `ParseError::EmptyInput` - the text contains no non-blank lines
    pub fn parse(
        source_name: &str,
        text: &str,
        grammar: &SectionGrammar,
        reduce_pool_size_kb: i32,
    ) -> Result<Snapshot, ParseError> {
        let lines: Vec<String> = text.lines().map(|l| clean_line(l).to_string()).collect();
        if lines.iter().all(|l| l.is_empty()) {
            return Err(ParseError::EmptyInput(source_name.to_string()));
        }

        let mut sections = grammar.parse_lines(&lines);

        let ctx = CookContext { reduce_pool_size_kb };
        for section in &mut sections {
            section.cook(&ctx);
        }

        let header_line = sections.iter().find_map(|s| match s {
            Section::Header(h) => Some(h.heading.as_str()),
            _ => None,
        });
        let capture_time = timestamp::derive_capture_time(header_line, source_name);

        Ok(Snapshot {
            source_name: source_name.to_string(),
            sections,
            capture_time,
            reduce_pool_size_kb,
        })
    }

    /// First object-list section, if any
    pub fn object_list(&self) -> Option<&ObjectListSection> {
        self.sections.iter().find_map(|s| match s {
            Section::ObjectList(o) => Some(o),
            _ => None,
        })
    }

    /// First memory-statistics section, if any
    pub fn mem_stats(&self) -> Option<&MemStatsSection> {
        self.sections.iter().find_map(|s| match s {
            Section::MemStats(m) => Some(m),
            _ => None,
        })
    }

    /// First allocator pool histogram, if any
    pub fn pool_stats(&self) -> Option<&PoolStatsSection> {
        self.sections.iter().find_map(|s| match s {
            Section::PoolStats(p) => Some(p),
            _ => None,
        })
    }

    /// First texture streaming section, if any
    pub fn texture_streaming(&self) -> Option<&TextureStreamingSection> {
        self.sections.iter().find_map(|s| match s {
            Section::TextureStreaming(t) => Some(t),
            _ => None,
        })
    }

    /// First level streaming section, if any
    pub fn level_streaming(&self) -> Option<&LevelStreamingSection> {
        self.sections.iter().find_map(|s| match s {
            Section::LevelStreaming(l) => Some(l),
            _ => None,
        })
    }

    /// First capture-coordinate section, if any
    pub fn capture_location(&self) -> Option<&CaptureLocationSection> {
        self.sections.iter().find_map(|s| match s {
            Section::CaptureLocation(c) => Some(c),
            _ => None,
        })
    }
}

/// Whether a batch continues after a progress report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchControl {
    Continue,
    /// Stop scheduling further files; files already parsed are kept
    Cancel,
}

/// Cooperative progress callback: percentage complete and a status
/// line. Invoked after each file; must not mutate pipeline state.
pub type ProgressFn = dyn Fn(f32, &str) -> BatchControl;

/// Parse an ordered batch of log texts.
///
/// A file whose parse fails is reported and skipped; the batch
/// continues. Cancellation via the callback stops scheduling further
/// files - a snapshot parse is atomic, so no partially cooked snapshot
/// is ever returned.
pub fn parse_batch(
    inputs: &[SnapshotInput],
    grammar: &SectionGrammar,
    reduce_pool_size_kb: i32,
    progress: Option<&ProgressFn>,
) -> Vec<Snapshot> {
    let mut snapshots = Vec::with_capacity(inputs.len());

    for (index, input) in inputs.iter().enumerate() {
        match Snapshot::parse(&input.name, &input.text, grammar, reduce_pool_size_kb) {
            Ok(snapshot) => {
                info!(
                    "Parsed '{}': {} sections",
                    snapshot.source_name,
                    snapshot.sections.len()
                );
                snapshots.push(snapshot);
            }
            Err(err) => {
                warn!("Skipping '{}': {}", input.name, err);
            }
        }

        if let Some(report) = progress {
            let percent = ((index + 1) as f32 / inputs.len() as f32) * 100.0;
            let status = format!("Parsed {} of {}", index + 1, inputs.len());
            if report(percent, &status) == BatchControl::Cancel {
                info!("Batch cancelled after {} of {} files", index + 1, inputs.len());
                break;
            }
        }
    }

    snapshots
}
