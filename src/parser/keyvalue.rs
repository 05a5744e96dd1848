//! Key/value section reading.
//!
//! Lines of the form `Key = Value [unit/comment]` are matched against a
//! per-section key table; keys the table does not know are silently
//! ignored (auto-grouping only happens for grid rows, at the tracker
//! layer). Sections accumulate in one of two modes: overwrite (default)
//! or additive, used by the multi-pool memory-status dumps where the same
//! field repeats once per pool.

use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which statistic best represents a series of samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKind {
    Min,
    Max,
    Average,
    Median,
}

/// Unit a group's samples are measured in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleUnit {
    Kilobytes,
    Seconds,
}

/// How repeated keys combine within one section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccumulateMode {
    /// A repeated key replaces the prior value
    Overwrite,
    /// A repeated key adds into the accumulated value
    Additive,
}

/// One accumulated record from a key/value section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyValueRecord {
    pub value: f64,
    pub priority: i32,
    pub stat_kind: StatKind,
    pub unit: SampleUnit,
}

/// Static key table entry: raw log key to report-facing record shape
#[derive(Debug, Clone, Copy)]
pub struct KeyTableEntry {
    pub key: &'static str,
    pub report_name: &'static str,
    pub priority: i32,
    pub stat_kind: StatKind,
    pub unit: SampleUnit,
}

/// A parsed key/value section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyValueSection {
    /// The opener line that introduced this section
    pub heading: String,

    /// Accumulated records keyed by report name
    pub entries: HashMap<String, KeyValueRecord>,
}

impl KeyValueSection {
    /// Value for a report name, if recorded
    pub fn value_of(&self, report_name: &str) -> Option<f64> {
        self.entries.get(report_name).map(|r| r.value)
    }
}

/// Parse the numeric portion of a raw value, dropping any trailing
/// space-delimited unit or comment (`"512 KB (peak)"` parses as 512).
pub fn parse_value(raw: &str) -> Option<f64> {
    raw.trim().split_whitespace().next()?.parse().ok()
}

/// Read key/value lines starting at `cursor` until a blank line.
///
/// Consumes the terminating blank line, leaving the cursor on the first
/// line after the section. Lines without `=` are ignored; unparseable
/// numerics record as 0.0 with a diagnostic.
pub fn read_key_values(
    heading: &str,
    lines: &[String],
    cursor: &mut usize,
    table: &[KeyTableEntry],
    mode: AccumulateMode,
) -> KeyValueSection {
    let mut section = KeyValueSection {
        heading: heading.to_string(),
        ..KeyValueSection::default()
    };

    while *cursor < lines.len() {
        let line = &lines[*cursor];
        if line.is_empty() {
            *cursor += 1;
            break;
        }
        *cursor += 1;

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            continue;
        };
        let key = raw_key.trim();

        let Some(entry) = table.iter().find(|e| e.key.eq_ignore_ascii_case(key)) else {
            continue;
        };

        let value = match parse_value(raw_value) {
            Some(v) => v,
            None => {
                warn!("Unparseable value for '{}' in '{}': {}", key, heading, raw_value.trim());
                0.0
            }
        };

        section
            .entries
            .entry(entry.report_name.to_string())
            .and_modify(|r| match mode {
                AccumulateMode::Overwrite => r.value = value,
                AccumulateMode::Additive => r.value += value,
            })
            .or_insert(KeyValueRecord {
                value,
                priority: entry.priority,
                stat_kind: entry.stat_kind,
                unit: entry.unit,
            });
    }

    section
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &[KeyTableEntry] = &[KeyTableEntry {
        key: "X",
        report_name: "Test X",
        priority: 1,
        stat_kind: StatKind::Max,
        unit: SampleUnit::Kilobytes,
    }];

    fn lines(text: &[&str]) -> Vec<String> {
        text.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_additive_mode_accumulates() {
        let input = lines(&["X = 5", "X = 7", ""]);
        let mut cursor = 0;
        let section =
            read_key_values("Mem", &input, &mut cursor, TABLE, AccumulateMode::Additive);

        assert_eq!(section.value_of("Test X"), Some(12.0));
        assert_eq!(cursor, 3);
    }

    #[test]
    fn test_overwrite_mode_replaces() {
        let input = lines(&["X = 5", "X = 7", ""]);
        let mut cursor = 0;
        let section =
            read_key_values("Mem", &input, &mut cursor, TABLE, AccumulateMode::Overwrite);

        assert_eq!(section.value_of("Test X"), Some(7.0));
    }

    #[test]
    fn test_unmapped_keys_are_ignored() {
        let input = lines(&["Y = 3", "X = 1 KB (peak)", ""]);
        let mut cursor = 0;
        let section =
            read_key_values("Mem", &input, &mut cursor, TABLE, AccumulateMode::Overwrite);

        assert_eq!(section.entries.len(), 1);
        assert_eq!(section.value_of("Test X"), Some(1.0));
    }
}
