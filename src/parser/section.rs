//! Typed report sections and the post-parse cook pass.
//!
//! A section's kind is fixed at parse time by the grammar; cooking never
//! changes the kind, it only computes derived scalars inside the payload
//! (capture coordinates, normalized memory records, pool histograms).
//! The original tool dispatched a virtual Cook() over a class hierarchy;
//! here the closed enum makes the cook pass exhaustively checkable.

use chrono::NaiveDateTime;
use log::warn;
use serde::{Deserialize, Serialize};

use super::grid::{read_grid, GridSection};
use super::keyvalue::{
    read_key_values, AccumulateMode, KeyTableEntry, KeyValueSection, SampleUnit, StatKind,
};
use super::timestamp;
use crate::simulator::{PoolBucket, PoolSet};
use crate::utils::config;

/// Context threaded into the cook pass.
///
/// The pool-size correction is an explicit per-invocation parameter, not
/// process-wide state: callers supply it for each snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct CookContext {
    /// Correction added to the two free-memory records, in KB
    pub reduce_pool_size_kb: i32,
}

/// A structurally distinct sub-report within a snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Section {
    Header(HeaderSection),
    ObjectList(ObjectListSection),
    MemStats(MemStatsSection),
    PoolStats(PoolStatsSection),
    TextureStreaming(TextureStreamingSection),
    SoundDump(SoundDumpSection),
    LevelStreaming(LevelStreamingSection),
    CaptureLocation(CaptureLocationSection),
    KeyValue(KeyValueSection),
    Grid(GridSection),
    Raw(RawSection),
}

impl Section {
    /// Compute derived fields. Order-independent across sections and
    /// idempotent per section; the kind never changes.
    pub fn cook(&mut self, ctx: &CookContext) {
        match self {
            Section::Header(s) => s.cook(),
            Section::ObjectList(s) => s.cook(),
            Section::MemStats(s) => s.cook(ctx),
            Section::PoolStats(s) => s.cook(),
            Section::TextureStreaming(s) => s.cook(),
            Section::SoundDump(s) => s.cook(),
            Section::LevelStreaming(s) => s.cook(),
            Section::CaptureLocation(s) => s.cook(),
            Section::KeyValue(_) | Section::Grid(_) | Section::Raw(_) => {}
        }
    }

    /// Key/value records carried by this section, if it is one of the
    /// key/value kinds
    pub fn key_value_entries(&self) -> Option<&KeyValueSection> {
        match self {
            Section::MemStats(s) => Some(&s.entries),
            Section::TextureStreaming(s) => Some(&s.entries),
            Section::KeyValue(s) => Some(s),
            _ => None,
        }
    }
}

/// An unrecognized block captured verbatim
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSection {
    /// First line of the block, used as its label
    pub heading: String,

    /// Remaining lines through the next blank line
    pub lines: Vec<String>,
}

// ---------------------------------------------------------------------
// Header

/// Log header: capture timestamp, build info, command line
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeaderSection {
    pub heading: String,
    pub lines: Vec<String>,

    /// Derived: parsed from the opener line
    pub capture_time: Option<NaiveDateTime>,

    /// Derived: from a `Command line:` line, when present
    pub command_line: Option<String>,
}

impl HeaderSection {
    fn cook(&mut self) {
        self.capture_time = timestamp::from_header_line(&self.heading);
        self.command_line = self
            .lines
            .iter()
            .find_map(|l| l.strip_prefix("Command line:"))
            .map(|c| c.trim().to_string());
    }
}

pub(super) fn parse_header(opener: &str, lines: &[String], cursor: &mut usize) -> Section {
    let mut section = HeaderSection {
        heading: opener.to_string(),
        ..HeaderSection::default()
    };
    *cursor += 1;

    while *cursor < lines.len() {
        let line = &lines[*cursor];
        *cursor += 1;
        if line.is_empty() {
            break;
        }
        section.lines.push(line.clone());
    }

    Section::Header(section)
}

// ---------------------------------------------------------------------
// Object list

/// One cooked class row from the object-list dump
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassRow {
    pub class_name: String,
    pub count: u64,
    pub num_kb: f64,
    pub max_kb: f64,
    pub res_kb: f64,

    /// Derived: MaxKB plus resident KB, the default per-class size
    pub approx_total_kb: f64,
}

/// Per-class object dump (`Obj List:`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectListSection {
    pub grid: GridSection,

    /// Derived: one row per parseable class line
    pub classes: Vec<ClassRow>,
}

fn object_list_trailer(cells: &[String]) -> bool {
    cells.len() >= 2
        && cells[0].parse::<u64>().is_ok()
        && cells[1].trim_end_matches(':').eq_ignore_ascii_case("Objects")
}

impl ObjectListSection {
    fn cook(&mut self) {
        let Some(class_col) = self.grid.find_column(config::OBJ_CLASS_COLUMNS) else {
            warn!("Object list '{}' has no class column", self.grid.heading);
            return;
        };
        let count_col = self.grid.find_column(config::OBJ_COUNT_COLUMNS);
        let num_col = self.grid.find_column(config::OBJ_NUM_KB_COLUMNS);
        let max_col = self.grid.find_column(config::OBJ_MAX_KB_COLUMNS);
        let res_col = self.grid.find_column(config::OBJ_RES_KB_COLUMNS);

        let numeric = |row: usize, col: Option<usize>| -> f64 {
            col.and_then(|c| self.grid.cell(row, c))
                .and_then(|v| v.parse().ok())
                .unwrap_or(0.0)
        };

        self.classes.clear();
        for row in 0..self.grid.rows.len() {
            let class_name = match self.grid.cell(row, class_col) {
                Some(name) => name.to_string(),
                None => continue,
            };
            let count = count_col
                .and_then(|c| self.grid.cell(row, c))
                .and_then(|v| v.parse().ok())
                .unwrap_or(0);
            let num_kb = numeric(row, num_col);
            let max_kb = numeric(row, max_col);
            let mut res_kb = numeric(row, res_col);

            // Some engine versions report the resident column as a copy
            // of NumKB or MaxKB rather than a real measurement; such a
            // value is bogus and dropped.
            if res_kb != 0.0 && (res_kb == num_kb || res_kb == max_kb) {
                res_kb = 0.0;
            }

            self.classes.push(ClassRow {
                approx_total_kb: max_kb + res_kb,
                class_name,
                count,
                num_kb,
                max_kb,
                res_kb,
            });
        }
    }
}

pub(super) fn parse_object_list(opener: &str, lines: &[String], cursor: &mut usize) -> Section {
    *cursor += 1;
    let grid = read_grid(opener, lines, cursor, &[' ', '\t'], Some(object_list_trailer));
    Section::ObjectList(ObjectListSection {
        grid,
        classes: Vec::new(),
    })
}

// ---------------------------------------------------------------------
// Memory statistics

/// Report names of the two free-memory records receiving the
/// reduce-pool-size correction.
pub const FREE_MEMORY_RECORDS: &[&str] = &["MemStats TitleFreeKB", "MemStats LowestFreeKB"];

const MEM_STATS_KEYS: &[KeyTableEntry] = &[
    KeyTableEntry {
        key: "TitleFreeKB",
        report_name: "MemStats TitleFreeKB",
        priority: config::IMPORTANT_PRIORITY,
        stat_kind: StatKind::Min,
        unit: SampleUnit::Kilobytes,
    },
    KeyTableEntry {
        key: "LowestRecordedFreeKB",
        report_name: "MemStats LowestFreeKB",
        priority: config::IMPORTANT_PRIORITY,
        stat_kind: StatKind::Min,
        unit: SampleUnit::Kilobytes,
    },
    KeyTableEntry {
        key: "AllocatedKB",
        report_name: "MemStats AllocatedKB",
        priority: config::IMPORTANT_PRIORITY,
        stat_kind: StatKind::Max,
        unit: SampleUnit::Kilobytes,
    },
    KeyTableEntry {
        key: "PoolAllocatedKB",
        report_name: "MemStats PoolAllocatedKB",
        priority: config::DEFAULT_GROUP_PRIORITY,
        stat_kind: StatKind::Max,
        unit: SampleUnit::Kilobytes,
    },
    KeyTableEntry {
        key: "ImageKB",
        report_name: "MemStats ImageKB",
        priority: config::DEFAULT_GROUP_PRIORITY,
        stat_kind: StatKind::Max,
        unit: SampleUnit::Kilobytes,
    },
    KeyTableEntry {
        key: "StackKB",
        report_name: "MemStats StackKB",
        priority: config::DEFAULT_GROUP_PRIORITY,
        stat_kind: StatKind::Max,
        unit: SampleUnit::Kilobytes,
    },
    KeyTableEntry {
        key: "FileCacheKB",
        report_name: "MemStats FileCacheKB",
        priority: config::DEFAULT_GROUP_PRIORITY,
        stat_kind: StatKind::Max,
        unit: SampleUnit::Kilobytes,
    },
];

/// System memory statistics dump (`DmQueryTitleMemoryStatistics`).
///
/// Accumulates additively: the dump repeats per-pool fields once per
/// pool, and the report wants their sum.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemStatsSection {
    pub entries: KeyValueSection,

    /// Correction that was folded into the free-memory records, kept for
    /// the reporter's correction meta-series
    pub applied_reduce_pool_kb: i32,
}

impl MemStatsSection {
    fn cook(&mut self, ctx: &CookContext) {
        if self.applied_reduce_pool_kb != 0 || ctx.reduce_pool_size_kb == 0 {
            return;
        }
        for name in FREE_MEMORY_RECORDS {
            if let Some(record) = self.entries.entries.get_mut(*name) {
                record.value += f64::from(ctx.reduce_pool_size_kb);
            }
        }
        self.applied_reduce_pool_kb = ctx.reduce_pool_size_kb;
    }
}

pub(super) fn parse_mem_stats(opener: &str, lines: &[String], cursor: &mut usize) -> Section {
    *cursor += 1;
    let entries = read_key_values(opener, lines, cursor, MEM_STATS_KEYS, AccumulateMode::Additive);
    Section::MemStats(MemStatsSection {
        entries,
        applied_reduce_pool_kb: 0,
    })
}

// ---------------------------------------------------------------------
// Pool statistics

/// Allocator bucket histogram (`Memory pool stats`).
///
/// Grid columns: Kind ElementSize BlockSize NumBlocks CurAllocs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoolStatsSection {
    pub grid: GridSection,

    /// Derived: one PoolSet per pool kind, buckets ascending by element size
    pub pools: Vec<PoolSet>,
}

impl PoolStatsSection {
    fn cook(&mut self) {
        self.pools.clear();

        for (row_index, row) in self.grid.rows.iter().enumerate() {
            let parsed = (|| -> Option<(String, PoolBucket)> {
                Some((
                    row.first()?.clone(),
                    PoolBucket {
                        element_size: row.get(1)?.parse().ok()?,
                        block_size: row.get(2)?.parse().ok()?,
                        num_blocks: row.get(3)?.parse().ok()?,
                        current_allocations: row.get(4)?.parse().ok()?,
                    },
                ))
            })();

            let Some((kind, bucket)) = parsed else {
                warn!("Skipping malformed pool row {} in '{}'", row_index, self.grid.heading);
                continue;
            };

            match self.pools.iter_mut().find(|p| p.kind_name == kind) {
                Some(pool) => pool.buckets.push(bucket),
                None => self.pools.push(PoolSet {
                    kind_name: kind,
                    buckets: vec![bucket],
                }),
            }
        }

        for pool in &mut self.pools {
            pool.buckets.sort_by_key(|b| b.element_size);
        }
    }
}

pub(super) fn parse_pool_stats(opener: &str, lines: &[String], cursor: &mut usize) -> Section {
    *cursor += 1;
    let grid = read_grid(opener, lines, cursor, &[' ', '\t'], None);
    Section::PoolStats(PoolStatsSection {
        grid,
        pools: Vec::new(),
    })
}

// ---------------------------------------------------------------------
// Texture streaming

const TEXTURE_STREAMING_KEYS: &[KeyTableEntry] = &[
    KeyTableEntry {
        key: "Current Pool",
        report_name: "TexturePool Current",
        priority: config::IMPORTANT_PRIORITY,
        stat_kind: StatKind::Max,
        unit: SampleUnit::Kilobytes,
    },
    KeyTableEntry {
        key: "Target Pool",
        report_name: "TexturePool Target",
        priority: config::DEFAULT_GROUP_PRIORITY,
        stat_kind: StatKind::Max,
        unit: SampleUnit::Kilobytes,
    },
    KeyTableEntry {
        key: "Over Budget",
        report_name: "TexturePool OverBudget",
        priority: config::IMPORTANT_PRIORITY,
        stat_kind: StatKind::Max,
        unit: SampleUnit::Kilobytes,
    },
    KeyTableEntry {
        key: "Streaming Textures",
        report_name: "TexturePool StreamingTextures",
        priority: config::DEFAULT_GROUP_PRIORITY,
        stat_kind: StatKind::Max,
        unit: SampleUnit::Kilobytes,
    },
];

/// Texture streaming pool status (`Current Texture Streaming Stats`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextureStreamingSection {
    pub entries: KeyValueSection,

    // Derived scalars
    pub current_kb: f64,
    pub target_kb: f64,
    pub over_budget_kb: f64,
}

impl TextureStreamingSection {
    fn cook(&mut self) {
        self.current_kb = self.entries.value_of("TexturePool Current").unwrap_or(0.0);
        self.target_kb = self.entries.value_of("TexturePool Target").unwrap_or(0.0);
        self.over_budget_kb = self
            .entries
            .value_of("TexturePool OverBudget")
            .unwrap_or((self.current_kb - self.target_kb).max(0.0));
    }
}

pub(super) fn parse_texture_streaming(
    opener: &str,
    lines: &[String],
    cursor: &mut usize,
) -> Section {
    *cursor += 1;
    let entries = read_key_values(
        opener,
        lines,
        cursor,
        TEXTURE_STREAMING_KEYS,
        AccumulateMode::Overwrite,
    );
    Section::TextureStreaming(TextureStreamingSection {
        entries,
        ..TextureStreamingSection::default()
    })
}

// ---------------------------------------------------------------------
// Sound dump

/// Per-sound listing (`Listing all sounds.`), comma delimited:
/// `,Size Kb,NumChannels,SoundName`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SoundDumpSection {
    pub grid: GridSection,

    /// Derived: sum of every parseable size cell
    pub total_size_kb: f64,
}

impl SoundDumpSection {
    fn cook(&mut self) {
        let size_col = self.grid.find_column(&["Size Kb", "SizeKb", "Size"]).unwrap_or(0);
        self.total_size_kb = self
            .grid
            .rows
            .iter()
            .filter_map(|row| row.get(size_col))
            .filter_map(|v| v.parse::<f64>().ok())
            .sum();
    }
}

pub(super) fn parse_sound_dump(opener: &str, lines: &[String], cursor: &mut usize) -> Section {
    *cursor += 1;
    let grid = read_grid(opener, lines, cursor, &[','], None);
    Section::SoundDump(SoundDumpSection {
        grid,
        total_size_kb: 0.0,
    })
}

// ---------------------------------------------------------------------
// Level streaming

/// One streamed level and its reported status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelStatus {
    pub name: String,
    pub status: String,
}

impl LevelStatus {
    /// Whether this level was resident at capture time
    pub fn is_loaded(&self) -> bool {
        self.status.contains("LOADED") && !self.status.contains("UNLOADED")
    }
}

/// Streamed level listing (`Level Streaming:`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LevelStreamingSection {
    pub heading: String,
    pub lines: Vec<String>,

    /// Derived: parsed `Level <name> - <status>` entries
    pub levels: Vec<LevelStatus>,
}

impl LevelStreamingSection {
    fn cook(&mut self) {
        self.levels = self
            .lines
            .iter()
            .filter_map(|line| {
                let rest = line.strip_prefix("Level ")?;
                let (name, status) = match rest.split_once('-') {
                    Some((n, s)) => (n.trim(), s.trim()),
                    None => (rest.trim(), ""),
                };
                Some(LevelStatus {
                    name: name.to_string(),
                    status: status.to_string(),
                })
            })
            .collect();
    }

    /// Names of levels resident at capture time
    pub fn loaded_level_names(&self) -> Vec<String> {
        self.levels
            .iter()
            .filter(|l| l.is_loaded())
            .map(|l| l.name.clone())
            .collect()
    }
}

pub(super) fn parse_level_streaming(opener: &str, lines: &[String], cursor: &mut usize) -> Section {
    let mut section = LevelStreamingSection {
        heading: opener.to_string(),
        ..LevelStreamingSection::default()
    };
    *cursor += 1;

    while *cursor < lines.len() {
        let line = &lines[*cursor];
        *cursor += 1;
        if line.is_empty() {
            break;
        }
        section.lines.push(line.clone());
    }

    Section::LevelStreaming(section)
}

// ---------------------------------------------------------------------
// Capture location

/// A "BugIt" capture coordinate (`BugItGo` / `DebugSetLocation`), a
/// single line of six floats: x y z pitch yaw roll
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureLocationSection {
    /// The full command line, preserved for the report
    pub command: String,

    // Derived vectors
    pub position: [f64; 3],
    pub rotation: [f64; 3],
}

impl CaptureLocationSection {
    fn cook(&mut self) {
        let values: Vec<f64> = self
            .command
            .split_whitespace()
            .skip(1)
            .filter_map(|v| v.parse().ok())
            .collect();

        for (i, v) in values.iter().take(3).enumerate() {
            self.position[i] = *v;
        }
        for (i, v) in values.iter().skip(3).take(3).enumerate() {
            self.rotation[i] = *v;
        }
        if values.len() < 6 {
            warn!("Capture location '{}' has {} coordinates, expected 6", self.command, values.len());
        }
    }
}

pub(super) fn parse_capture_location(
    opener: &str,
    _lines: &[String],
    cursor: &mut usize,
) -> Section {
    *cursor += 1;
    Section::CaptureLocation(CaptureLocationSection {
        command: opener.to_string(),
        position: [0.0; 3],
        rotation: [0.0; 3],
    })
}

// ---------------------------------------------------------------------
// Raw fallback

/// Capture an unrecognized block: the current line labels the section
/// and all following lines belong to it through the next blank line.
pub(super) fn parse_raw_block(lines: &[String], cursor: &mut usize) -> Section {
    let mut section = RawSection {
        heading: lines[*cursor].clone(),
        lines: Vec::new(),
    };
    *cursor += 1;

    while *cursor < lines.len() {
        let line = &lines[*cursor];
        *cursor += 1;
        if line.is_empty() {
            break;
        }
        section.lines.push(line.clone());
    }

    Section::Raw(section)
}
