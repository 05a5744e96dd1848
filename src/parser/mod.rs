//! Parsing of engine log dumps into typed snapshots.
//!
//! A snapshot's text is driven through an ordered prefix-dispatched
//! grammar; each registered parser consumes the lines of its section and
//! produces a typed `Section`. A post-parse cook pass computes derived
//! scalars per section kind.

pub mod grammar;
pub mod grid;
pub mod keyvalue;
pub mod section;
pub mod snapshot;
pub mod timestamp;

// Re-export the types most callers need
pub use grammar::{clean_line, SectionGrammar, SectionKind};
pub use grid::GridSection;
pub use keyvalue::{AccumulateMode, KeyValueRecord, KeyValueSection, SampleUnit, StatKind};
pub use section::{ClassRow, CookContext, Section};
pub use snapshot::{parse_batch, BatchControl, ProgressFn, Snapshot, SnapshotInput};
