//! Prefix-dispatched section grammar.
//!
//! An ordered list of (prefix, parser) pairs is tested in registration
//! order against each cleaned line; the first match wins. The original
//! tool relied on dictionary enumeration order for this, which is an
//! implementation detail of its runtime; the ordering here is explicit.
//! Unmatched non-blank lines fall back to a raw block parser, and blank
//! lines advance the cursor by one, so parsing a finite input always
//! terminates.

use log::debug;

use super::section::{self, Section};
use crate::utils::config::LOG_LINE_PREFIX;

/// The section kinds the grammar can dispatch to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Header,
    ObjectList,
    MemStats,
    PoolStats,
    TextureStreaming,
    SoundDump,
    LevelStreaming,
    CaptureLocation,
}

/// Ordered prefix-to-parser registry.
///
/// Constructed once at pipeline start and passed by reference into the
/// parse; there is no global instance.
#[derive(Debug, Clone)]
pub struct SectionGrammar {
    entries: Vec<(&'static str, SectionKind)>,
}

impl SectionGrammar {
    /// Empty grammar; every block parses as a raw section
    pub fn empty() -> Self {
        Self { entries: Vec::new() }
    }

    /// The standard grammar with every known section opener registered.
    ///
    /// Registration order is the match order.
    pub fn standard() -> Self {
        let mut grammar = Self::empty();
        grammar.register("Log file open", SectionKind::Header);
        grammar.register("Obj List:", SectionKind::ObjectList);
        grammar.register("DmQueryTitleMemoryStatistics", SectionKind::MemStats);
        grammar.register("Memory pool stats", SectionKind::PoolStats);
        grammar.register("Current Texture Streaming Stats", SectionKind::TextureStreaming);
        grammar.register("Listing all sounds.", SectionKind::SoundDump);
        grammar.register("Level Streaming:", SectionKind::LevelStreaming);
        grammar.register("BugItGo", SectionKind::CaptureLocation);
        grammar.register("DebugSetLocation", SectionKind::CaptureLocation);
        grammar
    }

    /// Append a (prefix, parser) pair. Later registrations lose to
    /// earlier ones when both prefixes match a line.
    pub fn register(&mut self, prefix: &'static str, kind: SectionKind) {
        self.entries.push((prefix, kind));
    }

    /// First registered kind whose prefix matches the cleaned line
    pub fn match_line(&self, line: &str) -> Option<SectionKind> {
        self.entries
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix))
            .map(|(_, kind)| *kind)
    }

    /// Parse a full cleaned line buffer into sections.
    ///
    /// Every iteration advances the cursor by at least one line.
    pub fn parse_lines(&self, lines: &[String]) -> Vec<Section> {
        let mut sections = Vec::new();
        let mut cursor = 0;

        while cursor < lines.len() {
            let line = &lines[cursor];
            if line.is_empty() {
                cursor += 1;
                continue;
            }

            let section = match self.match_line(line) {
                Some(kind) => {
                    debug!("Section {:?} at line {}", kind, cursor);
                    dispatch(kind, line, lines, &mut cursor)
                }
                None => section::parse_raw_block(lines, &mut cursor),
            };
            sections.push(section);
        }

        sections
    }
}

fn dispatch(kind: SectionKind, opener: &str, lines: &[String], cursor: &mut usize) -> Section {
    match kind {
        SectionKind::Header => section::parse_header(opener, lines, cursor),
        SectionKind::ObjectList => section::parse_object_list(opener, lines, cursor),
        SectionKind::MemStats => section::parse_mem_stats(opener, lines, cursor),
        SectionKind::PoolStats => section::parse_pool_stats(opener, lines, cursor),
        SectionKind::TextureStreaming => section::parse_texture_streaming(opener, lines, cursor),
        SectionKind::SoundDump => section::parse_sound_dump(opener, lines, cursor),
        SectionKind::LevelStreaming => section::parse_level_streaming(opener, lines, cursor),
        SectionKind::CaptureLocation => section::parse_capture_location(opener, lines, cursor),
    }
}

/// Clean one raw log line: trim whitespace and strip the optional
/// `Log:` prefix some builds emit on every line.
pub fn clean_line(raw: &str) -> &str {
    let trimmed = raw.trim();
    match trimmed.strip_prefix(LOG_LINE_PREFIX) {
        Some(rest) => rest.trim_start(),
        None => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_line_strips_log_prefix() {
        assert_eq!(clean_line("  Log: Obj List: -all  "), "Obj List: -all");
        assert_eq!(clean_line("plain line"), "plain line");
    }

    #[test]
    fn test_first_registered_match_wins() {
        let mut grammar = SectionGrammar::empty();
        grammar.register("Mem", SectionKind::MemStats);
        grammar.register("Memory pool stats", SectionKind::PoolStats);

        assert_eq!(
            grammar.match_line("Memory pool stats"),
            Some(SectionKind::MemStats)
        );
    }

    #[test]
    fn test_unmatched_block_falls_back_to_raw() {
        let lines: Vec<String> = ["strange output", "more of it", "", "next"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let sections = SectionGrammar::standard().parse_lines(&lines);
        assert_eq!(sections.len(), 2);
        match &sections[0] {
            Section::Raw(raw) => {
                assert_eq!(raw.heading, "strange output");
                assert_eq!(raw.lines, vec!["more of it"]);
            }
            other => panic!("expected raw section, got {:?}", other),
        }
    }
}
