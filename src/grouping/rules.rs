//! Grouping rule file parsing.
//!
//! The rule file maps raw class names to named, prioritized groups:
//!
//! ```text
//! # Renderer memory
//! [Group] Meshes?Important
//! StaticMesh
//! SkeletalMesh
//!
//! [Group] Audio?Priority3?NoSummary
//! SoundNodeWave
//!
//! [SystemMemBarKB] 458752
//! [SystemMemBarColor] 255,0,0
//! ```
//!
//! A missing or unreadable file yields an empty rule set, not an error:
//! every class then resolves to an auto-created group.

use log::{debug, warn};
use std::fs;
use std::path::Path;

use crate::utils::config::{DEFAULT_GROUP_PRIORITY, IMPORTANT_PRIORITY};

const GROUP_HEADER: &str = "[Group]";
const MEM_BAR_KB_HEADER: &str = "[SystemMemBarKB]";
const MEM_BAR_COLOR_HEADER: &str = "[SystemMemBarColor]";

/// One named group from the rule file
#[derive(Debug, Clone)]
pub struct GroupRule {
    pub name: String,
    pub priority: i32,
    pub ignored_in_totals: bool,
    pub excluded_from_summary: bool,

    /// Raw class names folding into this group
    pub members: Vec<String>,
}

impl GroupRule {
    /// Parse a `Name?Tag1?Tag2...` header payload
    fn from_header(payload: &str) -> GroupRule {
        let mut parts = payload.split('?');
        let name = parts.next().unwrap_or("").trim().to_string();

        let mut rule = GroupRule {
            name,
            priority: DEFAULT_GROUP_PRIORITY,
            ignored_in_totals: false,
            excluded_from_summary: false,
            members: Vec::new(),
        };

        for tag in parts.map(str::trim) {
            if tag.eq_ignore_ascii_case("Important") {
                rule.priority = IMPORTANT_PRIORITY;
            } else if tag.eq_ignore_ascii_case("IgnoreSize") {
                rule.ignored_in_totals = true;
            } else if tag.eq_ignore_ascii_case("NoSummary") {
                rule.excluded_from_summary = true;
            } else if let Some(n) = tag.strip_prefix("Priority") {
                match n.parse() {
                    Ok(priority) => rule.priority = priority,
                    Err(_) => warn!("Ignoring malformed priority tag '{}'", tag),
                }
            } else {
                warn!("Unknown group tag '{}' on '{}'", tag, rule.name);
            }
        }

        rule
    }
}

/// Parsed rule set plus the tracker-wide scalars
#[derive(Debug, Clone, Default)]
pub struct GroupRules {
    pub groups: Vec<GroupRule>,

    /// Reference bar for the system memory chart, in KB
    pub system_mem_bar_kb: i32,

    /// Reference bar color, r/g/b
    pub system_mem_bar_color: (u8, u8, u8),
}

impl GroupRules {
    /// Load rules from a file; a missing or unreadable file degrades to
    /// an empty rule set
    pub fn load(path: impl AsRef<Path>) -> GroupRules {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(text) => Self::parse(&text),
            Err(err) => {
                warn!("No grouping rules at {}: {}", path.display(), err);
                GroupRules::default()
            }
        }
    }

    /// Parse rule text. Lines are comments (`#`), group headers, scalar
    /// settings, or member class names for the open group.
    pub fn parse(text: &str) -> GroupRules {
        let mut rules = GroupRules::default();

        for line in text.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(payload) = line.strip_prefix(GROUP_HEADER) {
                rules.groups.push(GroupRule::from_header(payload.trim()));
            } else if let Some(payload) = line.strip_prefix(MEM_BAR_KB_HEADER) {
                match payload.trim().parse() {
                    Ok(kb) => rules.system_mem_bar_kb = kb,
                    Err(_) => warn!("Malformed {} line: {}", MEM_BAR_KB_HEADER, line),
                }
            } else if let Some(payload) = line.strip_prefix(MEM_BAR_COLOR_HEADER) {
                match parse_color(payload.trim()) {
                    Some(color) => rules.system_mem_bar_color = color,
                    None => warn!("Malformed {} line: {}", MEM_BAR_COLOR_HEADER, line),
                }
            } else if let Some(group) = rules.groups.last_mut() {
                group.members.push(line.to_string());
            } else {
                warn!("Class name '{}' before any [Group] header, ignored", line);
            }
        }

        debug!("Parsed {} group rules", rules.groups.len());
        rules
    }
}

fn parse_color(payload: &str) -> Option<(u8, u8, u8)> {
    let mut parts = payload.split(',').map(|p| p.trim().parse().ok());
    let r = parts.next()??;
    let g = parts.next()??;
    let b = parts.next()??;
    Some((r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_set_flags() {
        let rules = GroupRules::parse(
            "[Group] Meshes?Important\nStaticMesh\n\n[Group] Audio?Priority3?NoSummary?IgnoreSize\nSoundNodeWave\n",
        );

        assert_eq!(rules.groups.len(), 2);
        let meshes = &rules.groups[0];
        assert_eq!(meshes.priority, IMPORTANT_PRIORITY);
        assert_eq!(meshes.members, vec!["StaticMesh"]);

        let audio = &rules.groups[1];
        assert_eq!(audio.priority, 3);
        assert!(audio.excluded_from_summary);
        assert!(audio.ignored_in_totals);
    }

    #[test]
    fn test_comments_and_scalars() {
        let rules = GroupRules::parse(
            "# header comment\n[SystemMemBarKB] 1024\n[SystemMemBarColor] 255, 128, 0\n",
        );

        assert!(rules.groups.is_empty());
        assert_eq!(rules.system_mem_bar_kb, 1024);
        assert_eq!(rules.system_mem_bar_color, (255, 128, 0));
    }

    #[test]
    fn test_missing_file_degrades_to_empty() {
        let rules = GroupRules::load("/definitely/not/a/real/path.grp");
        assert!(rules.groups.is_empty());
    }
}
