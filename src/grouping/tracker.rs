//! The grouping tracker: named aggregation buckets and their per-group
//! sample arrays.
//!
//! Every raw class or key name resolves to at most one group. Groups
//! come from three places: the rule file (named, possibly multi-class),
//! lazy auto-creation when an unmapped name is first observed, and
//! synthesized meta-groups with no backing class at all. Each group
//! holds one sample slot per snapshot in the active series.

use log::debug;
use std::collections::HashMap;

use super::rules::GroupRules;
use crate::parser::{SampleUnit, StatKind};
use crate::utils::config::{DEFAULT_GROUP_PRIORITY, INVALID_SAMPLE};

/// A named, prioritized aggregation bucket
#[derive(Debug, Clone)]
pub struct Group {
    /// Unique, case-sensitive identity
    pub name: String,

    /// Sort/bucketing key; ties broken alphabetically by name
    pub priority: i32,

    pub sample_unit: SampleUnit,

    /// Which statistic best represents this group in summary views
    pub overview_stat: StatKind,

    /// Whether the minimum-size report filter applies to this group
    pub filterable_by_size: bool,

    pub excluded_from_summary: bool,
    pub excluded_from_standard_report: bool,

    /// Contributes to raw sums but not "interesting" sums
    pub ignored_in_totals: bool,

    /// Whether this group aggregates object-list classes (true for rule
    /// and auto groups, false for meta-groups)
    pub tracks_objects: bool,

    /// One slot per snapshot, initialized to the invalid sentinel
    pub samples: Vec<f64>,
}

impl Group {
    fn new(name: String, num_samples: usize) -> Group {
        Group {
            name,
            priority: DEFAULT_GROUP_PRIORITY,
            sample_unit: SampleUnit::Kilobytes,
            overview_stat: StatKind::Max,
            filterable_by_size: true,
            excluded_from_summary: false,
            excluded_from_standard_report: false,
            ignored_in_totals: false,
            tracks_objects: true,
            samples: vec![INVALID_SAMPLE; num_samples],
        }
    }

    /// Whether any sample slot was written
    pub fn has_data(&self) -> bool {
        self.samples.iter().any(|s| *s != INVALID_SAMPLE)
    }
}

/// Owns the name-to-group map and the group list for one series
#[derive(Debug, Clone, Default)]
pub struct GroupTracker {
    index: HashMap<String, usize>,
    groups: Vec<Group>,
    num_samples: usize,

    pub system_mem_bar_kb: i32,
    pub system_mem_bar_color: (u8, u8, u8),
}

impl GroupTracker {
    /// Build a tracker from parsed rules, sized for a series of
    /// `num_samples` snapshots.
    ///
    /// Every rule member name maps to its group; the group's own name
    /// maps too so meta references resolve.
    pub fn from_rules(rules: &GroupRules, num_samples: usize) -> GroupTracker {
        let mut tracker = GroupTracker {
            num_samples,
            system_mem_bar_kb: rules.system_mem_bar_kb,
            system_mem_bar_color: rules.system_mem_bar_color,
            ..GroupTracker::default()
        };

        for rule in &rules.groups {
            let index = tracker.push_group({
                let mut group = Group::new(rule.name.clone(), num_samples);
                group.priority = rule.priority;
                group.ignored_in_totals = rule.ignored_in_totals;
                group.excluded_from_summary = rule.excluded_from_summary;
                group
            });
            for member in &rule.members {
                tracker.index.entry(member.clone()).or_insert(index);
            }
        }

        debug!(
            "Tracker initialized: {} rule groups, {} samples per group",
            tracker.groups.len(),
            num_samples
        );
        tracker
    }

    fn push_group(&mut self, group: Group) -> usize {
        let index = self.groups.len();
        self.index.entry(group.name.clone()).or_insert(index);
        self.groups.push(group);
        index
    }

    /// Look a name up without creating anything
    pub fn resolve(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Resolve a raw class/key name, optionally auto-creating a
    /// single-member group for it.
    ///
    /// Auto-groups use the default priority and count toward object-list
    /// totals. Resolving the same name twice returns the same index.
    pub fn resolve_or_create(&mut self, name: &str, create_if_missing: bool) -> Option<usize> {
        if let Some(index) = self.resolve(name) {
            return Some(index);
        }
        if !create_if_missing {
            return None;
        }
        Some(self.push_group(Group::new(name.to_string(), self.num_samples)))
    }

    /// Create a zero-backing-class group for a synthesized series.
    ///
    /// Meta-groups default to `ignored_in_totals` and are exempt from
    /// the size filter; callers adjust the returned group as needed.
    pub fn create_meta_group(&mut self, name: &str) -> usize {
        if let Some(index) = self.resolve(name) {
            return index;
        }
        let mut group = Group::new(name.to_string(), self.num_samples);
        group.ignored_in_totals = true;
        group.tracks_objects = false;
        group.filterable_by_size = false;
        self.push_group(group)
    }

    /// Add `size_kb` into the group's slot for `snapshot_index`,
    /// resolving (and auto-creating) by name.
    ///
    /// Adding, not overwriting: multiple raw class instances fold into
    /// one group. Returns the group index.
    pub fn register_size(&mut self, name: &str, snapshot_index: usize, size_kb: f64) -> usize {
        let index = match self.resolve(name) {
            Some(index) => index,
            None => self.push_group(Group::new(name.to_string(), self.num_samples)),
        };
        self.add_sample(index, snapshot_index, size_kb);
        index
    }

    /// Add into a slot, clearing the sentinel on first write
    pub fn add_sample(&mut self, group_index: usize, snapshot_index: usize, value: f64) {
        let slot = &mut self.groups[group_index].samples[snapshot_index];
        if *slot == INVALID_SAMPLE {
            *slot = 0.0;
        }
        *slot += value;
    }

    /// Overwrite a slot
    pub fn set_sample(&mut self, group_index: usize, snapshot_index: usize, value: f64) {
        self.groups[group_index].samples[snapshot_index] = value;
    }

    pub fn group(&self, index: usize) -> &Group {
        &self.groups[index]
    }

    pub fn group_mut(&mut self, index: usize) -> &mut Group {
        &mut self.groups[index]
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of sample slots per group (the snapshot count)
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    /// Group indices sorted by (priority ascending, name ascending) for
    /// presentation. Group storage order stays insertion order.
    pub fn sorted_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..self.groups.len()).collect();
        indices.sort_by(|&a, &b| {
            let (ga, gb) = (&self.groups[a], &self.groups[b]);
            ga.priority.cmp(&gb.priority).then_with(|| ga.name.cmp(&gb.name))
        });
        indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_tracker(num_samples: usize) -> GroupTracker {
        GroupTracker::from_rules(&GroupRules::default(), num_samples)
    }

    #[test]
    fn test_resolve_or_create_is_idempotent() {
        let mut tracker = empty_tracker(2);
        let first = tracker.resolve_or_create("StaticMesh", true).unwrap();
        let second = tracker.resolve_or_create("StaticMesh", true).unwrap();
        assert_eq!(first, second);
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_resolve_without_create() {
        let mut tracker = empty_tracker(1);
        assert_eq!(tracker.resolve_or_create("Unknown", false), None);
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_register_size_accumulates() {
        let mut tracker = empty_tracker(1);
        tracker.register_size("StaticMesh", 0, 100.0);
        tracker.register_size("StaticMesh", 0, 50.0);
        assert_eq!(tracker.group(0).samples[0], 150.0);
    }

    #[test]
    fn test_rule_members_share_one_group() {
        let rules = GroupRules::parse("[Group] Meshes\nStaticMesh\nSkeletalMesh\n");
        let mut tracker = GroupTracker::from_rules(&rules, 1);

        tracker.register_size("StaticMesh", 0, 100.0);
        tracker.register_size("SkeletalMesh", 0, 25.0);

        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.group(0).name, "Meshes");
        assert_eq!(tracker.group(0).samples[0], 125.0);
    }

    #[test]
    fn test_meta_group_defaults() {
        let mut tracker = empty_tracker(1);
        let index = tracker.create_meta_group("ElapsedTime");
        let group = tracker.group(index);
        assert!(group.ignored_in_totals);
        assert!(!group.tracks_objects);
        assert!(!group.filterable_by_size);
    }

    #[test]
    fn test_sorted_indices_priority_then_name() {
        let mut tracker = empty_tracker(1);
        tracker.resolve_or_create("Zebra", true);
        tracker.resolve_or_create("Apple", true);
        let important = tracker.resolve_or_create("Busy", true).unwrap();
        tracker.group_mut(important).priority = 0;

        let sorted = tracker.sorted_indices();
        let names: Vec<&str> = sorted
            .iter()
            .map(|&i| tracker.group(i).name.as_str())
            .collect();
        assert_eq!(names, vec!["Busy", "Apple", "Zebra"]);
    }
}
