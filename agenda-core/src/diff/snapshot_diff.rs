//! Snapshot diff computation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::diff::{Change, ChangeSet};
use crate::snapshot::{AgendaSnapshot, Category, Item};

/// Aggregate counters for a diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffSummary {
    pub has_conflicts: bool,
    pub total_changes: usize,
}

/// What the summary counts beyond the itemized change sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unitemized {
    /// Items sharing an id whose content differs.
    pub modified_items: usize,
    pub notes: bool,
    pub mood: bool,
}

impl Unitemized {
    pub fn count(&self) -> usize {
        self.modified_items + usize::from(self.notes) + usize::from(self.mood)
    }
}

/// Represents the differences between local and remote agenda snapshots.
///
/// Items present on one side only are itemized in that side's change set.
/// Items sharing an id but with different content, and differing `notes` or
/// `mood`, are only counted in the summary: the operator resolves those by
/// keeping one whole snapshot, so they get no itemized entry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SnapshotDiff {
    pub local: ChangeSet,
    pub remote: ChangeSet,
    pub summary: DiffSummary,
    #[serde(skip)]
    pub unitemized: Unitemized,
}

impl SnapshotDiff {
    pub fn between(local: &AgendaSnapshot, remote: &AgendaSnapshot) -> Self {
        let mut diff = SnapshotDiff::default();

        for category in Category::ALL {
            let local_items = local.items(category);
            let remote_items = remote.items(category);

            let local_by_id = index_by_id(local_items);
            let remote_by_id = index_by_id(remote_items);

            // Present locally, absent remotely
            for item in local_items {
                if !remote_by_id.contains_key(item.id.as_str()) {
                    diff.local.changes.push(Change::added(category, item));
                    diff.summary.total_changes += 1;
                }
            }

            // Present remotely, absent locally
            for item in remote_items {
                if !local_by_id.contains_key(item.id.as_str()) {
                    diff.remote.changes.push(Change::added(category, item));
                    diff.summary.total_changes += 1;
                }
            }

            // Same logical item on both sides, content modified
            for item in local_items {
                if let Some(remote_item) = remote_by_id.get(item.id.as_str()) {
                    if !item.same_content(remote_item) {
                        diff.unitemized.modified_items += 1;
                        diff.summary.total_changes += 1;
                        diff.summary.has_conflicts = true;
                    }
                }
            }
        }

        if local.notes != remote.notes {
            diff.unitemized.notes = true;
            diff.summary.total_changes += 1;
            diff.summary.has_conflicts = true;
        }

        if local.mood != remote.mood {
            diff.unitemized.mood = true;
            diff.summary.total_changes += 1;
            diff.summary.has_conflicts = true;
        }

        diff
    }

    pub fn is_empty(&self) -> bool {
        self.summary.total_changes == 0
    }

    pub fn has_conflicts(&self) -> bool {
        self.summary.has_conflicts
    }

    pub fn total_changes(&self) -> usize {
        self.summary.total_changes
    }
}

/// Ids are unique within a collection; if a malformed document repeats one,
/// the first occurrence wins.
fn index_by_id(items: &[Item]) -> HashMap<&str, &Item> {
    let mut by_id = HashMap::with_capacity(items.len());
    for item in items {
        by_id.entry(item.id.as_str()).or_insert(item);
    }
    by_id
}
