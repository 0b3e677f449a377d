use serde::Serialize;

use crate::diff::{Change, ChangeSet};
use crate::snapshot::{AgendaSnapshot, Category, SnapshotMetadata};

/// Itemized changes shown per side before the rest is summarized.
pub const PREVIEW_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: Category,
    pub count: usize,
}

/// One side of a conflict: what it holds and what only it has.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Preview {
    pub counts: Vec<CategoryCount>,
    pub written_by: Option<SnapshotMetadata>,
    pub changes: Vec<Change>,
    /// Changes beyond [`PREVIEW_LIMIT`] that were left out.
    pub hidden_changes: usize,
}

impl Preview {
    pub fn of(snapshot: &AgendaSnapshot, changes: &ChangeSet) -> Self {
        let counts = Category::ALL
            .iter()
            .map(|&category| CategoryCount {
                category,
                count: snapshot.items(category).len(),
            })
            .collect();

        Preview {
            counts,
            written_by: snapshot.metadata.clone(),
            changes: changes.changes.iter().take(PREVIEW_LIMIT).cloned().collect(),
            hidden_changes: changes.len().saturating_sub(PREVIEW_LIMIT),
        }
    }

    pub fn is_truncated(&self) -> bool {
        self.hidden_changes > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::SnapshotDiff;
    use crate::snapshot::Item;

    fn tasks(n: usize) -> Vec<Item> {
        (0..n)
            .map(|i| Item::new(format!("t{i}")).with("titulo", format!("Task {i}")))
            .collect()
    }

    #[test]
    fn test_preview_counts_every_category() {
        let snapshot = AgendaSnapshot {
            tasks: tasks(3),
            appointments: vec![Item::new("a").with("descripcion", "Dentist")],
            ..Default::default()
        };

        let preview = Preview::of(&snapshot, &ChangeSet::default());

        assert_eq!(
            preview.counts,
            vec![
                CategoryCount { category: Category::Tasks, count: 3 },
                CategoryCount { category: Category::CriticalTasks, count: 0 },
                CategoryCount { category: Category::Appointments, count: 1 },
            ]
        );
        assert!(preview.changes.is_empty());
        assert!(!preview.is_truncated());
    }

    #[test]
    fn test_preview_truncates_after_limit() {
        let local = AgendaSnapshot {
            tasks: tasks(7),
            ..Default::default()
        };
        let diff = SnapshotDiff::between(&local, &AgendaSnapshot::default());

        let preview = Preview::of(&local, &diff.local);

        assert_eq!(preview.changes.len(), PREVIEW_LIMIT);
        assert_eq!(preview.changes[0].text, "Task 0");
        assert_eq!(preview.hidden_changes, 2);
    }

    #[test]
    fn test_preview_does_not_touch_input() {
        let local = AgendaSnapshot {
            tasks: tasks(2),
            ..Default::default()
        };
        let before = local.clone();
        let diff = SnapshotDiff::between(&local, &AgendaSnapshot::default());

        let _ = Preview::of(&local, &diff.local);

        assert_eq!(local, before);
    }
}
