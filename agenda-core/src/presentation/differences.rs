use serde::Serialize;

use crate::diff::{Change, DiffSummary, SnapshotDiff, Unitemized};

/// The side-by-side listing of a diff.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum Differences {
    /// Both snapshots hold the same content.
    NoChanges,
    /// Local changes first, then remote ones. Content modifications of
    /// shared items and scalar differences are only reflected in
    /// `summary` and `unitemized`.
    Grouped {
        local: Vec<Change>,
        remote: Vec<Change>,
        summary: DiffSummary,
        unitemized: Unitemized,
    },
}

impl Differences {
    pub fn of(diff: &SnapshotDiff) -> Self {
        if diff.summary.total_changes == 0 {
            return Differences::NoChanges;
        }

        Differences::Grouped {
            local: diff.local.changes.clone(),
            remote: diff.remote.changes.clone(),
            summary: diff.summary,
            unitemized: diff.unitemized,
        }
    }

    /// Changes counted in the summary that have no itemized entry.
    pub fn unlisted_changes(&self) -> usize {
        match self {
            Differences::NoChanges => 0,
            Differences::Grouped { unitemized, .. } => unitemized.count(),
        }
    }
}
