//! Structural differences between a local and a remote agenda snapshot.

mod change;
mod change_kind;
mod snapshot_diff;

pub use change::{Change, ChangeSet};
pub use change_kind::ChangeKind;
pub use snapshot_diff::{DiffSummary, SnapshotDiff, Unitemized};
