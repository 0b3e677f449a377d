//! Read-only projections of a conflict for the operator.
//!
//! Everything here only computes descriptions. Putting them on a screen is
//! the job of a [`ConflictSurface`].

mod differences;
mod preview;
mod surface;

use serde::Serialize;

use crate::diff::SnapshotDiff;
use crate::snapshot::AgendaSnapshot;

pub use differences::Differences;
pub use preview::{CategoryCount, PREVIEW_LIMIT, Preview};
pub use surface::{ChannelSurface, ConflictDialog, ConflictSurface};

/// Everything a surface needs to show one conflict.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConflictPresentation {
    pub diff: SnapshotDiff,
    pub local: Preview,
    pub remote: Preview,
    pub differences: Differences,
}

impl ConflictPresentation {
    pub fn new(local: &AgendaSnapshot, remote: &AgendaSnapshot) -> Self {
        let diff = SnapshotDiff::between(local, remote);

        ConflictPresentation {
            local: Preview::of(local, &diff.local),
            remote: Preview::of(remote, &diff.remote),
            differences: Differences::of(&diff),
            diff,
        }
    }
}
