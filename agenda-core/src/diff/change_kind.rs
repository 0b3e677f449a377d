use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// Present on this side, absent on the other.
    Added,
    /// Absent on this side. Without tombstones the differencer cannot tell a
    /// deletion from an addition on the other side, so it never emits this;
    /// it exists for documents produced by other clients.
    Removed,
}

impl ChangeKind {
    pub fn symbol(&self) -> &'static str {
        match self {
            ChangeKind::Added => "+",
            ChangeKind::Removed => "-",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}
