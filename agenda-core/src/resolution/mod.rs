//! Manual, whole-document conflict resolution.

mod coordinator;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use coordinator::ResolutionCoordinator;

/// Identifies one resolution request. An answer only counts for the request
/// whose id it carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolutionId(pub u64);

impl fmt::Display for ResolutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The operator's choice for one conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    /// Keep the local snapshot and overwrite the remote one with it.
    Local,
    /// Take the remote snapshot and overwrite local state with it.
    Remote,
    /// Change nothing; this sync cycle is skipped.
    Cancel,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Local => write!(f, "local"),
            Resolution::Remote => write!(f, "remote"),
            Resolution::Cancel => write!(f, "cancel"),
        }
    }
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Resolution::Local),
            "remote" => Ok(Resolution::Remote),
            "cancel" => Ok(Resolution::Cancel),
            other => Err(format!("Unknown resolution '{other}'")),
        }
    }
}

/// Observable phase of the coordinator.
///
/// Applying and cancelling happen inside [`ResolutionCoordinator::resolve`]
/// and leave the coordinator `Idle` again, so they are never observed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionState {
    Idle,
    Presenting,
    AwaitingChoice,
}
