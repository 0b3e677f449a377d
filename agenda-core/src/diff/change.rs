use std::fmt;

use serde::{Deserialize, Serialize};

use crate::diff::ChangeKind;
use crate::snapshot::{Category, Item};

/// One itemized difference between two snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    pub category: Category,
    pub item: Item,
    pub text: String,
}

impl Change {
    pub fn added(category: Category, item: &Item) -> Self {
        Change {
            kind: ChangeKind::Added,
            category,
            text: item.display_text(),
            item: item.clone(),
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}", self.kind, self.category, self.text)
    }
}

/// The itemized changes seen from one side of a diff.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChangeSet {
    pub changes: Vec<Change>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn in_category(&self, category: Category) -> impl Iterator<Item = &Change> {
        self.changes.iter().filter(move |c| c.category == category)
    }
}
