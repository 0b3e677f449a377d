//! Agenda snapshot types.
//!
//! A snapshot is the full agenda state at one point in time: three item
//! collections, two opaque scalar blobs and the provenance of the last write.
//! Items are duck-typed on the wire (the web client stores `titulo`, `texto`
//! or `descripcion` depending on the collection), so an item is modelled as a
//! required `id` plus an ordered map of content fields.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Content fields consulted, in order, when an item needs a display text.
pub const DISPLAY_FIELDS: [&str; 6] = ["titulo", "texto", "descripcion", "title", "text", "description"];

/// Provenance of a snapshot's last write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMetadata {
    pub device_id: String,
    pub device_name: String,
    pub timestamp: DateTime<Utc>,
}

/// A single agenda entry. Identity is `id`; everything else is content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(flatten)]
    pub content: Map<String, Value>,
}

impl Item {
    pub fn new(id: impl Into<String>) -> Self {
        Item {
            id: id.into(),
            content: Map::new(),
        }
    }

    /// Builder-style setter for a content field.
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.content.insert(field.to_string(), value.into());
        self
    }

    /// Text shown to the operator: the first present field of [`DISPLAY_FIELDS`],
    /// falling back to the id.
    pub fn display_text(&self) -> String {
        DISPLAY_FIELDS
            .iter()
            .find_map(|field| match self.content.get(*field) {
                Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
                Some(Value::Null) | None => None,
                Some(Value::String(_)) => None,
                Some(other) => Some(other.to_string()),
            })
            .unwrap_or_else(|| self.id.clone())
    }

    /// Two items with the same id are the same logical item; this compares
    /// the mutable content only.
    pub fn same_content(&self, other: &Item) -> bool {
        self.content == other.content
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_text())
    }
}

/// The item collections of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "tareas")]
    Tasks,
    #[serde(rename = "tareasCriticas")]
    CriticalTasks,
    #[serde(rename = "citas")]
    Appointments,
}

impl Category {
    /// Every category, in the order diffs and previews walk them.
    pub const ALL: [Category; 3] = [
        Category::Tasks,
        Category::CriticalTasks,
        Category::Appointments,
    ];

    /// Label used in diff entries and on the wire.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Tasks => "tareas",
            Category::CriticalTasks => "tareasCriticas",
            Category::Appointments => "citas",
        }
    }

    /// Content field the web client uses for an item's main text.
    pub fn text_field(&self) -> &'static str {
        match self {
            Category::Tasks => "titulo",
            Category::CriticalTasks => "texto",
            Category::Appointments => "descripcion",
        }
    }

    /// Human-readable heading.
    pub fn title(&self) -> &'static str {
        match self {
            Category::Tasks => "Tasks",
            Category::CriticalTasks => "Critical tasks",
            Category::Appointments => "Appointments",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tasks" | "tareas" => Ok(Category::Tasks),
            "critical" | "critical-tasks" | "tareasCriticas" => Ok(Category::CriticalTasks),
            "appointments" | "citas" => Ok(Category::Appointments),
            other => Err(format!(
                "Unknown category '{other}'. Expected one of: tasks, critical, appointments"
            )),
        }
    }
}

/// The full agenda state.
///
/// Missing collections deserialize as empty and missing scalars as blank, so a
/// partially written document diffs as if the absent parts were empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgendaSnapshot {
    #[serde(default, alias = "tareas")]
    pub tasks: Vec<Item>,
    #[serde(default, alias = "tareasCriticas")]
    pub critical_tasks: Vec<Item>,
    #[serde(default, alias = "citas")]
    pub appointments: Vec<Item>,
    #[serde(default, alias = "notas", deserialize_with = "null_as_empty")]
    pub notes: String,
    #[serde(default, alias = "animo", skip_serializing_if = "Value::is_null")]
    pub mood: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<SnapshotMetadata>,
}

impl AgendaSnapshot {
    pub fn items(&self, category: Category) -> &[Item] {
        match category {
            Category::Tasks => &self.tasks,
            Category::CriticalTasks => &self.critical_tasks,
            Category::Appointments => &self.appointments,
        }
    }

    pub fn items_mut(&mut self, category: Category) -> &mut Vec<Item> {
        match category {
            Category::Tasks => &mut self.tasks,
            Category::CriticalTasks => &mut self.critical_tasks,
            Category::Appointments => &mut self.appointments,
        }
    }

    /// Content equality, ignoring provenance.
    pub fn same_content(&self, other: &AgendaSnapshot) -> bool {
        self.tasks == other.tasks
            && self.critical_tasks == other.critical_tasks
            && self.appointments == other.appointments
            && self.notes == other.notes
            && self.mood == other.mood
    }

    /// True for freshly initialized state: no items, no notes, no mood.
    pub fn is_blank(&self) -> bool {
        Category::ALL.iter().all(|c| self.items(*c).is_empty())
            && self.notes.is_empty()
            && self.mood.is_null()
    }

    pub fn with_metadata(mut self, metadata: SnapshotMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "item id must be a string or number, got {other}"
        ))),
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_collections_default_to_empty() {
        let snapshot: AgendaSnapshot = serde_json::from_value(json!({ "notes": "hi" })).unwrap();
        assert!(snapshot.tasks.is_empty());
        assert!(snapshot.critical_tasks.is_empty());
        assert!(snapshot.appointments.is_empty());
        assert!(snapshot.mood.is_null());
        assert!(snapshot.metadata.is_none());
    }

    #[test]
    fn test_spanish_keys_are_accepted() {
        let snapshot: AgendaSnapshot = serde_json::from_value(json!({
            "tareas": [{ "id": "1", "titulo": "Comprar leche" }],
            "citas": [{ "id": 17, "descripcion": "Dentista", "hora": "10:00" }],
            "notas": null,
            "animo": "bien"
        }))
        .unwrap();

        assert_eq!(snapshot.tasks[0].display_text(), "Comprar leche");
        assert_eq!(snapshot.appointments[0].id, "17");
        assert_eq!(snapshot.notes, "");
        assert_eq!(snapshot.mood, json!("bien"));
    }

    #[test]
    fn test_display_text_priority() {
        let item = Item::new("a")
            .with("descripcion", "third")
            .with("texto", "second");
        assert_eq!(item.display_text(), "second");

        let item = Item::new("b").with("titulo", "first").with("texto", "second");
        assert_eq!(item.display_text(), "first");

        let item = Item::new("c").with("persona", "Ana");
        assert_eq!(item.display_text(), "c");
    }

    #[test]
    fn test_same_content_ignores_metadata() {
        let a = AgendaSnapshot {
            tasks: vec![Item::new("1").with("titulo", "A")],
            ..Default::default()
        };
        let b = a.clone().with_metadata(SnapshotMetadata {
            device_id: "d".into(),
            device_name: "Phone".into(),
            timestamp: Utc::now(),
        });
        assert!(a.same_content(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!("tasks".parse::<Category>().unwrap(), Category::Tasks);
        assert_eq!("citas".parse::<Category>().unwrap(), Category::Appointments);
        assert!("groceries".parse::<Category>().is_err());
    }
}
