//! TUI rendering traits for agenda types.
//!
//! Extension traits that add colored terminal rendering to agenda-core types
//! using owo_colors.

use agenda_core::SnapshotMetadata;
use agenda_core::diff::{Change, ChangeKind};
use agenda_core::identity::DeviceMetadata;
use agenda_core::presentation::{ConflictPresentation, Differences, Preview};
use agenda_core::sync::SyncOutcome;
use chrono::Local;
use owo_colors::OwoColorize;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for ChangeKind {
    fn render(&self) -> String {
        let symbol = self.symbol();
        match self {
            ChangeKind::Added => symbol.green().to_string(),
            ChangeKind::Removed => symbol.red().to_string(),
        }
    }
}

impl Render for Change {
    fn render(&self) -> String {
        let text = match self.kind {
            ChangeKind::Added => self.text.green().to_string(),
            ChangeKind::Removed => self.text.red().to_string(),
        };
        let category = format!("({})", self.category.title());

        format!("{} {} {}", self.kind.render(), text, category.dimmed())
    }
}

impl Render for SnapshotMetadata {
    fn render(&self) -> String {
        let when = self.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M");
        format!("written by {} at {}", self.device_name.bold(), when)
    }
}

fn pluralize<'a>(singular: &'a str, plural: &'a str, count: usize) -> &'a str {
    if count == 1 { singular } else { plural }
}

/// Render one side of a conflict under `title`.
pub fn render_preview(title: &str, preview: &Preview) -> String {
    let mut lines = Vec::new();

    let provenance = match &preview.written_by {
        Some(metadata) => metadata.render(),
        None => "no write information".dimmed().to_string(),
    };
    lines.push(format!("{} {}", title.bold(), provenance));

    let counts: Vec<String> = preview
        .counts
        .iter()
        .map(|c| format!("{} {}", c.count, c.category.title().to_lowercase()))
        .collect();
    lines.push(format!("   {}", counts.join(" · ").dimmed()));

    for change in &preview.changes {
        lines.push(format!("   {}", change.render()));
    }
    if preview.is_truncated() {
        let more = format!("... and {} more", preview.hidden_changes);
        lines.push(format!("   {}", more.dimmed()));
    }

    lines.join("\n")
}

impl Render for Differences {
    fn render(&self) -> String {
        let (local, remote, summary, unitemized) = match self {
            Differences::NoChanges => return "   No differences".dimmed().to_string(),
            Differences::Grouped {
                local,
                remote,
                summary,
                unitemized,
            } => (local, remote, summary, unitemized),
        };

        let mut lines = Vec::new();

        if !local.is_empty() {
            lines.push("   Only on this device:".dimmed().to_string());
            lines.extend(local.iter().map(|c| format!("   {}", c.render())));
        }

        if !remote.is_empty() {
            if !local.is_empty() {
                lines.push(String::new());
            }
            lines.push("   Only on the remote:".dimmed().to_string());
            lines.extend(remote.iter().map(|c| format!("   {}", c.render())));
        }

        let modified = unitemized.modified_items;
        let mut both_sides = Vec::new();
        if modified > 0 {
            both_sides.push(format!(
                "{modified} {} changed on both sides",
                pluralize("entry", "entries", modified)
            ));
        }
        if unitemized.notes {
            both_sides.push("notes differ".to_string());
        }
        if unitemized.mood {
            both_sides.push("mood differs".to_string());
        }
        for label in both_sides {
            lines.push(format!("   {} {}", "~".yellow(), label.yellow()));
        }

        let total = format!(
            "{} {}",
            summary.total_changes,
            pluralize("difference", "differences", summary.total_changes)
        );
        if summary.has_conflicts {
            lines.push(format!("   {} {}", total.dimmed(), "(conflicting)".red()));
        } else {
            lines.push(format!("   {}", total.dimmed()));
        }

        lines.join("\n")
    }
}

impl Render for ConflictPresentation {
    fn render(&self) -> String {
        let header = "Your agenda was changed on this device and on another one.";
        [
            format!("{}", header.yellow().bold()),
            String::new(),
            render_preview("This device", &self.local),
            String::new(),
            render_preview("Remote", &self.remote),
            String::new(),
            self.differences.render(),
        ]
        .join("\n")
    }
}

impl Render for SyncOutcome {
    fn render(&self) -> String {
        let text = self.to_string();
        match self {
            SyncOutcome::UpToDate => format!("{} {}", "✓".green(), text.dimmed()),
            SyncOutcome::Pushed => format!("{} {}", "↑".green(), text),
            SyncOutcome::Pulled => format!("{} {}", "↓".green(), text),
            SyncOutcome::KeptLocal | SyncOutcome::TookRemote => {
                format!("{} {}", "✓".green(), text)
            }
            SyncOutcome::Skipped => format!("{} {}", "!".yellow(), text.yellow()),
        }
    }
}

impl Render for DeviceMetadata {
    fn render(&self) -> String {
        [
            format!("{} {}", "Name:".dimmed(), self.device_name.bold()),
            format!("{} {}", "Id:".dimmed(), self.device_id),
            format!("{} {}", "User agent:".dimmed(), self.user_agent),
        ]
        .join("\n")
    }
}
