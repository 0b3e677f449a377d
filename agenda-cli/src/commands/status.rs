use agenda_core::Agenda;
use agenda_core::diff::ChangeSet;
use agenda_core::presentation::{ConflictPresentation, Preview};
use agenda_core::store::{LocalStore, RemoteStore};
use anyhow::Result;
use owo_colors::OwoColorize;

use crate::remote::ConfiguredRemote;
use crate::render::{Render, render_preview};
use crate::utils::tui::create_spinner;

pub async fn run(agenda: &Agenda) -> Result<()> {
    let store = agenda.store();
    let local = store.load()?;
    let remote = ConfiguredRemote::from_agenda(agenda)?;

    let spinner = create_spinner("Fetching remote agenda");
    let result = remote.fetch().await;
    spinner.finish_and_clear();

    match result? {
        Some(document) => {
            let presentation = ConflictPresentation::new(&local, &document.snapshot);
            println!("{}\n", render_preview("This device", &presentation.local));
            println!("{}\n", render_preview("Remote", &presentation.remote));
            println!("{}", presentation.differences.render());
        }
        None => {
            let preview = Preview::of(&local, &ChangeSet::default());
            println!("{}", render_preview("This device", &preview));
            println!(
                "\n   {}",
                "No remote agenda yet, the next sync will publish this one".dimmed()
            );
        }
    }

    match store.last_synced()? {
        Some(metadata) => println!("\nLast synced copy {}", metadata.render()),
        None => println!("\n{}", "Never synced".dimmed()),
    }

    Ok(())
}
