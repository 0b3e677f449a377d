use std::sync::Arc;

use agenda_core::Agenda;
use agenda_core::presentation::{ChannelSurface, ConflictDialog};
use agenda_core::resolution::{Resolution, ResolutionCoordinator};
use agenda_core::sync::SyncDriver;
use anyhow::Result;
use dialoguer::Select;
use owo_colors::OwoColorize;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::oneshot;
use tracing::warn;

use super::identity;
use crate::remote::ConfiguredRemote;
use crate::render::Render;

pub async fn run(agenda: &Agenda, watch: bool) -> Result<()> {
    let remote = ConfiguredRemote::from_agenda(agenda)?;

    let (surface, dialogs) = ChannelSurface::new();
    let coordinator = Arc::new(
        ResolutionCoordinator::new(surface).with_choice_timeout(agenda.choice_timeout()),
    );
    let dialog = tokio::spawn(conflict_dialog(Arc::clone(&coordinator), dialogs));

    let driver = SyncDriver::new(agenda.store(), remote, identity(agenda), coordinator);

    if watch {
        let interval = agenda.poll_interval();
        println!(
            "{}",
            format!("Syncing every {}s, press Ctrl-C to stop", interval.as_secs()).dimmed()
        );

        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Could not listen for Ctrl-C: {e}");
                std::future::pending::<()>().await;
            }
        };
        driver
            .run(interval, shutdown, |result| match result {
                Ok(outcome) => println!("{}", outcome.render()),
                Err(e) => println!("{}", e.to_string().red()),
            })
            .await;
        dialog.abort();
    } else {
        let result = driver.sync_once().await;
        dialog.abort();
        println!("{}", result?.render());
    }

    Ok(())
}

/// Show each conflict and feed the operator's answer back to the coordinator.
async fn conflict_dialog(
    coordinator: Arc<ResolutionCoordinator<ChannelSurface>>,
    mut dialogs: UnboundedReceiver<ConflictDialog>,
) {
    while let Some(dialog) = dialogs.recv().await {
        println!("{}\n", dialog.presentation.render());

        let choice = match ask_operator().await {
            Ok(choice) => choice,
            Err(e) => {
                warn!(resolution = %dialog.id, "Could not read a choice, cancelling: {e}");
                Resolution::Cancel
            }
        };

        if !coordinator.resolve(dialog.id, choice) {
            println!(
                "{}",
                "The conflict already timed out, your answer was ignored".yellow()
            );
        }
    }
}

/// Run the prompt on its own thread. A terminal read cannot be cancelled,
/// so the thread is detached and the runtime never waits for it on exit.
async fn ask_operator() -> Result<Resolution> {
    let (tx, rx) = oneshot::channel();
    std::thread::Builder::new()
        .name("conflict-prompt".into())
        .spawn(move || {
            let _ = tx.send(prompt_choice());
        })?;

    Ok(rx.await??)
}

fn prompt_choice() -> dialoguer::Result<Resolution> {
    let options = [
        "Keep this device's agenda",
        "Take the remote agenda",
        "Decide later",
    ];

    let index = Select::new()
        .with_prompt("Which agenda should win?")
        .items(&options)
        .default(2)
        .interact()?;

    Ok(match index {
        0 => Resolution::Local,
        1 => Resolution::Remote,
        _ => Resolution::Cancel,
    })
}
