mod client;
mod commands;
mod remote;
mod render;
mod utils;

use agenda_core::{Agenda, Category};
use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "agenda")]
#[command(about = "Keep your agenda in sync across devices")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync with the configured remote, asking when both sides changed
    Sync {
        /// Keep syncing every poll interval until Ctrl-C
        #[arg(short, long)]
        watch: bool,
    },
    /// Show how this device's agenda differs from the remote one
    Status,
    /// Add an entry to the local agenda
    New {
        text: String,

        /// tasks, critical or appointments
        #[arg(short, long, default_value = "tasks")]
        category: Category,

        /// Date of the entry (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Use a file path or an http(s) URL as the shared agenda
    Connect { target: String },
    /// Show this device's identity
    Device {
        #[command(subcommand)]
        command: Option<DeviceCommands>,
    },
}

#[derive(Subcommand)]
enum DeviceCommands {
    /// Change the name other devices see for this one
    Rename { name: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("AGENDA_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let agenda = Agenda::load()?;

    match cli.command {
        Commands::Sync { watch } => commands::sync::run(&agenda, watch).await,
        Commands::Status => commands::status::run(&agenda).await,
        Commands::New {
            text,
            category,
            date,
        } => commands::new::run(&agenda, text, category, date),
        Commands::Connect { target } => commands::connect::run(&agenda, &target),
        Commands::Device { command } => match command {
            None => commands::device::show(&agenda),
            Some(DeviceCommands::Rename { name }) => commands::device::rename(&agenda, &name),
        },
    }
}
