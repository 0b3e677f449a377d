use agenda_core::Agenda;
use anyhow::Result;
use owo_colors::OwoColorize;

use super::identity;
use crate::render::Render;

pub fn show(agenda: &Agenda) -> Result<()> {
    println!("{}", identity(agenda).device_metadata().render());
    Ok(())
}

pub fn rename(agenda: &Agenda, name: &str) -> Result<()> {
    if !identity(agenda).set_custom_device_name(name) {
        anyhow::bail!("Device name cannot be blank");
    }

    println!("Renamed this device to {}", name.trim().bold());
    Ok(())
}
