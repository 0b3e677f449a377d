use agenda_core::diff::Change;
use agenda_core::store::LocalStore;
use agenda_core::{Agenda, Category, Item};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use uuid::Uuid;

use super::identity;
use crate::render::Render;

pub fn run(agenda: &Agenda, text: String, category: Category, date: Option<String>) -> Result<()> {
    let mut item = Item::new(Uuid::new_v4().to_string()).with(category.text_field(), text);

    if let Some(date) = date {
        let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .with_context(|| format!("Invalid date '{date}', expected YYYY-MM-DD"))?;
        item = item.with("fecha", date.format("%Y-%m-%d").to_string());
    }

    let store = agenda.store();
    store.edit(&identity(agenda), |snapshot| {
        snapshot.items_mut(category).push(item.clone())
    })?;

    println!("{}", Change::added(category, &item).render());
    Ok(())
}
