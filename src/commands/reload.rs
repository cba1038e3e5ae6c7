use anyhow::Result;
use owo_colors::OwoColorize;

use super::{load_config, open_store, report};
use crate::utils::tui::create_spinner;

pub async fn run() -> Result<()> {
    let config = load_config()?;
    let store = open_store(&config)?;

    let spinner = create_spinner("Reloading events");
    let result = store.force_reload().await;
    spinner.finish_and_clear();

    let events = result.map_err(report)?;
    println!("{} {} upcoming events", "Loaded".green(), events.len());

    Ok(())
}
