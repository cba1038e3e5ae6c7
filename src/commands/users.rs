use anyhow::Result;
use owo_colors::OwoColorize;

use super::{load_config, open_store};
use crate::render::Render;

pub async fn run() -> Result<()> {
    let config = load_config()?;
    let store = open_store(&config)?;

    let users = store.load_users().await;
    if users.is_empty() {
        println!("{}", "No registered users".dimmed());
        return Ok(());
    }

    println!("{} ({})", "Users".bold(), users.len());
    for user in users.iter() {
        println!("{}", user.render());
    }

    Ok(())
}
