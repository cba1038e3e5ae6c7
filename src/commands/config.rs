use anyhow::Result;
use owo_colors::OwoColorize;
use sagra_core::config::SagraConfig;

use super::load_config;

pub fn run() -> Result<()> {
    let config_path = SagraConfig::config_path()?;
    let config = load_config()?;

    println!("{}", "Paths".bold());
    println!("  Config:       {}", config_path.display());
    println!("  Events range: {}", config.layout().events_range());
    println!("  Users range:  {}", config.layout().users_range());

    if config.require_spreadsheet().is_err() {
        println!("  {}", "No spreadsheet_id set yet".yellow());
    }

    println!();
    println!("{}", "Effective settings".bold());
    for line in config.to_toml()?.lines() {
        println!("  {}", line);
    }

    Ok(())
}
