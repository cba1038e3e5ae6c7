use anyhow::Result;
use sagra_core::geocode::Geocoder;

use super::{geocoder, load_config, report};
use crate::utils::tui::create_spinner;

pub async fn run(address: &str) -> Result<()> {
    let config = load_config()?;
    let geocoder = geocoder(&config)?;

    let spinner = create_spinner(format!("Looking up {}", address));
    let result = geocoder.geocode(address).await;
    spinner.finish_and_clear();

    let coordinates = result.into_result().map_err(report)?;
    println!("{}", coordinates);

    Ok(())
}
