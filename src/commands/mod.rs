pub mod add;
pub mod config;
pub mod geocode;
pub mod list;
pub mod reload;
pub mod users;

use std::sync::Arc;

use anyhow::Result;
use sagra_core::{EventStore, SagraError};
use sagra_core::config::SagraConfig;
use sagra_core::geocode::GeocoderAdapter;
use sagra_remote::{NominatimClient, SheetsClient};

/// Log the internal cause, keep only the user-facing message.
pub fn report(e: SagraError) -> anyhow::Error {
    if let Some(cause) = e.cause() {
        tracing::debug!(cause = %cause, "{}", e);
    }
    e.into()
}

pub fn load_config() -> Result<SagraConfig> {
    Ok(SagraConfig::load()?)
}

pub fn geocoder(config: &SagraConfig) -> Result<GeocoderAdapter> {
    let service = NominatimClient::from_config(config)?;
    Ok(GeocoderAdapter::new(
        Arc::new(service),
        config.country_qualifier.clone(),
        config.country_code.clone(),
    ))
}

/// Wire the Sheets source and Nominatim geocoder into a store.
pub fn open_store(config: &SagraConfig) -> Result<EventStore> {
    config.require_spreadsheet()?;

    let source = SheetsClient::from_config(config)?;
    let geocoder = geocoder(config)?;

    Ok(EventStore::with_ttl(
        Arc::new(source),
        Arc::new(geocoder),
        config.layout(),
        config.cache_ttl(),
    ))
}
