//! HTTP adapters for the external services sagra talks to.

pub mod nominatim;
pub mod sheets;

pub use nominatim::NominatimClient;
pub use sheets::SheetsClient;
