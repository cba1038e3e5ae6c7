//! Core library for sagra.
//!
//! Fetches community events from a spreadsheet, validates and caches them,
//! and filters them by category, date window and distance:
//! - `row` parses raw sheet rows into `EventRecord`s
//! - `store` owns the cache and talks to the `TabularSource`
//! - `filter` holds `FilterState` and the filter pipeline
//! - `geo` and `geocode` deal with coordinates and address lookup

pub mod cache;
pub mod config;
pub mod error;
pub mod event;
pub mod filter;
pub mod geo;
pub mod geocode;
pub mod id;
pub mod row;
pub mod source;
pub mod store;
pub mod user;

pub use error::{SagraError, SagraResult, SourceError};
pub use event::{Category, EventRecord, NewEvent};
pub use filter::{DateWindow, FilterState};
pub use geo::Coordinates;
pub use store::EventStore;
