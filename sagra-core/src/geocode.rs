//! Best-effort geocoding of free-text addresses.
//!
//! The HTTP side lives behind [`GeocodingService`]; [`GeocoderAdapter`] turns
//! whatever it returns (or fails with) into a [`Geocode`] and never errors.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{SagraError, SagraResult, SourceError};
use crate::geo::Coordinates;

/// Outcome of a geocoding attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Geocode {
    Resolved(Coordinates),
    Unresolved(Unresolved),
}

/// Why an address could not be resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum Unresolved {
    NoMatch,
    Failed(SourceError),
    InvalidCandidate { lat: String, lon: String },
}

impl std::fmt::Display for Unresolved {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Unresolved::NoMatch => write!(f, "no match"),
            Unresolved::Failed(e) => write!(f, "{}", e),
            Unresolved::InvalidCandidate { lat, lon } => {
                write!(f, "invalid candidate coordinates ({}, {})", lat, lon)
            }
        }
    }
}

impl Geocode {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match self {
            Geocode::Resolved(c) => Some(*c),
            Geocode::Unresolved(_) => None,
        }
    }

    /// For callers where an unresolved address is a hard failure.
    pub fn into_result(self) -> SagraResult<Coordinates> {
        match self {
            Geocode::Resolved(c) => Ok(c),
            Geocode::Unresolved(reason) => Err(SagraError::LocationUnresolved(reason.to_string())),
        }
    }
}

/// A search request as sent to the geocoding service.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeQuery {
    /// Address plus country qualifier, e.g. "Piazza Duomo, Milano, Italia".
    pub text: String,
    /// ISO 3166-1 alpha-2 restriction, e.g. "it".
    pub country_code: String,
}

/// A ranked search result. Services return coordinates as strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Candidate {
    pub lat: String,
    pub lon: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Raw access to an external geocoding service.
#[async_trait]
pub trait GeocodingService: Send + Sync {
    /// Candidates in ranking order, best first.
    async fn search(&self, query: &GeocodeQuery) -> Result<Vec<Candidate>, SourceError>;
}

/// Resolves addresses to coordinates. Implementations never fail.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Geocode;
}

/// Takes the best candidate from a [`GeocodingService`], one attempt, no retry.
pub struct GeocoderAdapter {
    service: Arc<dyn GeocodingService>,
    country_qualifier: String,
    country_code: String,
}

impl GeocoderAdapter {
    pub fn new(
        service: Arc<dyn GeocodingService>,
        country_qualifier: impl Into<String>,
        country_code: impl Into<String>,
    ) -> Self {
        GeocoderAdapter {
            service,
            country_qualifier: country_qualifier.into(),
            country_code: country_code.into(),
        }
    }

    pub fn query_for(&self, address: &str) -> GeocodeQuery {
        let address = address.trim();
        let text = if self.country_qualifier.is_empty() {
            address.to_string()
        } else {
            format!("{}, {}", address, self.country_qualifier)
        };

        GeocodeQuery {
            text,
            country_code: self.country_code.clone(),
        }
    }
}

/// Pick the first candidate and parse its coordinates.
pub fn best_candidate(candidates: &[Candidate]) -> Geocode {
    let Some(best) = candidates.first() else {
        return Geocode::Unresolved(Unresolved::NoMatch);
    };

    let lat = best.lat.trim().parse::<f64>().ok();
    let lng = best.lon.trim().parse::<f64>().ok();

    match lat.zip(lng).and_then(|(lat, lng)| Coordinates::new(lat, lng)) {
        Some(c) => Geocode::Resolved(c),
        None => Geocode::Unresolved(Unresolved::InvalidCandidate {
            lat: best.lat.clone(),
            lon: best.lon.clone(),
        }),
    }
}

#[async_trait]
impl Geocoder for GeocoderAdapter {
    async fn geocode(&self, address: &str) -> Geocode {
        let query = self.query_for(address);

        let result = match self.service.search(&query).await {
            Ok(candidates) => best_candidate(&candidates),
            Err(e) => Geocode::Unresolved(Unresolved::Failed(e)),
        };

        match &result {
            Geocode::Resolved(c) => {
                tracing::debug!(address = %address, coordinates = %c, "geocoded")
            }
            Geocode::Unresolved(reason) => {
                tracing::warn!(address = %address, reason = %reason, "geocoding failed")
            }
        }

        result
    }
}
