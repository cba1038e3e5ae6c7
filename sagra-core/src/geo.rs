//! Coordinates and great-circle distance.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Mean Earth radius used by the Haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Map center used when there is nothing to fit (Milan).
pub const DEFAULT_CENTER: Coordinates = Coordinates {
    lat: 45.4642,
    lng: 9.1900,
};

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Build a pair, rejecting non-finite or out-of-range values.
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        let valid = lat.is_finite()
            && lng.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lng);

        valid.then_some(Coordinates { lat, lng })
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5},{:.5}", self.lat, self.lng)
    }
}

impl FromStr for Coordinates {
    type Err = String;

    /// Parse "LAT,LNG".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lng) = s
            .split_once(',')
            .ok_or_else(|| format!("Invalid position '{}'. Expected LAT,LNG", s))?;

        let lat: f64 = lat
            .trim()
            .parse()
            .map_err(|_| format!("Invalid latitude '{}'", lat.trim()))?;
        let lng: f64 = lng
            .trim()
            .parse()
            .map_err(|_| format!("Invalid longitude '{}'", lng.trim()))?;

        Coordinates::new(lat, lng).ok_or_else(|| format!("Position '{}' is out of range", s))
    }
}

pub fn to_radians(degrees: f64) -> f64 {
    degrees * (std::f64::consts::PI / 180.0)
}

/// Great-circle distance in kilometers between two points.
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    let d_lat = to_radians(b.lat - a.lat);
    let d_lng = to_radians(b.lng - a.lng);

    let h = (d_lat / 2.0).sin().powi(2)
        + to_radians(a.lat).cos() * to_radians(b.lat).cos() * (d_lng / 2.0).sin().powi(2);

    // Rounding can push h marginally above 1 for antipodal points
    let c = 2.0 * h.sqrt().atan2((1.0 - h).max(0.0).sqrt());
    EARTH_RADIUS_KM * c
}

/// Distance function used by the filter pipeline.
pub trait DistanceMetric {
    fn distance_km(&self, a: Coordinates, b: Coordinates) -> f64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Haversine;

impl DistanceMetric for Haversine {
    fn distance_km(&self, a: Coordinates, b: Coordinates) -> f64 {
        haversine_km(a, b)
    }
}

/// Rectangular extent of a set of points, for fitting a map view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub south_west: Coordinates,
    pub north_east: Coordinates,
}

/// Fraction of each side added around the fitted points.
const BOUNDS_PADDING: f64 = 0.1;

impl BoundingBox {
    /// Smallest box containing every point, padded by 10% on each side.
    /// Returns `None` for an empty input.
    pub fn enclosing<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Coordinates>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;

        let (mut south, mut north) = (first.lat, first.lat);
        let (mut west, mut east) = (first.lng, first.lng);
        for p in iter {
            south = south.min(p.lat);
            north = north.max(p.lat);
            west = west.min(p.lng);
            east = east.max(p.lng);
        }

        let pad_lat = (north - south) * BOUNDS_PADDING;
        let pad_lng = (east - west) * BOUNDS_PADDING;

        Some(BoundingBox {
            south_west: Coordinates {
                lat: (south - pad_lat).max(-90.0),
                lng: (west - pad_lng).max(-180.0),
            },
            north_east: Coordinates {
                lat: (north + pad_lat).min(90.0),
                lng: (east + pad_lng).min(180.0),
            },
        })
    }

    pub fn center(&self) -> Coordinates {
        Coordinates {
            lat: (self.south_west.lat + self.north_east.lat) / 2.0,
            lng: (self.south_west.lng + self.north_east.lng) / 2.0,
        }
    }
}
