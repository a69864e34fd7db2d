// src/geopoint.rs

use serde::{Deserialize, Serialize};

/// Represents a geographical point.
///
/// A `GeoPoint` carries whatever an upstream service returned, including
/// nonsense: coordinates are only trusted after [`GeoPoint::is_valid`]
/// confirms they are finite and within range. Invalid points mean
/// "location unknown", they are never an error at this level.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        GeoPoint {
            latitude,
            longitude,
        }
    }

    /// True iff both coordinates are finite and inside the WGS84 ranges
    /// (latitude in [-90, 90], longitude in [-180, 180]).
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}
