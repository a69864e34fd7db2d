// src/resort.rs

use crate::client::StationsClient;
use crate::error::StationError;
use crate::geopoint::GeoPoint;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Administrative region a resort belongs to.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct Region {
    pub id: Option<String>,
    pub name: Option<String>,
    pub country_code: Option<String>,
}

/// A ski resort ("station") record as served by the resort API.
///
/// The resort API owns storage; this is a transient read model, so every
/// field the backend may omit is optional.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Resort {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    pub region: Option<Region>,
    pub altitude_base_m: Option<i32>,
    pub altitude_top_m: Option<i32>,
    pub ski_area_km: Option<f64>,
    pub lifts_count: Option<i32>,
    pub pistes_count: Option<i32>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub website_url: Option<String>,
    pub cover_image_url: Option<String>,
    pub logo_url: Option<String>,
    pub amenities: Option<String>,
    pub description_md: Option<String>,
    pub season_open_date: Option<NaiveDate>,
    pub season_close_date: Option<NaiveDate>,
}

impl Resort {
    /// The stored coordinates, when they form a valid point.
    pub fn geo_point(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => {
                let point = GeoPoint::new(lat, lon);
                point.is_valid().then_some(point)
            }
            _ => None,
        }
    }

    /// Free-text place name used when the record has to be geocoded.
    pub fn place_query(&self) -> String {
        match self
            .region
            .as_ref()
            .and_then(|r| r.name.as_deref())
            .filter(|n| !n.is_empty())
        {
            Some(region) => format!("{}, {}", self.name, region),
            None => self.name.clone(),
        }
    }
}

impl StationsClient {
    /// Lists resorts, optionally filtered by a free-text query
    /// (`GET /api/resorts/?q=…`).
    pub async fn list_resorts(&self, query: Option<&str>) -> Result<Vec<Resort>, StationError> {
        let endpoint = match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => {
                let encoded: String = url::form_urlencoded::byte_serialize(q.as_bytes()).collect();
                format!("api/resorts/?q={}", encoded)
            }
            None => "api/resorts/".to_string(),
        };
        self.get(&endpoint).await
    }

    /// Fetches one resort by slug (`GET /api/resorts/{slug}`).
    pub async fn get_resort(&self, slug: &str) -> Result<Resort, StationError> {
        if slug.is_empty() {
            return Err(StationError::InvalidInput(
                "slug cannot be empty for get_resort".to_string(),
            ));
        }
        self.get(&format!("api/resorts/{}", slug)).await
    }

    /// Resolves a resort's coordinates: stored coordinates win; a record
    /// without them is geocoded by place name. `Ok(None)` means the location
    /// is genuinely unknown.
    pub async fn resolve_location(
        &self,
        resort: &Resort,
    ) -> Result<Option<GeoPoint>, StationError> {
        if let Some(point) = resort.geo_point() {
            return Ok(Some(point));
        }
        if resort.name.is_empty() {
            return Ok(None);
        }
        log::debug!(
            "resort '{}' has no stored coordinates, geocoding '{}'",
            resort.slug,
            resort.place_query()
        );
        self.geocode(&resort.place_query()).await
    }
}
